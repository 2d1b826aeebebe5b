//! JSON run artifacts and their on-disk layout.
//!
//! Every pipeline step reads its inputs whole at the start and writes its
//! output whole at the end. Artifacts for one performer share a directory
//! under the output root.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use scenekeeper_core::{PerformerMeta, Scene};

use crate::acquisition::AcquisitionOutcome;
use crate::diff::{DiffStats, MissingScene};
use crate::error::ReconcileError;

/// Paths of every artifact under an output root.
#[derive(Debug, Clone)]
pub struct RunLayout {
    root: PathBuf,
}

impl RunLayout {
    pub const LOCAL_SCENES: &'static str = "01_local_scenes.json";
    pub const CANONICAL_PERFORMER: &'static str = "02_canonical_performer.json";
    pub const MISSING: &'static str = "03_missing.json";
    pub const ACQUISITION_ACTIONS: &'static str = "04_acquisition_actions.json";
    pub const ACQUISITION_STATE: &'static str = "04_acquisition_state.json";
    pub const READABLE_LOG: &'static str = "readable.log";
    pub const DUPLICATES_REPORT: &'static str = "duplicate_scenes_report.json";
    pub const HISTORY: &'static str = "history.json";
    pub const STUDIO_SYNC_RESULT: &'static str = "sync_studios_result.json";

    /// Directory name used for whole-catalog duplicate scans.
    pub const ALL_SCENES_DIR: &'static str = "_all";
    pub const STUDIO_SYNC_DIR: &'static str = "sync_studios";

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn performer_dir(&self, performer_id: &str) -> PathBuf {
        self.root.join(performer_id.trim())
    }

    pub fn local_scenes(&self, performer_id: &str) -> PathBuf {
        self.performer_dir(performer_id).join(Self::LOCAL_SCENES)
    }

    pub fn canonical_performer(&self, performer_id: &str) -> PathBuf {
        self.performer_dir(performer_id).join(Self::CANONICAL_PERFORMER)
    }

    pub fn missing(&self, performer_id: &str) -> PathBuf {
        self.performer_dir(performer_id).join(Self::MISSING)
    }

    pub fn acquisition_actions(&self, performer_id: &str) -> PathBuf {
        self.performer_dir(performer_id).join(Self::ACQUISITION_ACTIONS)
    }

    pub fn acquisition_state(&self, performer_id: &str) -> PathBuf {
        self.performer_dir(performer_id).join(Self::ACQUISITION_STATE)
    }

    pub fn readable_log(&self, performer_id: &str) -> PathBuf {
        self.performer_dir(performer_id).join(Self::READABLE_LOG)
    }

    pub fn history(&self, performer_id: &str) -> PathBuf {
        self.performer_dir(performer_id).join(Self::HISTORY)
    }

    /// Duplicate report for one performer, or for the whole catalog when
    /// `performer_id` is `None`.
    pub fn duplicates_report(&self, performer_id: Option<&str>) -> PathBuf {
        let dir = match performer_id {
            Some(id) => self.performer_dir(id),
            None => self.root.join(Self::ALL_SCENES_DIR),
        };
        dir.join(Self::DUPLICATES_REPORT)
    }

    pub fn studio_sync_result(&self) -> PathBuf {
        self.root
            .join(Self::STUDIO_SYNC_DIR)
            .join(Self::STUDIO_SYNC_RESULT)
    }
}

/// Read a whole artifact. `producer` names the command that writes it.
pub fn read_artifact<T: DeserializeOwned>(path: &Path, producer: &str) -> Result<T, ReconcileError> {
    if !path.exists() {
        return Err(ReconcileError::missing_artifact(path, producer));
    }
    let text = std::fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|e| ReconcileError::artifact(path, e.to_string()))
}

/// Write a whole artifact as pretty JSON, creating parent directories.
pub fn write_artifact<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ReconcileError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    log::debug!("Wrote {}", path.display());
    Ok(())
}

// ── Documents ───────────────────────────────────────────────────────────────

/// Step 1 output: the performer's local scenes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalScenesDoc {
    pub input_performer_id: String,
    pub local_performer_id: String,
    #[serde(default)]
    pub local_performer_name: Option<String>,
    #[serde(default)]
    pub scenes: Vec<Scene>,
}

/// Step 2 output: the performer's canonical scenes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalPerformerDoc {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub scene_count: usize,
    pub scenes: Vec<Scene>,
}

#[derive(Deserialize)]
struct WrappedPerformer {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CanonicalShape {
    Wrapped {
        performer: WrappedPerformer,
        scenes: Vec<Scene>,
    },
    Direct {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        name: Option<String>,
        scenes: Vec<Scene>,
    },
}

impl CanonicalPerformerDoc {
    pub fn new(meta: PerformerMeta, scenes: Vec<Scene>) -> Self {
        Self {
            id: meta.id,
            name: meta.name,
            scene_count: scenes.len(),
            scenes,
        }
    }

    pub fn meta(&self) -> PerformerMeta {
        PerformerMeta {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }

    /// Read the step 2 artifact, accepting both the direct shape and a
    /// `{ performer: { id, name }, scenes }` wrapper. A missing id falls
    /// back to `fallback_id`.
    pub fn load(path: &Path, fallback_id: &str) -> Result<Self, ReconcileError> {
        let shape: CanonicalShape = read_artifact(path, "canonical")?;
        let (id, name, scenes) = match shape {
            CanonicalShape::Wrapped { performer, scenes } => (performer.id, performer.name, scenes),
            CanonicalShape::Direct { id, name, scenes } => (id, name, scenes),
        };
        let id = id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| fallback_id.to_string());
        Ok(Self::new(PerformerMeta { id, name }, scenes))
    }
}

/// Step 3 output: canonical scenes missing locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingDoc {
    pub performer: PerformerMeta,
    pub missing_scenes: Vec<MissingScene>,
    pub stats: DiffStats,
}

/// Step 4 output: one outcome per processed scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcquisitionActionsDoc {
    pub processed: usize,
    pub cutoff_utc: Option<DateTime<Utc>>,
    pub skipped_old: usize,
    pub skipped_previously_tried: usize,
    pub results: Vec<AcquisitionOutcome>,
}
