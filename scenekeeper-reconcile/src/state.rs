//! The incremental attempt ledger and cutoff filtering.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use scenekeeper_core::parse_date;

use crate::acquisition::AcquisitionStatus;
use crate::artifacts::write_artifact;
use crate::diff::MissingScene;
use crate::error::ReconcileError;

/// Default look-back window, in days.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 30;

/// Attempt history for one missing scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneAttempt {
    pub last_tried_at_utc: DateTime<Utc>,
    pub last_status: AcquisitionStatus,
    pub attempts: u32,
}

/// Persisted ledger: run counters plus per-scene attempt history.
///
/// Entries are only ever added or updated in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchState {
    #[serde(default)]
    pub last_run_at_utc: Option<DateTime<Utc>>,
    #[serde(default)]
    pub runs: u64,
    #[serde(default)]
    pub scene_history: BTreeMap<String, SceneAttempt>,
}

impl MatchState {
    /// Record one terminal status for `scene_id`.
    pub fn record_attempt(&mut self, scene_id: &str, status: AcquisitionStatus, at: DateTime<Utc>) {
        self.scene_history
            .entry(scene_id.to_string())
            .and_modify(|entry| {
                entry.last_tried_at_utc = at;
                entry.last_status = status;
                entry.attempts += 1;
            })
            .or_insert(SceneAttempt {
                last_tried_at_utc: at,
                last_status: status,
                attempts: 1,
            });
    }

    /// Close a run: stamp the run time and bump the counter.
    pub fn finish_run(&mut self, at: DateTime<Utc>) {
        self.last_run_at_utc = Some(at);
        self.runs += 1;
    }

    /// The cutoff for this run, or `None` when every scene is eligible
    /// (full reprocess, or no previous run).
    ///
    /// A look-back reaching past the representable date range also yields
    /// `None`: nothing can be older than it.
    pub fn cutoff(&self, lookback_days: i64, full: bool) -> Option<DateTime<Utc>> {
        if full {
            return None;
        }
        let last = self.last_run_at_utc?;
        let cutoff =
            Duration::try_days(lookback_days).and_then(|span| last.checked_sub_signed(span));
        if cutoff.is_none() {
            log::warn!(
                "Look-back of {} days is out of range; no cutoff applied",
                lookback_days
            );
        }
        cutoff
    }

    /// Whether `scene_id` was last tried before `cutoff`.
    pub fn tried_before(&self, scene_id: &str, cutoff: DateTime<Utc>) -> bool {
        self.scene_history
            .get(scene_id)
            .is_some_and(|entry| entry.last_tried_at_utc < cutoff)
    }

    pub fn attempt(&self, scene_id: &str) -> Option<&SceneAttempt> {
        self.scene_history.get(scene_id)
    }
}

/// Missing scenes that survived the cutoff, plus skip counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CutoffResult {
    pub selected: Vec<MissingScene>,
    /// Scenes dated before the cutoff.
    pub skipped_old: usize,
    /// Of those, scenes whose last attempt is also before the cutoff.
    pub skipped_previously_tried: usize,
}

fn day_start(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc())
}

/// Drop scenes dated strictly before `cutoff`.
///
/// A scene's date is taken as midnight UTC. Scenes without a parseable date
/// are always kept. With no cutoff everything is kept.
pub fn apply_cutoff(
    missing: Vec<MissingScene>,
    state: &MatchState,
    cutoff: Option<DateTime<Utc>>,
) -> CutoffResult {
    let Some(cutoff) = cutoff else {
        return CutoffResult {
            selected: missing,
            ..Default::default()
        };
    };

    let mut result = CutoffResult::default();
    for scene in missing {
        let scene_start = scene.date_str().and_then(parse_date).and_then(day_start);
        match scene_start {
            Some(start) if start < cutoff => {
                result.skipped_old += 1;
                if state.tried_before(&scene.external_id, cutoff) {
                    result.skipped_previously_tried += 1;
                }
            }
            _ => result.selected.push(scene),
        }
    }
    result
}

// ── Persistence ─────────────────────────────────────────────────────────────

/// Load/save seam for the ledger.
pub trait StateStore {
    fn load(&self) -> Result<MatchState, ReconcileError>;
    fn save(&self, state: &MatchState) -> Result<(), ReconcileError>;
}

/// Ledger stored as pretty JSON at a fixed path.
#[derive(Debug, Clone)]
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for JsonStateStore {
    /// A missing file is an empty ledger. A malformed file is an error.
    fn load(&self) -> Result<MatchState, ReconcileError> {
        if !self.path.exists() {
            log::debug!("No ledger at {}; starting fresh", self.path.display());
            return Ok(MatchState::default());
        }
        let text = std::fs::read_to_string(&self.path)?;
        serde_json::from_str(&text).map_err(|e| ReconcileError::artifact(&self.path, e.to_string()))
    }

    fn save(&self, state: &MatchState) -> Result<(), ReconcileError> {
        write_artifact(&self.path, state)
    }
}
