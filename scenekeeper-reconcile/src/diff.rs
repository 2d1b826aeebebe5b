//! Missing-scene computation between the local library and the canonical
//! catalog.
//!
//! A canonical scene is present locally when it is linked by external id, or
//! when a local scene has the same normalized title and the same raw date.
//! Either key alone suppresses it from the missing set.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use scenekeeper_core::{Scene, normalize_text};

/// A canonical scene with no local counterpart.
///
/// Carries only canonical identifiers; local ids never leak into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingScene {
    pub external_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub studio: Option<String>,
    #[serde(default)]
    pub studio_id: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

impl MissingScene {
    /// The date, if present and non-blank.
    pub fn date_str(&self) -> Option<&str> {
        self.date.as_deref().map(str::trim).filter(|d| !d.is_empty())
    }

    /// The studio name trimmed, empty when absent.
    pub fn studio_name(&self) -> &str {
        self.studio.as_deref().map(str::trim).unwrap_or_default()
    }
}

impl From<&Scene> for MissingScene {
    fn from(scene: &Scene) -> Self {
        Self {
            external_id: scene.id.clone(),
            title: scene.title.clone(),
            date: scene.date_str().map(str::to_string),
            studio: scene.studio.as_ref().map(|s| s.name.clone()),
            studio_id: scene.studio.as_ref().map(|s| s.id.clone()),
            code: scene.code.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffStats {
    pub local_scene_count: usize,
    pub canonical_scene_count: usize,
    /// Distinct canonical scene ids linked from local scenes.
    pub local_linked_ids: usize,
    pub missing_count: usize,
}

/// Result of [`compute_missing`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogDiff {
    pub missing: Vec<MissingScene>,
    pub stats: DiffStats,
}

fn title_date_key(scene: &Scene) -> (String, String) {
    (
        normalize_text(&scene.title),
        scene.date_str().unwrap_or_default().to_string(),
    )
}

/// Canonical scenes absent from `local`, in canonical input order.
///
/// `system` names the canonical catalog as it appears in the local scenes'
/// external ids.
pub fn compute_missing(local: &[Scene], canonical: &[Scene], system: &str) -> CatalogDiff {
    let linked: HashSet<&str> = local
        .iter()
        .flat_map(|scene| scene.external_ids.iter())
        .filter(|eid| eid.matches_system(system) && !eid.id.trim().is_empty())
        .map(|eid| eid.id.trim())
        .collect();

    let title_dates: HashSet<(String, String)> = local.iter().map(title_date_key).collect();

    let missing: Vec<MissingScene> = canonical
        .iter()
        .filter(|scene| {
            let id = scene.id.trim();
            if !id.is_empty() && linked.contains(id) {
                return false;
            }
            !title_dates.contains(&title_date_key(scene))
        })
        .map(MissingScene::from)
        .collect();

    log::debug!(
        "{} of {} canonical scenes missing ({} linked locally)",
        missing.len(),
        canonical.len(),
        linked.len(),
    );

    let stats = DiffStats {
        local_scene_count: local.len(),
        canonical_scene_count: canonical.len(),
        local_linked_ids: linked.len(),
        missing_count: missing.len(),
    };
    CatalogDiff { missing, stats }
}
