//! Per-performer scene history for favourite performers.
//!
//! History files only grow: a scene seen once stays recorded even after it
//! disappears from the local library.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use scenekeeper_core::{Performer, PerformerMeta, Scene};

use crate::artifacts::read_artifact;
use crate::error::ReconcileError;
use crate::source::{LocalCatalog, SourceError};

/// Contents of `history.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryDoc {
    pub performer: PerformerMeta,
    #[serde(default)]
    pub scenes: Vec<Scene>,
}

impl HistoryDoc {
    pub fn new(performer: PerformerMeta) -> Self {
        Self {
            performer,
            scenes: Vec::new(),
        }
    }

    /// Load an existing history, or start an empty one for `performer`.
    pub fn load_or_new(path: &Path, performer: PerformerMeta) -> Result<Self, ReconcileError> {
        if !path.exists() {
            return Ok(Self::new(performer));
        }
        read_artifact(path, "favorites")
    }

    /// Append scenes not already recorded, by scene id. Returns the number
    /// added. Scenes without an id are never recorded.
    pub fn merge(&mut self, scenes: Vec<Scene>) -> usize {
        let mut known: HashSet<String> = self.scenes.iter().map(|s| s.id.clone()).collect();
        let before = self.scenes.len();
        for scene in scenes {
            if scene.id.trim().is_empty() {
                log::debug!("Scene '{}' has no id; not recorded", scene.title);
                continue;
            }
            if known.insert(scene.id.clone()) {
                self.scenes.push(scene);
            }
        }
        self.scenes.len() - before
    }
}

/// Favourite local performers split by whether they are linked to `system`.
#[derive(Debug, Clone, Default)]
pub struct FavoritePerformers {
    /// Each favourite with its canonical id.
    pub linked: Vec<(Performer, String)>,
    /// Favourites without a canonical id.
    pub unlinked: Vec<Performer>,
}

/// Page through every local performer and keep the favourites.
pub fn favorite_performers<C>(catalog: &C, system: &str) -> Result<FavoritePerformers, SourceError>
where
    C: LocalCatalog + ?Sized,
{
    let mut out = FavoritePerformers::default();
    let mut seen = 0;
    let mut page = 1;

    loop {
        let listing = catalog.performers(page)?;
        let returned = listing.items.len();
        seen += returned;

        for performer in listing.items.into_iter().filter(|p| p.favorite) {
            match performer.external_id(system).map(str::to_string) {
                Some(id) => out.linked.push((performer, id)),
                None => out.unlinked.push(performer),
            }
        }
        log::debug!("Performer page {}: {} returned", page, returned);

        if returned == 0 || seen >= listing.total {
            break;
        }
        page += 1;
    }

    Ok(out)
}
