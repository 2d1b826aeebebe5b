//! Collaborator traits for the three external systems.
//!
//! Implementations live in `scenekeeper-client` (HTTP) and in the test suites
//! (in-memory fakes). Every call is blocking and performed strictly in
//! sequence by the callers in this crate.

use scenekeeper_core::{LeafUnit, Performer, PerformerMeta, Scene, SeriesUnit, Studio};
use thiserror::Error;

/// Failure reported by a collaborator.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Not authorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Request rejected (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Unexpected response shape: {0}")]
    Schema(String),
}

impl SourceError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    /// Whether the failure concerns a single request target rather than the
    /// connection as a whole. The acquisition loop records these against the
    /// record and moves on; everything else aborts the run.
    pub fn is_record_scoped(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Rejected { .. })
    }
}

/// One page of a paged listing plus the listing's declared total.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: usize) -> Self {
        Self { items, total }
    }
}

/// Drain a paged listing, starting at page 1.
///
/// Stops once the cumulative item count reaches the declared total, or on
/// the first empty page (a catalog whose total overstates its content would
/// otherwise never terminate).
pub fn collect_pages<T, F>(mut fetch: F) -> Result<Vec<T>, SourceError>
where
    F: FnMut(u32) -> Result<Page<T>, SourceError>,
{
    let mut out = Vec::new();
    let mut page = 1;
    loop {
        let Page { items, total } = fetch(page)?;
        let returned = items.len();
        out.extend(items);
        if returned == 0 || out.len() >= total {
            break;
        }
        page += 1;
    }
    Ok(out)
}

/// The user's local library.
pub trait LocalCatalog {
    fn performers(&self, page: u32) -> Result<Page<Performer>, SourceError>;

    fn performer_scenes(&self, performer_id: &str, page: u32) -> Result<Page<Scene>, SourceError>;

    fn all_scenes(&self, page: u32) -> Result<Page<Scene>, SourceError>;

    fn studios(&self, page: u32) -> Result<Page<Studio>, SourceError>;

    /// Every scene featuring `performer_id`, across all pages.
    fn all_performer_scenes(&self, performer_id: &str) -> Result<Vec<Scene>, SourceError> {
        collect_pages(|page| self.performer_scenes(performer_id, page))
    }
}

/// Tag mutation surface of the local library, used only by the duplicate applier.
pub trait TagWriter {
    /// Id of the tag called `name`, creating it if it does not exist.
    fn find_or_create_tag(&self, name: &str) -> Result<String, SourceError>;

    /// Replace the tag set of `scene_id` with `tag_ids`.
    fn set_scene_tags(&self, scene_id: &str, tag_ids: &[String]) -> Result<(), SourceError>;
}

/// The canonical metadata catalog.
pub trait CanonicalCatalog {
    /// The performer's identity and all of their scenes.
    ///
    /// An unknown performer is reported as [`SourceError::NotFound`].
    fn performer_with_scenes(
        &self,
        external_id: &str,
    ) -> Result<(PerformerMeta, Vec<Scene>), SourceError>;
}

/// Request to create a series in the acquisition system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddSeries {
    pub title: String,
    pub root_folder_path: String,
    pub path: String,
    pub quality_profile_id: i64,
    pub language_profile_id: Option<i64>,
}

/// The download-acquisition system.
pub trait AcquisitionSystem {
    fn series_list(&self) -> Result<Vec<SeriesUnit>, SourceError>;

    fn episodes(&self, series_id: i64) -> Result<Vec<LeafUnit>, SourceError>;

    /// Queue a search for one leaf unit, returning the command id when the
    /// system reports one.
    fn queue_episode_search(&self, episode_id: i64) -> Result<Option<i64>, SourceError>;

    /// Create an unmonitored series, returning its id when reported.
    fn add_series(&self, request: &AddSeries) -> Result<Option<i64>, SourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_pages_stops_at_declared_total() {
        let data: Vec<u32> = (0..250).collect();
        let mut calls = Vec::new();
        let all = collect_pages(|page| {
            calls.push(page);
            let start = (page as usize - 1) * 100;
            let end = (start + 100).min(data.len());
            Ok(Page::new(data[start..end].to_vec(), data.len()))
        })
        .unwrap();
        assert_eq!(all.len(), 250);
        assert_eq!(calls, vec![1, 2, 3]);
    }

    #[test]
    fn collect_pages_stops_on_empty_page() {
        let all: Vec<u32> = collect_pages(|page| {
            if page == 1 {
                Ok(Page::new(vec![1, 2], 10))
            } else {
                Ok(Page::new(vec![], 10))
            }
        })
        .unwrap();
        assert_eq!(all, vec![1, 2]);
    }

    #[test]
    fn collect_pages_propagates_errors() {
        let result: Result<Vec<u32>, _> =
            collect_pages(|_| Err(SourceError::transport("connection refused")));
        assert!(matches!(result, Err(SourceError::Transport(_))));
    }

    #[test]
    fn record_scoped_classification() {
        assert!(SourceError::not_found("episode 4").is_record_scoped());
        assert!(
            SourceError::Rejected {
                status: 400,
                message: "bad id".into()
            }
            .is_record_scoped()
        );
        assert!(!SourceError::transport("timeout").is_record_scoped());
        assert!(!SourceError::Unauthorized("401".into()).is_record_scoped());
        assert!(!SourceError::schema("no data").is_record_scoped());
    }
}
