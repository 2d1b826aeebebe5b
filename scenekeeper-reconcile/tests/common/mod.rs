#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;

use scenekeeper_core::{LeafUnit, Performer, PerformerMeta, Scene, SeriesUnit, Studio};
use scenekeeper_reconcile::*;

/// In-memory local library with fixed page size.
pub struct FakeLibrary {
    pub page_size: usize,
    pub performers: Vec<Performer>,
    pub scenes_by_performer: HashMap<String, Vec<Scene>>,
    pub scenes: Vec<Scene>,
    pub studios: Vec<Studio>,
    pub performer_pages_fetched: RefCell<u32>,
}

impl FakeLibrary {
    pub fn new() -> Self {
        Self {
            page_size: 2,
            performers: Vec::new(),
            scenes_by_performer: HashMap::new(),
            scenes: Vec::new(),
            studios: Vec::new(),
            performer_pages_fetched: RefCell::new(0),
        }
    }

    fn page<T: Clone>(&self, items: &[T], page: u32) -> Page<T> {
        let start = (page as usize - 1) * self.page_size;
        let end = (start + self.page_size).min(items.len());
        let slice = if start < items.len() { items[start..end].to_vec() } else { Vec::new() };
        Page::new(slice, items.len())
    }
}

impl LocalCatalog for FakeLibrary {
    fn performers(&self, page: u32) -> Result<Page<Performer>, SourceError> {
        *self.performer_pages_fetched.borrow_mut() += 1;
        Ok(self.page(&self.performers, page))
    }

    fn performer_scenes(&self, performer_id: &str, page: u32) -> Result<Page<Scene>, SourceError> {
        let scenes = self
            .scenes_by_performer
            .get(performer_id)
            .cloned()
            .unwrap_or_default();
        Ok(self.page(&scenes, page))
    }

    fn all_scenes(&self, page: u32) -> Result<Page<Scene>, SourceError> {
        Ok(self.page(&self.scenes, page))
    }

    fn studios(&self, page: u32) -> Result<Page<Studio>, SourceError> {
        Ok(self.page(&self.studios, page))
    }
}

/// Canonical catalog holding a single performer.
pub struct FakeCanonical {
    pub meta: PerformerMeta,
    pub scenes: Vec<Scene>,
}

impl CanonicalCatalog for FakeCanonical {
    fn performer_with_scenes(
        &self,
        external_id: &str,
    ) -> Result<(PerformerMeta, Vec<Scene>), SourceError> {
        if external_id == self.meta.id {
            Ok((self.meta.clone(), self.scenes.clone()))
        } else {
            Err(SourceError::not_found(format!("performer {external_id}")))
        }
    }
}

/// Acquisition system recording every call.
#[derive(Default)]
pub struct FakeAcquisition {
    pub series: Vec<SeriesUnit>,
    pub episodes: HashMap<i64, Vec<LeafUnit>>,
    /// Episode ids whose search is rejected.
    pub rejected: Vec<i64>,
    /// Series ids whose episode listing answers not-found.
    pub vanished_series: Vec<i64>,
    /// Fail every call with a transport error.
    pub offline: bool,
    pub series_calls: RefCell<u32>,
    pub episode_calls: RefCell<Vec<i64>>,
    pub searches: RefCell<Vec<i64>>,
    pub added: RefCell<Vec<AddSeries>>,
}

impl FakeAcquisition {
    fn check_online(&self) -> Result<(), SourceError> {
        if self.offline {
            Err(SourceError::transport("connection refused"))
        } else {
            Ok(())
        }
    }
}

impl AcquisitionSystem for FakeAcquisition {
    fn series_list(&self) -> Result<Vec<SeriesUnit>, SourceError> {
        self.check_online()?;
        *self.series_calls.borrow_mut() += 1;
        Ok(self.series.clone())
    }

    fn episodes(&self, series_id: i64) -> Result<Vec<LeafUnit>, SourceError> {
        self.check_online()?;
        self.episode_calls.borrow_mut().push(series_id);
        if self.vanished_series.contains(&series_id) {
            return Err(SourceError::not_found(format!("series {series_id}")));
        }
        Ok(self.episodes.get(&series_id).cloned().unwrap_or_default())
    }

    fn queue_episode_search(&self, episode_id: i64) -> Result<Option<i64>, SourceError> {
        self.check_online()?;
        if self.rejected.contains(&episode_id) {
            return Err(SourceError::Rejected {
                status: 400,
                message: format!("episode {episode_id} is invalid"),
            });
        }
        self.searches.borrow_mut().push(episode_id);
        Ok(Some(1000 + episode_id))
    }

    fn add_series(&self, request: &AddSeries) -> Result<Option<i64>, SourceError> {
        self.check_online()?;
        self.added.borrow_mut().push(request.clone());
        Ok(Some(500 + self.added.borrow().len() as i64))
    }
}

pub fn series(id: i64, title: &str) -> SeriesUnit {
    SeriesUnit {
        id,
        title: title.to_string(),
    }
}

pub fn episode(id: i64, title: &str, date: Option<&str>) -> LeafUnit {
    LeafUnit {
        id,
        title: title.to_string(),
        release_date: date.map(str::to_string),
    }
}

pub fn missing(id: &str, title: &str, date: Option<&str>, studio: Option<&str>) -> MissingScene {
    MissingScene {
        external_id: id.to_string(),
        title: title.to_string(),
        date: date.map(str::to_string),
        studio: studio.map(str::to_string),
        studio_id: None,
        code: None,
    }
}
