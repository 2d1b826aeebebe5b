//! Data model types for the three catalogs.
//!
//! Scenes and performers are read-only snapshots fetched from their owning
//! catalog once per run. Series and leaf units come from the acquisition
//! system. All types serialize with camelCase keys so they can be written
//! into run artifacts unchanged.

use serde::{Deserialize, Serialize};

// ── External identifiers ────────────────────────────────────────────────────

/// A link from a local record to a record in another system.
///
/// `endpoint` names the remote system (usually its GraphQL URL) and `id` is
/// the identifier inside that system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalId {
    pub endpoint: String,
    pub id: String,
}

impl ExternalId {
    pub fn new(endpoint: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            id: id.into(),
        }
    }

    /// Whether this link belongs to `system`.
    ///
    /// The system tag is matched case-insensitively against the endpoint, so
    /// `"stashdb"` matches `https://stashdb.org/graphql`.
    pub fn matches_system(&self, system: &str) -> bool {
        let system = system.trim().to_lowercase();
        !system.is_empty() && self.endpoint.to_lowercase().contains(&system)
    }
}

/// First external identifier for `system` in `ids`, in list order.
fn first_external_id<'a>(ids: &'a [ExternalId], system: &str) -> Option<&'a str> {
    ids.iter()
        .find(|eid| eid.matches_system(system) && !eid.id.is_empty())
        .map(|eid| eid.id.as_str())
}

// ── Studio / Tag ────────────────────────────────────────────────────────────

/// The group a scene was released under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Studio {
    pub id: String,
    pub name: String,
}

/// A label attached to a local scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: String,
    pub name: String,
}

// ── Scene ───────────────────────────────────────────────────────────────────

/// Dimensions and size of one media file attached to a scene.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetrics {
    pub width: u32,
    pub height: u32,
    pub size: u64,
}

impl FileMetrics {
    pub fn new(width: u32, height: u32, size: u64) -> Self {
        Self {
            width,
            height,
            size,
        }
    }

    pub fn resolution(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Best file quality of a scene: largest pixel count, then largest byte size.
///
/// The two maxima are taken independently, so they may come from different
/// files. Ordering compares resolution first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quality {
    pub resolution: u64,
    pub size: u64,
}

/// A catalog entry representing one piece of content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// ISO-8601 calendar date as delivered by the catalog; parsed on demand.
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub studio: Option<Studio>,
    /// Provider-specific production code.
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub external_ids: Vec<ExternalId>,
    #[serde(default)]
    pub files: Vec<FileMetrics>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Scene {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn with_studio(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.studio = Some(Studio {
            id: id.into(),
            name: name.into(),
        });
        self
    }

    pub fn with_external_id(mut self, endpoint: impl Into<String>, id: impl Into<String>) -> Self {
        self.external_ids.push(ExternalId::new(endpoint, id));
        self
    }

    pub fn with_file(mut self, width: u32, height: u32, size: u64) -> Self {
        self.files.push(FileMetrics::new(width, height, size));
        self
    }

    pub fn with_tag(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.tags.push(Tag {
            id: id.into(),
            name: name.into(),
        });
        self
    }

    pub fn studio_name(&self) -> Option<&str> {
        self.studio.as_ref().map(|s| s.name.as_str())
    }

    /// The scene's date, treating an empty string as absent.
    pub fn date_str(&self) -> Option<&str> {
        self.date.as_deref().filter(|d| !d.trim().is_empty())
    }

    /// External identifier for `system`; first match in list order wins.
    pub fn external_id(&self, system: &str) -> Option<&str> {
        first_external_id(&self.external_ids, system)
    }

    /// Best resolution and size across attached files. `(0, 0)` when there are none.
    pub fn quality(&self) -> Quality {
        self.files.iter().fold(Quality::default(), |best, f| Quality {
            resolution: best.resolution.max(f.resolution()),
            size: best.size.max(f.size),
        })
    }

    pub fn has_tag(&self, tag_id: &str) -> bool {
        self.tags.iter().any(|t| t.id == tag_id)
    }

    pub fn has_tag_named(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t.name.trim() == name)
    }
}

// ── Performer ───────────────────────────────────────────────────────────────

/// A person appearing in scenes, as stored in the local catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Performer {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub external_ids: Vec<ExternalId>,
}

impl Performer {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_external_id(mut self, endpoint: impl Into<String>, id: impl Into<String>) -> Self {
        self.external_ids.push(ExternalId::new(endpoint, id));
        self
    }

    pub fn favorite(mut self, favorite: bool) -> Self {
        self.favorite = favorite;
        self
    }

    /// External identifier for `system`; first match in list order wins.
    pub fn external_id(&self, system: &str) -> Option<&str> {
        first_external_id(&self.external_ids, system)
    }
}

/// Identity of a performer in the canonical catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformerMeta {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

// ── Acquisition units ───────────────────────────────────────────────────────

/// Container unit in the acquisition system (one per studio).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesUnit {
    pub id: i64,
    #[serde(default)]
    pub title: String,
}

/// Leaf unit in the acquisition system (one per scene/episode).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeafUnit {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub release_date: Option<String>,
}
