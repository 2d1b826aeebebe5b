//! GraphQL response shapes shared by the local library and the canonical
//! catalog, and their conversion into the core model.

use serde::{Deserialize, Deserializer};

use scenekeeper_core::{ExternalId, FileMetrics, Performer, Scene, Studio, Tag};

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireStashId {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub stash_id: String,
}

impl From<WireStashId> for ExternalId {
    fn from(w: WireStashId) -> Self {
        ExternalId::new(w.endpoint, w.stash_id)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireStudio {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

impl From<WireStudio> for Studio {
    fn from(w: WireStudio) -> Self {
        Studio {
            id: w.id,
            name: w.name,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireTag {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireFile {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub width: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub height: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub size: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireScene {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub studio: Option<WireStudio>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stash_ids: Vec<WireStashId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub files: Vec<WireFile>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<WireTag>,
}

impl From<WireScene> for Scene {
    fn from(w: WireScene) -> Self {
        Scene {
            id: w.id,
            title: w.title,
            date: w.date.filter(|d| !d.trim().is_empty()),
            studio: w.studio.map(Studio::from),
            code: w.code.filter(|c| !c.trim().is_empty()),
            external_ids: w.stash_ids.into_iter().map(ExternalId::from).collect(),
            files: w
                .files
                .into_iter()
                .map(|f| {
                    FileMetrics::new(
                        u32::try_from(f.width).unwrap_or(u32::MAX),
                        u32::try_from(f.height).unwrap_or(u32::MAX),
                        f.size,
                    )
                })
                .collect(),
            tags: w
                .tags
                .into_iter()
                .map(|t| Tag {
                    id: t.id,
                    name: t.name,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WirePerformer {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub favorite: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stash_ids: Vec<WireStashId>,
}

impl From<WirePerformer> for Performer {
    fn from(w: WirePerformer) -> Self {
        Performer {
            id: w.id,
            name: w.name,
            favorite: w.favorite,
            external_ids: w.stash_ids.into_iter().map(ExternalId::from).collect(),
        }
    }
}

/// Treat an explicit `null` like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept numbers, numeric strings (64-bit GraphQL scalars) and `null`.
fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(u64),
        Float(f64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Int(n)) => n,
        Some(Raw::Float(f)) if f >= 0.0 => f as u64,
        Some(Raw::Text(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_converts_with_links_files_and_tags() {
        let json = r#"{
            "id": "42",
            "title": "Night Shift",
            "date": "2024-03-01",
            "code": "",
            "studio": {"id": "s1", "name": "Acme"},
            "stash_ids": [{"endpoint": "https://stashdb.org/graphql", "stash_id": "abc"}],
            "files": [{"width": 1920, "height": 1080, "size": "734003200"}],
            "tags": [{"id": "t1", "name": "_Protected"}]
        }"#;
        let scene: Scene = serde_json::from_str::<WireScene>(json).unwrap().into();
        assert_eq!(scene.external_id("stashdb"), Some("abc"));
        assert_eq!(scene.studio_name(), Some("Acme"));
        assert_eq!(scene.code, None);
        assert_eq!(scene.quality().resolution, 1920 * 1080);
        assert_eq!(scene.quality().size, 734_003_200);
        assert!(scene.has_tag_named("_Protected"));
    }

    #[test]
    fn nulls_become_defaults() {
        let json = r#"{"id": "1", "title": null, "date": null, "studio": null,
                       "stash_ids": null, "files": null, "tags": null}"#;
        let scene: Scene = serde_json::from_str::<WireScene>(json).unwrap().into();
        assert_eq!(scene.title, "");
        assert!(scene.studio.is_none());
        assert!(scene.files.is_empty());
    }

    #[test]
    fn performer_converts() {
        let json = r#"{"id": "7", "name": "Jane", "favorite": true,
                       "stash_ids": [{"endpoint": "https://stashdb.org/graphql", "stash_id": "uuid"}]}"#;
        let performer: Performer = serde_json::from_str::<WirePerformer>(json).unwrap().into();
        assert!(performer.favorite);
        assert_eq!(performer.external_id("stashdb"), Some("uuid"));
    }
}
