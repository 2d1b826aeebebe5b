//! The local library, spoken to over its GraphQL API.

use serde::Deserialize;
use serde_json::json;

use scenekeeper_core::{Performer, Scene, Studio};
use scenekeeper_reconcile::{LocalCatalog, Page, SourceError, TagWriter};

use crate::config::{Endpoint, HttpSettings};
use crate::error::ClientError;
use crate::graphql::GraphQlClient;
use crate::http::build_client;
use crate::wire::{WirePerformer, WireScene, WireStudio, WireTag, null_as_default};

/// Page size for every listing query.
pub const PER_PAGE: u32 = 100;

const SCENE_FIELDS: &str = "
    id
    title
    date
    code
    studio { id name }
    stash_ids { endpoint stash_id }
    files { width height size }
    tags { id name }
";

const FIND_PERFORMERS: &str = "
query FindPerformers($page: Int!, $perPage: Int!) {
  findPerformers(filter: { page: $page, per_page: $perPage }) {
    count
    performers { id name favorite stash_ids { endpoint stash_id } }
  }
}";

const FIND_STUDIOS: &str = "
query FindStudios($page: Int!, $perPage: Int!) {
  findStudios(filter: { page: $page, per_page: $perPage }) {
    count
    studios { id name }
  }
}";

const FIND_TAGS: &str = "
query FindTags($filter: FindFilterType!) {
  findTags(filter: $filter) {
    tags { id name }
  }
}";

const TAG_CREATE: &str = "
mutation TagCreate($input: TagCreateInput!) {
  tagCreate(input: $input) { id name }
}";

const SCENE_UPDATE: &str = "
mutation SceneUpdate($input: SceneUpdateInput!) {
  sceneUpdate(input: $input) { id }
}";

fn find_scenes_query(by_performer: bool) -> String {
    if by_performer {
        format!(
            "query FindScenes($pid: ID!, $page: Int!, $perPage: Int!) {{
  findScenes(
    scene_filter: {{ performers: {{ value: [$pid], modifier: INCLUDES }} }}
    filter: {{ page: $page, per_page: $perPage }}
  ) {{ count scenes {{ {} }} }}
}}",
            SCENE_FIELDS
        )
    } else {
        format!(
            "query FindScenes($page: Int!, $perPage: Int!) {{
  findScenes(filter: {{ page: $page, per_page: $perPage }}) {{ count scenes {{ {} }} }}
}}",
            SCENE_FIELDS
        )
    }
}

// ── Response shapes ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PerformersData {
    find_performers: PerformerBlock,
}

#[derive(Deserialize)]
struct PerformerBlock {
    #[serde(default)]
    count: usize,
    #[serde(default, deserialize_with = "null_as_default")]
    performers: Vec<WirePerformer>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScenesData {
    find_scenes: SceneBlock,
}

#[derive(Deserialize)]
struct SceneBlock {
    #[serde(default)]
    count: usize,
    #[serde(default, deserialize_with = "null_as_default")]
    scenes: Vec<WireScene>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StudiosData {
    find_studios: StudioBlock,
}

#[derive(Deserialize)]
struct StudioBlock {
    #[serde(default)]
    count: usize,
    #[serde(default, deserialize_with = "null_as_default")]
    studios: Vec<WireStudio>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TagsData {
    find_tags: TagBlock,
}

#[derive(Deserialize)]
struct TagBlock {
    #[serde(default, deserialize_with = "null_as_default")]
    tags: Vec<WireTag>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TagCreateData {
    tag_create: IdOnly,
}

#[derive(Deserialize)]
struct IdOnly {
    id: String,
}

// ── Client ──────────────────────────────────────────────────────────────────

/// GraphQL client for the local library. Requests are not paced.
pub struct StashClient {
    gql: GraphQlClient,
}

impl StashClient {
    pub fn new(endpoint: &Endpoint, http: &HttpSettings) -> Result<Self, ClientError> {
        let client = build_client(http.timeout)?;
        Ok(Self {
            gql: GraphQlClient::new(client, "stash", endpoint, None),
        })
    }

    pub fn url(&self) -> &str {
        self.gql.url()
    }

    fn scene_page(&self, performer_id: Option<&str>, page: u32) -> Result<Page<Scene>, SourceError> {
        let query = find_scenes_query(performer_id.is_some());
        let variables = match performer_id {
            Some(pid) => json!({ "pid": pid, "page": page, "perPage": PER_PAGE }),
            None => json!({ "page": page, "perPage": PER_PAGE }),
        };
        let data: ScenesData = self.gql.query(&query, variables)?;
        let block = data.find_scenes;
        Ok(Page::new(
            block.scenes.into_iter().map(Scene::from).collect(),
            block.count,
        ))
    }
}

impl LocalCatalog for StashClient {
    fn performers(&self, page: u32) -> Result<Page<Performer>, SourceError> {
        let data: PerformersData = self
            .gql
            .query(FIND_PERFORMERS, json!({ "page": page, "perPage": PER_PAGE }))?;
        let block = data.find_performers;
        Ok(Page::new(
            block.performers.into_iter().map(Performer::from).collect(),
            block.count,
        ))
    }

    fn performer_scenes(&self, performer_id: &str, page: u32) -> Result<Page<Scene>, SourceError> {
        self.scene_page(Some(performer_id), page)
    }

    fn all_scenes(&self, page: u32) -> Result<Page<Scene>, SourceError> {
        self.scene_page(None, page)
    }

    fn studios(&self, page: u32) -> Result<Page<Studio>, SourceError> {
        let data: StudiosData = self
            .gql
            .query(FIND_STUDIOS, json!({ "page": page, "perPage": PER_PAGE }))?;
        let block = data.find_studios;
        Ok(Page::new(
            block.studios.into_iter().map(Studio::from).collect(),
            block.count,
        ))
    }
}

impl TagWriter for StashClient {
    fn find_or_create_tag(&self, name: &str) -> Result<String, SourceError> {
        let data: TagsData = self.gql.query(
            FIND_TAGS,
            json!({ "filter": { "q": name, "page": 1, "per_page": 25 } }),
        )?;
        // `q` is a substring search
        if let Some(tag) = data.find_tags.tags.into_iter().find(|t| t.name == name) {
            return Ok(tag.id);
        }

        log::info!("Creating tag '{}'", name);
        let created: TagCreateData = self
            .gql
            .query(TAG_CREATE, json!({ "input": { "name": name } }))?;
        Ok(created.tag_create.id)
    }

    fn set_scene_tags(&self, scene_id: &str, tag_ids: &[String]) -> Result<(), SourceError> {
        let _: serde_json::Value = self.gql.query(
            SCENE_UPDATE,
            json!({ "input": { "id": scene_id, "tag_ids": tag_ids } }),
        )?;
        Ok(())
    }
}
