//! The canonical metadata catalog.

use serde::Deserialize;
use serde_json::json;

use scenekeeper_core::{PerformerMeta, Scene};
use scenekeeper_reconcile::{CanonicalCatalog, Page, SourceError, collect_pages};

use crate::config::{Endpoint, HttpSettings};
use crate::error::ClientError;
use crate::graphql::GraphQlClient;
use crate::http::{Pacer, build_client};
use crate::wire::{WireScene, null_as_default};

pub const PER_PAGE: u32 = 100;

const FIND_PERFORMER: &str = "
query FindPerformer($id: ID!) {
  findPerformer(id: $id) { id name }
}";

const QUERY_SCENES: &str = "
query QueryScenes($input: SceneQueryInput!) {
  queryScenes(input: $input) {
    count
    scenes {
      id
      title
      date
      code
      studio { id name }
    }
  }
}";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PerformerData {
    #[serde(default)]
    find_performer: Option<WirePerformerMeta>,
}

#[derive(Deserialize)]
struct WirePerformerMeta {
    id: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryScenesData {
    query_scenes: SceneBlock,
}

#[derive(Deserialize)]
struct SceneBlock {
    #[serde(default)]
    count: usize,
    #[serde(default, deserialize_with = "null_as_default")]
    scenes: Vec<WireScene>,
}

/// Paced GraphQL client for the canonical catalog.
pub struct StashDbClient {
    gql: GraphQlClient,
}

impl StashDbClient {
    pub fn new(endpoint: &Endpoint, http: &HttpSettings) -> Result<Self, ClientError> {
        let client = build_client(http.timeout)?;
        Ok(Self {
            gql: GraphQlClient::new(client, "stashdb", endpoint, Some(Pacer::new(http.api_delay))),
        })
    }

    pub fn performer(&self, id: &str) -> Result<PerformerMeta, SourceError> {
        let data: PerformerData = self.gql.query(FIND_PERFORMER, json!({ "id": id }))?;
        match data.find_performer {
            Some(p) => Ok(PerformerMeta {
                id: p.id,
                name: p.name,
            }),
            None => Err(SourceError::not_found(format!("canonical performer {}", id))),
        }
    }

    /// One page of the performer's scenes, newest first.
    pub fn scenes_page(&self, performer_id: &str, page: u32) -> Result<Page<Scene>, SourceError> {
        let input = json!({
            "performers": { "value": [performer_id], "modifier": "INCLUDES" },
            "page": page,
            "per_page": PER_PAGE,
            "sort": "DATE",
            "direction": "DESC",
        });
        let data: QueryScenesData = self.gql.query(QUERY_SCENES, json!({ "input": input }))?;
        let block = data.query_scenes;
        log::debug!(
            "Canonical scenes page {}: {} of {}",
            page,
            block.scenes.len(),
            block.count
        );
        Ok(Page::new(
            block.scenes.into_iter().map(Scene::from).collect(),
            block.count,
        ))
    }
}

impl CanonicalCatalog for StashDbClient {
    fn performer_with_scenes(
        &self,
        external_id: &str,
    ) -> Result<(PerformerMeta, Vec<Scene>), SourceError> {
        let meta = self.performer(external_id)?;
        let scenes = collect_pages(|page| self.scenes_page(external_id, page))?;
        Ok((meta, scenes))
    }
}
