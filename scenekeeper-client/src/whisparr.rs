//! The acquisition system's REST API (v3).

use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use scenekeeper_core::{LeafUnit, SeriesUnit};
use scenekeeper_reconcile::{AcquisitionSystem, AddSeries, SourceError};

use crate::config::{Endpoint, HttpSettings};
use crate::error::ClientError;
use crate::http::{Pacer, RawResponse, build_client, send_logged};
use crate::wire::null_as_default;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSeries {
    #[serde(default)]
    id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEpisode {
    #[serde(default)]
    id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    title: String,
    #[serde(default)]
    release_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WithId {
    #[serde(default)]
    id: Option<Value>,
}

impl WithId {
    /// Integer ids only; anything else is treated as absent.
    fn int_id(&self) -> Option<i64> {
        self.id.as_ref().and_then(Value::as_i64)
    }
}

/// Body of a series creation request.
pub(crate) fn add_series_payload(request: &AddSeries) -> Value {
    let mut payload = json!({
        "title": request.title,
        "qualityProfileId": request.quality_profile_id,
        "rootFolderPath": request.root_folder_path,
        "path": request.path,
        "monitored": false,
        "seasonFolder": false,
        "tags": [],
        "addOptions": {
            "monitor": "none",
            "searchForMissingEpisodes": false,
        },
    });
    if let (Some(id), Some(obj)) = (request.language_profile_id, payload.as_object_mut()) {
        obj.insert("languageProfileId".to_string(), json!(id));
    }
    payload
}

/// Paced REST client for the acquisition system.
pub struct WhisparrClient {
    http: Client,
    base_url: String,
    api_key: String,
    pacer: Pacer,
}

impl WhisparrClient {
    pub fn new(endpoint: &Endpoint, http: &HttpSettings) -> Result<Self, ClientError> {
        let api_key = endpoint
            .api_key
            .clone()
            .ok_or_else(|| ClientError::config("whisparr.api_key is required"))?;
        Ok(Self {
            http: build_client(http.timeout)?,
            base_url: endpoint.url.trim_end_matches('/').to_string(),
            api_key,
            pacer: Pacer::new(http.api_delay),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn send(&self, label: &str, request: RequestBuilder) -> Result<RawResponse, ClientError> {
        self.pacer.wait();
        let request = request.header("X-Api-Key", &self.api_key);
        send_logged(&self.http, label, "X-Api-Key", request)?.error_for_status()
    }

    fn get<T: DeserializeOwned>(
        &self,
        label: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let resp = self.send(label, self.http.get(self.url(path)).query(query))?;
        resp.json()
    }

    fn post<T: DeserializeOwned>(&self, label: &str, path: &str, body: &Value) -> Result<T, ClientError> {
        let resp = self.send(label, self.http.post(self.url(path)).json(body))?;
        if resp.body.trim().is_empty() {
            return Ok(serde_json::from_value(Value::Null)?);
        }
        resp.json()
    }
}

impl AcquisitionSystem for WhisparrClient {
    fn series_list(&self) -> Result<Vec<SeriesUnit>, SourceError> {
        let raw: Vec<WireSeries> = self.get("whisparr.series.list", "/api/v3/series", &[])?;
        let total = raw.len();
        let series: Vec<SeriesUnit> = raw
            .into_iter()
            .filter_map(|s| s.id.map(|id| SeriesUnit { id, title: s.title }))
            .collect();
        if series.len() < total {
            log::warn!("{} series without an id ignored", total - series.len());
        }
        Ok(series)
    }

    fn episodes(&self, series_id: i64) -> Result<Vec<LeafUnit>, SourceError> {
        let raw: Vec<WireEpisode> = self.get(
            "whisparr.episode.list",
            "/api/v3/episode",
            &[("seriesId", series_id.to_string())],
        )?;
        Ok(raw
            .into_iter()
            .filter_map(|e| {
                e.id.map(|id| LeafUnit {
                    id,
                    title: e.title,
                    release_date: e.release_date,
                })
            })
            .collect())
    }

    fn queue_episode_search(&self, episode_id: i64) -> Result<Option<i64>, SourceError> {
        let body = json!({ "name": "EpisodeSearch", "episodeIds": [episode_id] });
        let resp: Option<WithId> =
            self.post("whisparr.command.episodeSearch", "/api/v3/command", &body)?;
        Ok(resp.and_then(|r| r.int_id()))
    }

    fn add_series(&self, request: &AddSeries) -> Result<Option<i64>, SourceError> {
        let body = add_series_payload(request);
        let resp: Option<WithId> = self.post("whisparr.series.add", "/api/v3/series", &body)?;
        Ok(resp.and_then(|r| r.int_id()))
    }
}
