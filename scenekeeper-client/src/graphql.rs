//! Minimal GraphQL-over-HTTP client with header-variant auth fallback.
//!
//! Servers in the wild disagree on how an API key is presented, so each
//! request walks a fixed list of header styles until one is accepted. The
//! first accepted style is remembered and tried first on later requests.

use std::sync::Mutex;

use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::Endpoint;
use crate::error::ClientError;
use crate::http::{Pacer, RawResponse, send_logged, snippet};

/// How the API key is attached to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStyle {
    None,
    ApiKeyHeader,
    Bearer,
    LowerApiKeyHeader,
}

impl AuthStyle {
    /// Styles to try, in order. Without a key only `None` is possible.
    pub fn sequence(has_key: bool) -> &'static [AuthStyle] {
        if has_key {
            &[
                AuthStyle::None,
                AuthStyle::ApiKeyHeader,
                AuthStyle::Bearer,
                AuthStyle::LowerApiKeyHeader,
            ]
        } else {
            &[AuthStyle::None]
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AuthStyle::None => "none",
            AuthStyle::ApiKeyHeader => "ApiKey",
            AuthStyle::Bearer => "Bearer",
            AuthStyle::LowerApiKeyHeader => "apiKey",
        }
    }

    fn apply(self, request: RequestBuilder, key: &str) -> RequestBuilder {
        match self {
            AuthStyle::None => request,
            AuthStyle::ApiKeyHeader => request.header("ApiKey", key),
            AuthStyle::Bearer => request.header("Authorization", format!("Bearer {}", key)),
            AuthStyle::LowerApiKeyHeader => request.header("apiKey", key),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<ErrorItem>>,
}

#[derive(Debug, Deserialize)]
struct ErrorItem {
    #[serde(default)]
    message: String,
}

/// Result of interpreting one response.
#[derive(Debug)]
pub(crate) enum Attempt {
    /// The server refused these credentials; try the next style.
    AuthRejected(String),
    Done(Result<Value, ClientError>),
}

fn mentions_auth(message: &str) -> bool {
    let lower = message.to_lowercase();
    ["not authorized", "unauthorized", "forbidden"]
        .iter()
        .any(|needle| lower.contains(needle))
}

/// Decide what a raw response means for the auth walk.
pub(crate) fn interpret(resp: RawResponse) -> Attempt {
    if resp.status == 401 || resp.status == 403 {
        return Attempt::AuthRejected(format!("HTTP {}", resp.status));
    }
    let resp = match resp.error_for_status() {
        Ok(r) => r,
        Err(e) => return Attempt::Done(Err(e)),
    };
    let envelope: Envelope = match resp.json() {
        Ok(e) => e,
        Err(e) => return Attempt::Done(Err(e)),
    };

    if let Some(errors) = envelope.errors.filter(|e| !e.is_empty()) {
        let message = errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        if errors.iter().any(|e| mentions_auth(&e.message)) {
            return Attempt::AuthRejected(message);
        }
        return Attempt::Done(Err(ClientError::graphql(message)));
    }

    match envelope.data {
        Some(Value::Null) | None => Attempt::Done(Err(ClientError::graphql(format!(
            "response has no data: {}",
            snippet(&resp.body)
        )))),
        Some(data) => Attempt::Done(Ok(data)),
    }
}

/// `<base>/graphql`, unless the base already points at the endpoint.
pub fn graphql_url(base: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.ends_with("/graphql") {
        base.to_string()
    } else {
        format!("{}/graphql", base)
    }
}

/// Blocking GraphQL client for one endpoint.
pub struct GraphQlClient {
    http: Client,
    label: &'static str,
    url: String,
    api_key: Option<String>,
    pacer: Option<Pacer>,
    accepted: Mutex<Option<AuthStyle>>,
}

impl GraphQlClient {
    pub fn new(http: Client, label: &'static str, endpoint: &Endpoint, pacer: Option<Pacer>) -> Self {
        Self {
            http,
            label,
            url: graphql_url(&endpoint.url),
            api_key: endpoint.api_key.clone().filter(|k| !k.is_empty()),
            pacer,
            accepted: Mutex::new(None),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn accepted(&self) -> Option<AuthStyle> {
        match self.accepted.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn remember(&self, style: AuthStyle) {
        match self.accepted.lock() {
            Ok(mut guard) => *guard = Some(style),
            Err(poisoned) => *poisoned.into_inner() = Some(style),
        }
    }

    /// Run `query` and deserialize its `data` field into `T`.
    pub fn query<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T, ClientError> {
        let data = self.query_value(query, variables)?;
        Ok(serde_json::from_value(data)?)
    }

    fn query_value(&self, query: &str, variables: Value) -> Result<Value, ClientError> {
        let body = serde_json::json!({ "query": query, "variables": variables });
        let key = self.api_key.as_deref().unwrap_or("");

        let mut styles: Vec<AuthStyle> = Vec::with_capacity(4);
        if let Some(style) = self.accepted() {
            styles.push(style);
        }
        for style in AuthStyle::sequence(self.api_key.is_some()) {
            if !styles.contains(style) {
                styles.push(*style);
            }
        }

        let mut last_rejection = String::new();
        for style in styles {
            if let Some(pacer) = &self.pacer {
                pacer.wait();
            }
            let request = style.apply(self.http.post(&self.url).json(&body), key);
            let resp = send_logged(&self.http, self.label, style.label(), request)?;

            match interpret(resp) {
                Attempt::AuthRejected(reason) => {
                    log::debug!("[{}] auth '{}' rejected: {}", self.label, style.label(), reason);
                    last_rejection = reason;
                }
                Attempt::Done(result) => {
                    if result.is_ok() {
                        self.remember(style);
                    }
                    return result;
                }
            }
        }

        Err(ClientError::Unauthorized(format!(
            "{} rejected every auth style (last: {})",
            self.label, last_rejection
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(status: u16, body: &str) -> RawResponse {
        RawResponse {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn auth_statuses_move_to_next_style() {
        assert!(matches!(interpret(raw(401, "")), Attempt::AuthRejected(_)));
        assert!(matches!(interpret(raw(403, "")), Attempt::AuthRejected(_)));
    }

    #[test]
    fn auth_error_messages_move_to_next_style() {
        let body = r#"{"data":null,"errors":[{"message":"Not Authorized"}]}"#;
        assert!(matches!(interpret(raw(200, body)), Attempt::AuthRejected(_)));
        let body = r#"{"errors":[{"message":"operation forbidden for user"}]}"#;
        assert!(matches!(interpret(raw(200, body)), Attempt::AuthRejected(_)));
    }

    #[test]
    fn other_errors_are_final() {
        let body = r#"{"errors":[{"message":"Cannot query field \"foo\""}]}"#;
        assert!(matches!(
            interpret(raw(200, body)),
            Attempt::Done(Err(ClientError::GraphQl(_)))
        ));
        assert!(matches!(
            interpret(raw(500, "boom")),
            Attempt::Done(Err(ClientError::Status { status: 500, .. }))
        ));
        assert!(matches!(
            interpret(raw(200, "not json")),
            Attempt::Done(Err(ClientError::Json(_)))
        ));
    }

    #[test]
    fn missing_data_is_an_error() {
        assert!(matches!(
            interpret(raw(200, r#"{"data":null}"#)),
            Attempt::Done(Err(ClientError::GraphQl(_)))
        ));
        assert!(matches!(
            interpret(raw(200, "{}")),
            Attempt::Done(Err(ClientError::GraphQl(_)))
        ));
    }

    #[test]
    fn data_is_returned() {
        match interpret(raw(200, r#"{"data":{"x":1},"errors":[]}"#)) {
            Attempt::Done(Ok(v)) => assert_eq!(v["x"], 1),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn sequence_depends_on_key() {
        assert_eq!(AuthStyle::sequence(false), &[AuthStyle::None]);
        assert_eq!(AuthStyle::sequence(true).len(), 4);
        assert_eq!(AuthStyle::sequence(true)[1].label(), "ApiKey");
    }

    #[test]
    fn graphql_url_appends_path_once() {
        assert_eq!(graphql_url("http://localhost:9999/"), "http://localhost:9999/graphql");
        assert_eq!(graphql_url("https://stashdb.org/graphql"), "https://stashdb.org/graphql");
    }
}
