//! Service configuration: TOML file plus environment overrides.
//!
//! Priority for every value: env var > config file > default. Sections are
//! validated lazily, so a command that only talks to the local library never
//! needs the other services configured.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

pub const DEFAULT_TIMEOUT_SECONDS: f64 = 30.0;
pub const DEFAULT_API_DELAY_SECONDS: f64 = 2.0;
pub const DEFAULT_LOOKBACK_DAYS: i64 = 30;
pub const DEFAULT_STASHDB_URL: &str = "https://stashdb.org";

pub const ENV_STASH_URL: &str = "SCENEKEEPER_STASH_URL";
pub const ENV_STASH_API_KEY: &str = "SCENEKEEPER_STASH_API_KEY";
pub const ENV_STASHDB_URL: &str = "SCENEKEEPER_STASHDB_URL";
pub const ENV_STASHDB_API_KEY: &str = "SCENEKEEPER_STASHDB_API_KEY";
pub const ENV_WHISPARR_URL: &str = "SCENEKEEPER_WHISPARR_URL";
pub const ENV_WHISPARR_API_KEY: &str = "SCENEKEEPER_WHISPARR_API_KEY";

/// Where a configuration value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    /// Loaded from an environment variable.
    EnvVar(&'static str),
    /// Loaded from the config file.
    ConfigFile,
    /// Hard-coded default value.
    Default,
    /// Not set anywhere.
    Missing,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EnvVar(var) => write!(f, "env ${}", var),
            Self::ConfigFile => write!(f, "config file"),
            Self::Default => write!(f, "default"),
            Self::Missing => write!(f, "not set"),
        }
    }
}

/// A resolved value with its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sourced<T> {
    pub value: Option<T>,
    pub source: ValueSource,
}

impl<T> Sourced<T> {
    fn missing() -> Self {
        Self {
            value: None,
            source: ValueSource::Missing,
        }
    }
}

// ── File format ─────────────────────────────────────────────────────────────

/// TOML config file format.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub stash: Option<ServiceSection>,
    pub stashdb: Option<ServiceSection>,
    pub whisparr: Option<WhisparrSection>,
    pub http: Option<HttpSection>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceSection {
    pub url: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WhisparrSection {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub lookback_days: Option<i64>,
    pub root_folder_path: Option<String>,
    pub quality_profile_id: Option<i64>,
    pub language_profile_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HttpSection {
    pub timeout_seconds: Option<f64>,
    pub api_delay_seconds: Option<f64>,
}

// ── Resolved configuration ──────────────────────────────────────────────────

/// URL and key of one service, not yet validated.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub url: Sourced<String>,
    pub api_key: Sourced<String>,
}

/// A validated service endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Base URL without a trailing slash.
    pub url: String,
    pub api_key: Option<String>,
}

/// Settings used when creating series for studios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudioSyncSettings {
    pub root_folder_path: String,
    pub quality_profile_id: i64,
    pub language_profile_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HttpSettings {
    pub timeout: Duration,
    pub api_delay: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs_f64(DEFAULT_TIMEOUT_SECONDS),
            api_delay: Duration::from_secs_f64(DEFAULT_API_DELAY_SECONDS),
        }
    }
}

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// File the values were read from, if one existed.
    pub path: Option<PathBuf>,
    pub stash: ServiceConfig,
    pub stashdb: ServiceConfig,
    pub whisparr: ServiceConfig,
    pub lookback_days: Option<i64>,
    pub root_folder_path: Option<String>,
    pub quality_profile_id: Option<i64>,
    pub language_profile_id: Option<i64>,
    pub http: HttpSettings,
    /// Sources of the timeout and the delay.
    pub http_sources: (ValueSource, ValueSource),
}

/// Return the path to the default config file.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("scenekeeper").join("config.toml"))
}

fn clean_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn resolve_value(
    env: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    file: Option<String>,
    default: Option<&str>,
) -> Sourced<String> {
    if let Some(value) = non_blank(env(var)) {
        return Sourced {
            value: Some(value),
            source: ValueSource::EnvVar(var),
        };
    }
    if let Some(value) = non_blank(file) {
        return Sourced {
            value: Some(value),
            source: ValueSource::ConfigFile,
        };
    }
    match default {
        Some(value) => Sourced {
            value: Some(value.to_string()),
            source: ValueSource::Default,
        },
        None => Sourced::missing(),
    }
}

fn url_value(mut value: Sourced<String>) -> Sourced<String> {
    value.value = value.value.map(|v| clean_url(&v));
    value
}

impl Config {
    /// Load from `path`, or from [`config_path`] when `None`.
    ///
    /// An explicitly given path must exist. A missing default file is the
    /// same as an empty one.
    pub fn load(path: Option<&Path>) -> Result<Self, ClientError> {
        let (path, explicit) = match path {
            Some(p) => (Some(p.to_path_buf()), true),
            None => (config_path(), false),
        };

        let (file, found) = match &path {
            Some(p) if p.exists() => {
                let content = std::fs::read_to_string(p)?;
                let file: ConfigFile = toml::from_str(&content).map_err(|e| {
                    ClientError::config(format!("Failed to parse {}: {}", p.display(), e))
                })?;
                (file, Some(p.clone()))
            }
            Some(p) if explicit => {
                return Err(ClientError::config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            _ => (ConfigFile::default(), None),
        };

        let mut config = Self::resolve(file, |var| std::env::var(var).ok());
        config.path = found;
        Ok(config)
    }

    /// Merge a parsed file with environment lookups.
    pub fn resolve(file: ConfigFile, env: impl Fn(&str) -> Option<String>) -> Self {
        let stash = file.stash.unwrap_or_default();
        let stashdb = file.stashdb.unwrap_or_default();
        let whisparr = file.whisparr.unwrap_or_default();
        let http = file.http.unwrap_or_default();

        let (timeout, timeout_source) = match http.timeout_seconds.filter(|t| *t > 0.0) {
            Some(t) => (t, ValueSource::ConfigFile),
            None => (DEFAULT_TIMEOUT_SECONDS, ValueSource::Default),
        };
        let (api_delay, api_delay_source) = match http.api_delay_seconds.filter(|d| *d >= 0.0) {
            Some(d) => (d, ValueSource::ConfigFile),
            None => (DEFAULT_API_DELAY_SECONDS, ValueSource::Default),
        };

        Self {
            path: None,
            stash: ServiceConfig {
                url: url_value(resolve_value(&env, ENV_STASH_URL, stash.url, None)),
                api_key: resolve_value(&env, ENV_STASH_API_KEY, stash.api_key, None),
            },
            stashdb: ServiceConfig {
                url: url_value(resolve_value(
                    &env,
                    ENV_STASHDB_URL,
                    stashdb.url,
                    Some(DEFAULT_STASHDB_URL),
                )),
                api_key: resolve_value(&env, ENV_STASHDB_API_KEY, stashdb.api_key, None),
            },
            whisparr: ServiceConfig {
                url: url_value(resolve_value(&env, ENV_WHISPARR_URL, whisparr.url, None)),
                api_key: resolve_value(&env, ENV_WHISPARR_API_KEY, whisparr.api_key, None),
            },
            lookback_days: whisparr.lookback_days,
            root_folder_path: non_blank(whisparr.root_folder_path),
            quality_profile_id: whisparr.quality_profile_id,
            language_profile_id: whisparr.language_profile_id,
            http: HttpSettings {
                timeout: Duration::from_secs_f64(timeout),
                api_delay: Duration::from_secs_f64(api_delay),
            },
            http_sources: (timeout_source, api_delay_source),
        }
    }

    /// The local library endpoint. The key is optional.
    pub fn stash_endpoint(&self) -> Result<Endpoint, ClientError> {
        Ok(Endpoint {
            url: require(&self.stash.url, "stash.url", ENV_STASH_URL)?,
            api_key: self.stash.api_key.value.clone(),
        })
    }

    /// The canonical catalog endpoint. Both URL and key are required.
    pub fn stashdb_endpoint(&self) -> Result<Endpoint, ClientError> {
        Ok(Endpoint {
            url: require(&self.stashdb.url, "stashdb.url", ENV_STASHDB_URL)?,
            api_key: Some(require(
                &self.stashdb.api_key,
                "stashdb.api_key",
                ENV_STASHDB_API_KEY,
            )?),
        })
    }

    /// The acquisition system endpoint. Both URL and key are required.
    pub fn whisparr_endpoint(&self) -> Result<Endpoint, ClientError> {
        Ok(Endpoint {
            url: require(&self.whisparr.url, "whisparr.url", ENV_WHISPARR_URL)?,
            api_key: Some(require(
                &self.whisparr.api_key,
                "whisparr.api_key",
                ENV_WHISPARR_API_KEY,
            )?),
        })
    }

    pub fn studio_sync_settings(&self) -> Result<StudioSyncSettings, ClientError> {
        match (&self.root_folder_path, self.quality_profile_id) {
            (Some(root), Some(quality)) => Ok(StudioSyncSettings {
                root_folder_path: root.clone(),
                quality_profile_id: quality,
                language_profile_id: self.language_profile_id,
            }),
            _ => Err(ClientError::config(
                "whisparr.root_folder_path and whisparr.quality_profile_id must be set to create series",
            )),
        }
    }

    /// Look-back window: CLI flag, then config, then the default.
    pub fn lookback_days(&self, cli: Option<i64>) -> i64 {
        cli.or(self.lookback_days).unwrap_or(DEFAULT_LOOKBACK_DAYS)
    }

    /// Every setting as `(key, display value, source)`, keys masked.
    pub fn entries(&self) -> Vec<(&'static str, String, ValueSource)> {
        fn plain(v: &Sourced<String>) -> String {
            v.value.clone().unwrap_or_else(|| "(not set)".to_string())
        }
        fn secret(v: &Sourced<String>) -> String {
            v.value
                .as_deref()
                .map(mask)
                .unwrap_or_else(|| "(not set)".to_string())
        }
        fn file_value<T: ToString>(v: &Option<T>) -> (String, ValueSource) {
            match v {
                Some(x) => (x.to_string(), ValueSource::ConfigFile),
                None => ("(not set)".to_string(), ValueSource::Missing),
            }
        }

        let lookback = match self.lookback_days {
            Some(d) => (d.to_string(), ValueSource::ConfigFile),
            None => (DEFAULT_LOOKBACK_DAYS.to_string(), ValueSource::Default),
        };
        let root = file_value(&self.root_folder_path);
        let quality = file_value(&self.quality_profile_id);
        let language = file_value(&self.language_profile_id);

        vec![
            ("stash.url", plain(&self.stash.url), self.stash.url.source),
            ("stash.api_key", secret(&self.stash.api_key), self.stash.api_key.source),
            ("stashdb.url", plain(&self.stashdb.url), self.stashdb.url.source),
            ("stashdb.api_key", secret(&self.stashdb.api_key), self.stashdb.api_key.source),
            ("whisparr.url", plain(&self.whisparr.url), self.whisparr.url.source),
            ("whisparr.api_key", secret(&self.whisparr.api_key), self.whisparr.api_key.source),
            ("whisparr.lookback_days", lookback.0, lookback.1),
            ("whisparr.root_folder_path", root.0, root.1),
            ("whisparr.quality_profile_id", quality.0, quality.1),
            ("whisparr.language_profile_id", language.0, language.1),
            (
                "http.timeout_seconds",
                self.http.timeout.as_secs_f64().to_string(),
                self.http_sources.0,
            ),
            (
                "http.api_delay_seconds",
                self.http.api_delay.as_secs_f64().to_string(),
                self.http_sources.1,
            ),
        ]
    }
}

fn require(value: &Sourced<String>, key: &str, var: &str) -> Result<String, ClientError> {
    value.value.clone().ok_or_else(|| {
        ClientError::config(format!(
            "Missing {}. Set {} or add it to the config file",
            key, var
        ))
    })
}

/// Mask a secret, keeping only its last four characters.
pub fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), tail)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn parse(text: &str) -> ConfigFile {
        toml::from_str(text).unwrap()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    const FULL: &str = r#"
[stash]
url = "http://localhost:9999/"

[stashdb]
api_key = "stashdb-secret"

[whisparr]
url = "http://localhost:6969"
api_key = "whisparr-secret"
lookback_days = 14
root_folder_path = "/data/studios"
quality_profile_id = 3

[http]
timeout_seconds = 0
api_delay_seconds = -1.0
"#;

    #[test]
    fn file_values_resolve_with_defaults() {
        let config = Config::resolve(parse(FULL), no_env);
        let stash = config.stash_endpoint().unwrap();
        assert_eq!(stash.url, "http://localhost:9999");
        assert_eq!(stash.api_key, None);

        let stashdb = config.stashdb_endpoint().unwrap();
        assert_eq!(stashdb.url, DEFAULT_STASHDB_URL);
        assert_eq!(config.stashdb.url.source, ValueSource::Default);
        assert_eq!(stashdb.api_key.as_deref(), Some("stashdb-secret"));

        assert_eq!(config.http, HttpSettings::default());
        assert_eq!(config.lookback_days(None), 14);
        assert_eq!(config.lookback_days(Some(60)), 60);
    }

    #[test]
    fn env_overrides_file() {
        let env: HashMap<&str, &str> = [
            (ENV_WHISPARR_URL, "http://other:6969/"),
            (ENV_STASHDB_API_KEY, "from-env"),
        ]
        .into_iter()
        .collect();
        let config = Config::resolve(parse(FULL), |var| env.get(var).map(|v| v.to_string()));

        assert_eq!(config.whisparr_endpoint().unwrap().url, "http://other:6969");
        assert_eq!(config.whisparr.url.source, ValueSource::EnvVar(ENV_WHISPARR_URL));
        assert_eq!(
            config.stashdb_endpoint().unwrap().api_key.as_deref(),
            Some("from-env")
        );
    }

    #[test]
    fn sections_are_validated_lazily() {
        let config = Config::resolve(parse("[stash]\nurl = \"http://x\"\n"), no_env);
        assert!(config.stash_endpoint().is_ok());
        let err = config.whisparr_endpoint().unwrap_err();
        assert!(err.to_string().contains("whisparr.url"));
        assert!(config.stashdb_endpoint().is_err());
        assert!(config.studio_sync_settings().is_err());
        assert_eq!(config.lookback_days(None), DEFAULT_LOOKBACK_DAYS);
    }

    #[test]
    fn blank_values_count_as_missing() {
        let config = Config::resolve(parse("[stash]\nurl = \"  \"\n"), no_env);
        assert_eq!(config.stash.url.source, ValueSource::Missing);
        assert!(config.stash_endpoint().is_err());
    }

    #[test]
    fn studio_sync_settings_need_root_and_quality() {
        let config = Config::resolve(parse(FULL), no_env);
        let settings = config.studio_sync_settings().unwrap();
        assert_eq!(settings.root_folder_path, "/data/studios");
        assert_eq!(settings.quality_profile_id, 3);
        assert_eq!(settings.language_profile_id, None);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<ConfigFile>("[stash]\nurll = \"x\"\n").is_err());
    }

    #[test]
    fn entries_mask_secrets() {
        let config = Config::resolve(parse(FULL), no_env);
        let entries = config.entries();
        let (_, value, source) = entries
            .iter()
            .find(|(k, _, _)| *k == "whisparr.api_key")
            .unwrap();
        assert_eq!(value, "***********cret");
        assert_eq!(*source, ValueSource::ConfigFile);
        assert!(!entries.iter().any(|(_, v, _)| v.contains("stashdb-secret")));
    }

    #[test]
    fn mask_short_values_entirely() {
        assert_eq!(mask("abc"), "***");
        assert_eq!(mask("abcdefgh"), "****efgh");
    }

    #[test]
    fn load_explicit_missing_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(Config::load(Some(missing.as_path())).is_err());
    }

    #[test]
    fn load_reads_file_and_records_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, FULL).unwrap();
        let config = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(config.path.as_deref(), Some(path.as_path()));
        assert_eq!(config.quality_profile_id, Some(3));
    }

    #[test]
    fn load_malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[stash\nurl=").unwrap();
        assert!(matches!(
            Config::load(Some(path.as_path())),
            Err(ClientError::Config(_))
        ));
    }
}
