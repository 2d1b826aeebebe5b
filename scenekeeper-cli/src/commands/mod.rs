pub(crate) mod acquire;
pub(crate) mod canonical;
pub(crate) mod config;
pub(crate) mod diff;
pub(crate) mod duplicates;
pub(crate) mod favorites;
pub(crate) mod local;
pub(crate) mod pipeline;
pub(crate) mod sync_studios;

use std::path::PathBuf;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use scenekeeper_client::{Config, StashClient, StashDbClient, WhisparrClient};
use scenekeeper_core::looks_like_uuid;
use scenekeeper_reconcile::RunLayout;

use crate::error::CliError;

/// Settings shared by every command.
pub(crate) struct AppContext {
    pub config_path: Option<PathBuf>,
    pub layout: RunLayout,
    pub quiet: bool,
}

impl AppContext {
    /// Load configuration. Each command validates only the sections it uses.
    pub(crate) fn config(&self) -> Result<Config, CliError> {
        let config = Config::load(self.config_path.as_deref())?;
        match &config.path {
            Some(path) => log::debug!("Using config file {}", path.display()),
            None => log::debug!("No config file; using environment and defaults"),
        }
        Ok(config)
    }
}

pub(crate) fn stash_client(config: &Config) -> Result<StashClient, CliError> {
    let endpoint = config.stash_endpoint()?;
    Ok(StashClient::new(&endpoint, &config.http)?)
}

pub(crate) fn stashdb_client(config: &Config) -> Result<StashDbClient, CliError> {
    let endpoint = config.stashdb_endpoint()?;
    Ok(StashDbClient::new(&endpoint, &config.http)?)
}

pub(crate) fn whisparr_client(config: &Config) -> Result<WhisparrClient, CliError> {
    let endpoint = config.whisparr_endpoint()?;
    Ok(WhisparrClient::new(&endpoint, &config.http)?)
}

/// Reject arguments that cannot be a canonical performer id.
pub(crate) fn require_canonical_id(performer: &str) -> Result<&str, CliError> {
    let performer = performer.trim();
    if looks_like_uuid(performer) {
        Ok(performer)
    } else {
        Err(CliError::invalid_argument(format!(
            "'{}' is not a canonical performer UUID",
            performer
        )))
    }
}

pub(crate) fn print_header(title: &str) {
    log::info!("{}", title.if_supports_color(Stdout, |t| t.bold()));
}

pub(crate) fn print_written(path: &std::path::Path) {
    log::info!(
        "{} Wrote {}",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        path.display().if_supports_color(Stdout, |t| t.cyan()),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_ids_must_look_like_uuids() {
        assert!(require_canonical_id(" 169970f2-3b5e-4a7d-9f1e-0123456789ab ").is_ok());
        assert!(require_canonical_id("42").is_err());
    }
}
