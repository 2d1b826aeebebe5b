//! Blocking HTTP collaborators for the local library, the canonical catalog
//! and the acquisition system, plus the configuration that points at them.

pub mod config;
pub mod error;
pub mod graphql;
pub mod http;
pub mod stash;
pub mod stashdb;
pub mod whisparr;
mod wire;

pub use config::{
    Config, ConfigFile, Endpoint, HttpSettings, StudioSyncSettings, ValueSource, config_path,
    mask,
};
pub use error::ClientError;
pub use graphql::{AuthStyle, GraphQlClient};
pub use stash::StashClient;
pub use stashdb::StashDbClient;
pub use whisparr::WhisparrClient;
