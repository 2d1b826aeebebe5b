use thiserror::Error;

use scenekeeper_client::ClientError;
use scenekeeper_reconcile::{ReconcileError, SourceError};

/// Errors that can occur during CLI command execution.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    /// I/O error
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// Configuration or client construction failed
    #[error("{0}")]
    Client(#[from] ClientError),

    /// A collaborator call failed
    #[error("{0}")]
    Source(#[from] SourceError),

    /// Artifact, ledger or reconciliation failure
    #[error("{0}")]
    Reconcile(#[from] ReconcileError),

    /// Invalid command-line input
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl CliError {
    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}
