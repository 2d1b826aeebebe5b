use std::path::PathBuf;

use thiserror::Error;

use crate::source::SourceError;

/// Errors that abort a reconciliation step.
///
/// Matching misses (no studio, no episode, no duplicate) are never errors;
/// they are recorded as outcomes.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("{0}")]
    Source(#[from] SourceError),

    #[error("Missing artifact {} (run `scenekeeper {producer}` first)", path.display())]
    MissingArtifact { path: PathBuf, producer: String },

    #[error("Malformed artifact {}: {message}", path.display())]
    Artifact { path: PathBuf, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReconcileError {
    pub fn missing_artifact(path: impl Into<PathBuf>, producer: impl Into<String>) -> Self {
        Self::MissingArtifact {
            path: path.into(),
            producer: producer.into(),
        }
    }

    pub fn artifact(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Artifact {
            path: path.into(),
            message: message.into(),
        }
    }
}
