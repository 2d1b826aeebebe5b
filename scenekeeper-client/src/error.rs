use scenekeeper_reconcile::SourceError;

/// Errors that can occur talking to one of the external services.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not authorized: {0}")]
    Unauthorized(String),

    #[error("GraphQL error: {0}")]
    GraphQl(String),

    #[error("Server error (HTTP {status}): {message}")]
    Status { status: u16, message: String },

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn graphql(msg: impl Into<String>) -> Self {
        Self::GraphQl(msg.into())
    }
}

impl From<ClientError> for SourceError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Http(e) => SourceError::Transport(e.to_string()),
            ClientError::Io(e) => SourceError::Transport(e.to_string()),
            ClientError::Config(msg) => SourceError::Transport(msg),
            ClientError::Unauthorized(msg) => SourceError::Unauthorized(msg),
            ClientError::Status { status, message } => match status {
                401 | 403 => SourceError::Unauthorized(message),
                404 => SourceError::NotFound(message),
                400..=499 => SourceError::Rejected { status, message },
                _ => SourceError::Transport(format!("HTTP {}: {}", status, message)),
            },
            ClientError::GraphQl(msg) => SourceError::Schema(msg),
            ClientError::Json(e) => SourceError::Schema(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> SourceError {
        ClientError::Status {
            status: code,
            message: "body".into(),
        }
        .into()
    }

    #[test]
    fn status_codes_sort_into_source_taxonomy() {
        assert!(matches!(status(401), SourceError::Unauthorized(_)));
        assert!(matches!(status(404), SourceError::NotFound(_)));
        assert!(matches!(status(400), SourceError::Rejected { status: 400, .. }));
        assert!(matches!(status(503), SourceError::Transport(_)));
        assert!(status(422).is_record_scoped());
        assert!(!status(500).is_record_scoped());
    }

    #[test]
    fn graphql_errors_are_schema_errors() {
        let err: SourceError = ClientError::graphql("missing data").into();
        assert!(matches!(err, SourceError::Schema(_)));
    }
}
