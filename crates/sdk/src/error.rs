//! Error types for the Airflow SDK.

/// Result type for SDK operations.
pub type AirflowResult<T> = Result<T, AirflowError>;

/// Error types that can occur when talking to the Airflow REST API.
#[derive(Debug, thiserror::Error)]
pub enum AirflowError {
    /// Connection, TLS or timeout failure before a response arrived.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Airflow answered with a non-success status.
    #[error("Airflow API error (status {status}): {body}")]
    Upstream { status: u16, body: String },

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl AirflowError {
    /// Create an upstream error from a status code and response body.
    pub fn from_response(status: u16, body: &str) -> Self {
        Self::Upstream {
            status,
            body: body.to_string(),
        }
    }

    /// HTTP status of an upstream failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if the request timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_display() {
        let err = AirflowError::from_response(404, "{\"title\":\"DAG not found\"}");
        assert_eq!(err.status(), Some(404));
        assert_eq!(
            err.to_string(),
            "Airflow API error (status 404): {\"title\":\"DAG not found\"}"
        );
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_config_has_no_status() {
        let err = AirflowError::Config("base_url is required".to_string());
        assert_eq!(err.status(), None);
        assert!(err.to_string().contains("base_url is required"));
    }
}
