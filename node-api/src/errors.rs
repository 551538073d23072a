use thiserror::Error;

/// Why a single request to the node did not produce a usable value.
///
/// Background polls collapse every variant into [`crate::Fetched::Failed`];
/// user actions surface the variant so the caller can show the cause.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{}", status_message(.status, .error))]
    Status {
        status: u16,
        error: Option<String>,
    },

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    Application(String),

    #[error("invalid node url: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Message from the node's `error` field, if the node sent one
    pub fn node_message(&self) -> Option<&str> {
        match self {
            FetchError::Status { error, .. } => error.as_deref(),
            FetchError::Application(msg) => Some(msg),
            _ => None,
        }
    }
}

fn status_message(status: &u16, error: &Option<String>) -> String {
    match error {
        Some(msg) => format!("HTTP {}: {}", status, msg),
        None => format!("HTTP {}", status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display_with_node_error() {
        let err = FetchError::Status {
            status: 400,
            error: Some("Missing Seed IP".to_string()),
        };
        assert_eq!(err.to_string(), "HTTP 400: Missing Seed IP");
        assert_eq!(err.node_message(), Some("Missing Seed IP"));
    }

    #[test]
    fn test_status_display_without_node_error() {
        let err = FetchError::Status {
            status: 502,
            error: None,
        };
        assert_eq!(err.to_string(), "HTTP 502");
        assert_eq!(err.node_message(), None);
    }
}
