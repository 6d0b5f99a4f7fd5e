//! Graph API error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rejected by API: {0}")]
    Rejected(String),
}

impl GraphError {
    /// Check if retrying the same call could succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::HttpClient(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

pub type GraphResult<T> = Result<T, GraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(GraphError::HttpClient("timeout".to_string()).is_retryable());
        assert!(GraphError::Status {
            status: 503,
            body: String::new()
        }
        .is_retryable());
        assert!(!GraphError::Status {
            status: 400,
            body: String::new()
        }
        .is_retryable());
        assert!(!GraphError::NotFound("n1".to_string()).is_retryable());
    }
}
