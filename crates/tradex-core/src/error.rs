//! Error types for tradex-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid node: {0}")]
    InvalidNode(String),

    #[error("Invalid edge: {0}")]
    InvalidEdge(String),

    #[error("Invalid position: {0}")]
    InvalidPosition(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
