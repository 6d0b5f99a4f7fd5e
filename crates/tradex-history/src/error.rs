//! History error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Invalid history configuration: {0}")]
    InvalidConfig(String),
}

pub type HistoryResult<T> = Result<T, HistoryError>;
