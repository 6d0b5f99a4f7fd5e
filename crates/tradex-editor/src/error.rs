//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Invalid edit: {0}")]
    Core(#[from] tradex_core::CoreError),

    #[error("Graph API error: {0}")]
    Graph(#[from] tradex_graph::GraphError),

    #[error("History error: {0}")]
    History(#[from] tradex_history::HistoryError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] tradex_telemetry::TelemetryError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type AppResult<T> = Result<T, AppError>;
