//! Strategy canvas editor session runner.
//!
//! Plays the role of the canvas editor view:
//! - loads configuration and connects to the graph API
//! - applies edit commands remotely and records them in the history
//! - drives undo, redo, and batch application
//! - keeps a local model of the canvas in step with the history

pub mod app;
pub mod config;
pub mod error;
pub mod session;

pub use app::{CanvasModel, CommandReport, EditorSession, SessionReport};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use session::{Command, Control, EditStep, SessionScript};
