//! Undo/redo action history for the Tradex strategy canvas.
//!
//! Records canvas edits as a linear timeline and replays their inverse or
//! forward mutations against the remote graph API on undo and redo.
//!
//! # Key Components
//!
//! - [`ActionHistory`]: async `record` / `undo` / `redo` / `batch_apply`
//! - [`HistoryStack`]: the undo/redo stack pair (pure bookkeeping)
//! - [`HistoryOutcome`]: result of every operation; failures never surface as `Err`
//! - [`HistoryEvent`]: failure and identity-change notifications
//! - [`BusyFlag`]: single-slot guard, at most one remote replay in flight
//!
//! # Failure Policy
//!
//! 1. Empty stack -> `NothingToDo`
//! 2. Concurrent undo/redo/batch -> `Busy`, stacks untouched
//! 3. Undo/redo remote failure -> optimistic move reverted, `RolledBack`
//! 4. Batch failure -> remaining steps skipped, nothing recorded, no rollback, `Partial`

pub mod config;
pub mod error;
pub mod event;
pub mod guard;
pub mod history;
pub mod outcome;
pub mod stack;

pub use config::HistoryConfig;
pub use error::{HistoryError, HistoryResult};
pub use event::HistoryEvent;
pub use guard::{BusyFlag, BusyGuard};
pub use history::ActionHistory;
pub use outcome::HistoryOutcome;
pub use stack::{HistoryEntry, HistoryStack};
