//! Core domain types for the Tradex strategy canvas.
//!
//! This crate provides the fundamental types shared by the graph client and
//! the edit history:
//! - `Position`, `NodeRef`, `NodeData`, `EdgeRef`: canvas graph entities
//! - `Action`: a user-initiated canvas edit, recorded in the history log
//! - `GraphOp`: one remote graph mutation (the forward or inverse of an action)

pub mod action;
pub mod error;
pub mod types;

pub use action::{Action, ActionKind, GraphOp};
pub use error::{CoreError, Result};
pub use types::{EdgeRef, NodeData, NodeRef, Position, StrategyId};
