//! Remote graph mutation API for the Tradex strategy canvas.
//!
//! The canvas mirrors every edit to a REST API. This crate provides:
//! - [`GraphMutation`]: dyn-compatible trait for the create/delete/move calls
//! - [`RestGraphClient`]: reqwest implementation against the Tradex API
//! - [`MockGraphApi`]: in-memory implementation with call recording and
//!   scripted failures for tests and dry runs
//! - [`execute`]: dispatch of a single [`tradex_core::GraphOp`]

pub mod client;
pub mod error;
pub mod mock;
pub mod mutation;

pub use client::{ClientConfig, RestGraphClient};
pub use error::{GraphError, GraphResult};
pub use mock::{GraphCall, MockGraphApi};
pub use mutation::{execute, BoxFuture, DynGraphMutation, GraphMutation, OpEffect};
