//! History notifications.
//!
//! Sent over an unbounded mpsc channel so the editor can surface failed
//! undos and remap node and edge ids without polling.

use tradex_core::{ActionKind, EdgeRef, NodeRef};

/// Event emitted by [`crate::ActionHistory`].
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryEvent {
    /// An undo's remote call failed; the stacks were restored.
    UndoFailed { kind: ActionKind, reason: String },

    /// A redo's remote call failed; the stacks were restored.
    RedoFailed { kind: ActionKind, reason: String },

    /// A batch stopped early. Steps before `applied` remain in effect remotely.
    BatchAborted {
        applied: usize,
        total: usize,
        reason: String,
    },

    /// The remote side re-created a node under a new id.
    ///
    /// The history entry now carries `current`; references to
    /// `previous_id` elsewhere (edges, other entries) are NOT rewritten.
    /// Use [`crate::ActionHistory::remap_node_id`] to do that explicitly.
    NodeRecreated { previous_id: String, current: NodeRef },

    /// The remote side re-created an edge under a new id.
    ///
    /// Other entries still holding `previous_id` are rewritten only through
    /// [`crate::ActionHistory::remap_edge_id`].
    EdgeRecreated { previous_id: String, current: EdgeRef },
}
