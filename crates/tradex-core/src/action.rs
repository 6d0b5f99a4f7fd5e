//! Canvas edit actions and the remote mutations that apply or revert them.
//!
//! Every [`Action`] maps to exactly one forward [`GraphOp`] (re-applying the
//! edit) and one inverse [`GraphOp`] (reverting it):
//!
//! | Action      | Forward     | Inverse     |
//! |-------------|-------------|-------------|
//! | AddNode     | CreateNode  | DeleteNode  |
//! | DeleteNode  | DeleteNode  | CreateNode  |
//! | UploadFile  | AttachFile  | DetachFile  |
//! | RemoveFile  | DetachFile  | AttachFile  |
//! | AddEdge     | CreateEdge  | DeleteEdge  |
//! | RemoveEdge  | DeleteEdge  | CreateEdge  |
//! | MoveNode    | MoveNode(to)| MoveNode(from) |
//!
//! Node re-creation always yields a new node id on the remote side; callers
//! receive the new `NodeRef` and must remap references themselves.

use crate::error::Result;
use crate::types::{EdgeRef, NodeRef, Position, StrategyId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A user-initiated canvas edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    AddNode {
        node: NodeRef,
    },
    DeleteNode {
        node: NodeRef,
    },
    UploadFile {
        node_id: String,
        file_url: String,
    },
    RemoveFile {
        node_id: String,
        file_url: String,
    },
    AddEdge {
        edge: EdgeRef,
    },
    RemoveEdge {
        edge: EdgeRef,
    },
    MoveNode {
        node_id: String,
        from: Position,
        to: Position,
    },
}

/// Discriminant of [`Action`], used for logging and metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    AddNode,
    DeleteNode,
    UploadFile,
    RemoveFile,
    AddEdge,
    RemoveEdge,
    MoveNode,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AddNode => "add_node",
            Self::DeleteNode => "delete_node",
            Self::UploadFile => "upload_file",
            Self::RemoveFile => "remove_file",
            Self::AddEdge => "add_edge",
            Self::RemoveEdge => "remove_edge",
            Self::MoveNode => "move_node",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One remote graph mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphOp {
    CreateNode {
        tool_type: String,
        strategy_id: StrategyId,
        position: Position,
    },
    DeleteNode {
        node_id: String,
        tool_type: String,
        strategy_id: StrategyId,
    },
    CreateEdge {
        strategy_id: StrategyId,
        edge: EdgeRef,
    },
    DeleteEdge {
        strategy_id: StrategyId,
        edge_id: String,
    },
    MoveNode {
        strategy_id: StrategyId,
        node_id: String,
        position: Position,
    },
    AttachFile {
        strategy_id: StrategyId,
        node_id: String,
        file_url: String,
    },
    DetachFile {
        strategy_id: StrategyId,
        node_id: String,
        file_url: String,
    },
}

impl GraphOp {
    /// Short name for logging and metrics labels.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateNode { .. } => "create_node",
            Self::DeleteNode { .. } => "delete_node",
            Self::CreateEdge { .. } => "create_edge",
            Self::DeleteEdge { .. } => "delete_edge",
            Self::MoveNode { .. } => "move_node",
            Self::AttachFile { .. } => "attach_file",
            Self::DetachFile { .. } => "detach_file",
        }
    }

    fn create_node(node: &NodeRef) -> Self {
        Self::CreateNode {
            tool_type: node.tool_type().to_string(),
            strategy_id: node.strategy_id().clone(),
            position: node.position,
        }
    }

    fn delete_node(node: &NodeRef) -> Self {
        Self::DeleteNode {
            node_id: node.id.clone(),
            tool_type: node.tool_type().to_string(),
            strategy_id: node.strategy_id().clone(),
        }
    }
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::AddNode { .. } => ActionKind::AddNode,
            Self::DeleteNode { .. } => ActionKind::DeleteNode,
            Self::UploadFile { .. } => ActionKind::UploadFile,
            Self::RemoveFile { .. } => ActionKind::RemoveFile,
            Self::AddEdge { .. } => ActionKind::AddEdge,
            Self::RemoveEdge { .. } => ActionKind::RemoveEdge,
            Self::MoveNode { .. } => ActionKind::MoveNode,
        }
    }

    /// Mutation that re-applies this edit.
    ///
    /// Node actions use the strategy back-reference stored on the node;
    /// everything else is scoped to `strategy_id`.
    pub fn forward(&self, strategy_id: &StrategyId) -> GraphOp {
        match self {
            Self::AddNode { node } => GraphOp::create_node(node),
            Self::DeleteNode { node } => GraphOp::delete_node(node),
            Self::UploadFile { node_id, file_url } => GraphOp::AttachFile {
                strategy_id: strategy_id.clone(),
                node_id: node_id.clone(),
                file_url: file_url.clone(),
            },
            Self::RemoveFile { node_id, file_url } => GraphOp::DetachFile {
                strategy_id: strategy_id.clone(),
                node_id: node_id.clone(),
                file_url: file_url.clone(),
            },
            Self::AddEdge { edge } => GraphOp::CreateEdge {
                strategy_id: strategy_id.clone(),
                edge: edge.clone(),
            },
            Self::RemoveEdge { edge } => GraphOp::DeleteEdge {
                strategy_id: strategy_id.clone(),
                edge_id: edge.id.clone(),
            },
            Self::MoveNode { node_id, to, .. } => GraphOp::MoveNode {
                strategy_id: strategy_id.clone(),
                node_id: node_id.clone(),
                position: *to,
            },
        }
    }

    /// Mutation that reverts this edit.
    pub fn inverse(&self, strategy_id: &StrategyId) -> GraphOp {
        match self {
            Self::AddNode { node } => GraphOp::delete_node(node),
            Self::DeleteNode { node } => GraphOp::create_node(node),
            Self::UploadFile { node_id, file_url } => GraphOp::DetachFile {
                strategy_id: strategy_id.clone(),
                node_id: node_id.clone(),
                file_url: file_url.clone(),
            },
            Self::RemoveFile { node_id, file_url } => GraphOp::AttachFile {
                strategy_id: strategy_id.clone(),
                node_id: node_id.clone(),
                file_url: file_url.clone(),
            },
            Self::AddEdge { edge } => GraphOp::DeleteEdge {
                strategy_id: strategy_id.clone(),
                edge_id: edge.id.clone(),
            },
            Self::RemoveEdge { edge } => GraphOp::CreateEdge {
                strategy_id: strategy_id.clone(),
                edge: edge.clone(),
            },
            Self::MoveNode { node_id, from, .. } => GraphOp::MoveNode {
                strategy_id: strategy_id.clone(),
                node_id: node_id.clone(),
                position: *from,
            },
        }
    }

    /// Node this action is about, if it carries a full `NodeRef`.
    pub fn node(&self) -> Option<&NodeRef> {
        match self {
            Self::AddNode { node } | Self::DeleteNode { node } => Some(node),
            _ => None,
        }
    }

    /// Replace the stored node after the remote side re-created it.
    ///
    /// Returns the previous node, or `None` for actions that carry no node.
    pub fn replace_node(&mut self, created: NodeRef) -> Option<NodeRef> {
        match self {
            Self::AddNode { node } | Self::DeleteNode { node } => {
                Some(std::mem::replace(node, created))
            }
            _ => None,
        }
    }

    /// Replace the stored edge after the remote side re-created it.
    pub fn replace_edge(&mut self, created: EdgeRef) -> Option<EdgeRef> {
        match self {
            Self::AddEdge { edge } | Self::RemoveEdge { edge } => {
                Some(std::mem::replace(edge, created))
            }
            _ => None,
        }
    }

    /// Rewrite every reference to node `old` as `new`.
    ///
    /// Returns true if anything changed.
    pub fn remap_node_id(&mut self, old: &str, new: &str) -> bool {
        fn swap(id: &mut String, old: &str, new: &str) -> bool {
            if id == old {
                *id = new.to_string();
                true
            } else {
                false
            }
        }

        match self {
            Self::AddNode { node } | Self::DeleteNode { node } => swap(&mut node.id, old, new),
            Self::UploadFile { node_id, .. }
            | Self::RemoveFile { node_id, .. }
            | Self::MoveNode { node_id, .. } => swap(node_id, old, new),
            Self::AddEdge { edge } | Self::RemoveEdge { edge } => {
                let source = swap(&mut edge.source, old, new);
                let target = swap(&mut edge.target, old, new);
                source || target
            }
        }
    }

    /// Rewrite the id of edge `old` as `new`.
    ///
    /// Returns true if anything changed.
    pub fn remap_edge_id(&mut self, old: &str, new: &str) -> bool {
        match self {
            Self::AddEdge { edge } | Self::RemoveEdge { edge } if edge.id == old => {
                edge.id = new.to_string();
                true
            }
            _ => false,
        }
    }

    /// Validate the payload of node and edge actions.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::AddNode { node } | Self::DeleteNode { node } => node.validate(),
            Self::AddEdge { edge } | Self::RemoveEdge { edge } => edge.validate(),
            _ => Ok(()),
        }
    }
}
