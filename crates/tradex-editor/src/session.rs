//! Edit-session scripts.
//!
//! A session is a JSON document listing canvas commands in the order the
//! user issued them:
//!
//! ```json
//! {"commands": [
//!   {"op": "add_node", "tool_type": "image", "position": {"x": 0, "y": 0}},
//!   {"op": "move_node", "node_id": "$0", "to": {"x": 40, "y": 10}},
//!   {"op": "undo"},
//!   {"op": "batch", "actions": [{"op": "add_node", "tool_type": "video"}]}
//! ]}
//! ```
//!
//! Node ids written as `$N` refer to the node created by the N-th
//! `add_node` of the session (0-based, batches included).

use serde::Deserialize;
use tradex_core::Position;

use crate::error::{AppError, AppResult};

/// A canvas edit.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditStep {
    AddNode {
        tool_type: String,
        #[serde(default)]
        position: Position,
    },
    DeleteNode {
        node_id: String,
    },
    MoveNode {
        node_id: String,
        to: Position,
    },
    UploadFile {
        node_id: String,
        file_url: String,
    },
    RemoveFile {
        node_id: String,
        file_url: String,
    },
    Connect {
        source: String,
        target: String,
    },
    Disconnect {
        edge_id: String,
    },
}

impl EditStep {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddNode { .. } => "add_node",
            Self::DeleteNode { .. } => "delete_node",
            Self::MoveNode { .. } => "move_node",
            Self::UploadFile { .. } => "upload_file",
            Self::RemoveFile { .. } => "remove_file",
            Self::Connect { .. } => "connect",
            Self::Disconnect { .. } => "disconnect",
        }
    }
}

/// History control commands.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Control {
    Undo,
    Redo,
    Batch { actions: Vec<EditStep> },
}

/// One line of a session script.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Command {
    Control(Control),
    Edit(EditStep),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Control(Control::Undo) => "undo",
            Self::Control(Control::Redo) => "redo",
            Self::Control(Control::Batch { .. }) => "batch",
            Self::Edit(step) => step.name(),
        }
    }
}

/// A parsed session.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionScript {
    pub commands: Vec<Command>,
}

impl SessionScript {
    pub fn from_json(content: &str) -> AppResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Session(format!("Failed to read session {path}: {e}")))?;
        Self::from_json(&content)
    }
}

/// Resolve a node reference against the ids created so far.
pub fn resolve_node_ref(raw: &str, created: &[String]) -> AppResult<String> {
    let Some(index) = raw.strip_prefix('$') else {
        return Ok(raw.to_string());
    };
    let index: usize = index
        .parse()
        .map_err(|_| AppError::Session(format!("Bad node reference {raw}")))?;
    created
        .get(index)
        .cloned()
        .ok_or_else(|| AppError::Session(format!("Node reference {raw} not created yet")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_commands() {
        let script = SessionScript::from_json(
            r#"{"commands": [
                {"op": "add_node", "tool_type": "image", "position": {"x": 1, "y": 2}},
                {"op": "add_node", "tool_type": "video"},
                {"op": "connect", "source": "$0", "target": "$1"},
                {"op": "undo"},
                {"op": "redo"},
                {"op": "batch", "actions": [
                    {"op": "move_node", "node_id": "$0", "to": {"x": 5, "y": 5}}
                ]}
            ]}"#,
        )
        .unwrap();

        let names: Vec<_> = script.commands.iter().map(Command::name).collect();
        assert_eq!(
            names,
            vec!["add_node", "add_node", "connect", "undo", "redo", "batch"]
        );
        assert_eq!(
            script.commands[1],
            Command::Edit(EditStep::AddNode {
                tool_type: "video".to_string(),
                position: Position::default(),
            })
        );
    }

    #[test]
    fn test_unknown_op_is_rejected() {
        let err = SessionScript::from_json(r#"{"commands": [{"op": "explode"}]}"#).unwrap_err();
        assert!(matches!(err, AppError::Json(_)));
    }

    #[test]
    fn test_resolve_node_ref() {
        let created = vec!["node-1".to_string(), "node-2".to_string()];
        assert_eq!(resolve_node_ref("$1", &created).unwrap(), "node-2");
        assert_eq!(resolve_node_ref("literal", &created).unwrap(), "literal");
        assert!(resolve_node_ref("$7", &created).is_err());
        assert!(resolve_node_ref("$x", &created).is_err());
    }
}
