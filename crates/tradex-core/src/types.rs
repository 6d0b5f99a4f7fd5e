//! Canvas graph entities.
//!
//! Contains node and edge references as exchanged with the remote graph API,
//! plus the owning strategy identifier.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a strategy (the document that owns a canvas graph).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StrategyId(String);

impl StrategyId {
    /// Create a new strategy identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StrategyId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for StrategyId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Canvas coordinates of a node.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Check that both coordinates are finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Opaque node payload.
///
/// Always carries the back-reference to the owning strategy and the tool
/// type; anything else the canvas stores is kept verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    /// Owning strategy.
    pub strategy_id: StrategyId,
    /// Tool kind of the node (e.g., "image", "video", "document").
    pub tool_type: String,
    /// Remaining payload fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl NodeData {
    pub fn new(strategy_id: StrategyId, tool_type: impl Into<String>) -> Self {
        Self {
            strategy_id,
            tool_type: tool_type.into(),
            extra: serde_json::Map::new(),
        }
    }
}

/// A vertex of the strategy canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRef {
    /// Node id, unique within a strategy. Assigned by the remote API.
    pub id: String,
    /// Peer type tag used by the canvas renderer.
    #[serde(rename = "type")]
    pub node_type: String,
    /// Canvas position.
    pub position: Position,
    /// Payload including the strategy back-reference.
    pub data: NodeData,
}

impl NodeRef {
    /// Create a node whose peer type equals its tool type.
    pub fn new(
        id: impl Into<String>,
        tool_type: impl Into<String>,
        strategy_id: StrategyId,
        position: Position,
    ) -> Self {
        let tool_type = tool_type.into();
        Self {
            id: id.into(),
            node_type: tool_type.clone(),
            position,
            data: NodeData::new(strategy_id, tool_type),
        }
    }

    /// Tool type from the payload.
    pub fn tool_type(&self) -> &str {
        &self.data.tool_type
    }

    /// Owning strategy from the payload.
    pub fn strategy_id(&self) -> &StrategyId {
        &self.data.strategy_id
    }

    /// Validate the fields the remote API relies on.
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(CoreError::InvalidNode("empty node id".to_string()));
        }
        if self.data.tool_type.is_empty() {
            return Err(CoreError::InvalidNode(format!(
                "node {} has no tool type",
                self.id
            )));
        }
        if !self.position.is_finite() {
            return Err(CoreError::InvalidPosition(format!(
                "node {} at {}",
                self.id, self.position
            )));
        }
        Ok(())
    }
}

/// A directed connection between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRef {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
}

impl EdgeRef {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            source_handle: None,
            target_handle: None,
        }
    }

    /// Connect two nodes with a freshly generated edge id.
    pub fn connect(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), source, target)
    }

    /// Check whether either endpoint is `node_id`.
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(CoreError::InvalidEdge("empty edge id".to_string()));
        }
        if self.source.is_empty() || self.target.is_empty() {
            return Err(CoreError::InvalidEdge(format!(
                "edge {} has a missing endpoint",
                self.id
            )));
        }
        if self.source == self.target {
            return Err(CoreError::InvalidEdge(format!(
                "edge {} is a self-loop on {}",
                self.id, self.source
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_node() -> NodeRef {
        NodeRef::new("n1", "image", StrategyId::new("s1"), Position::new(10.0, 20.0))
    }

    #[test]
    fn test_node_accessors() {
        let node = sample_node();
        assert_eq!(node.tool_type(), "image");
        assert_eq!(node.node_type, "image");
        assert_eq!(node.strategy_id().as_str(), "s1");
        assert!(node.validate().is_ok());
    }

    #[test]
    fn test_node_validation() {
        let mut node = sample_node();
        node.id.clear();
        assert!(matches!(node.validate(), Err(CoreError::InvalidNode(_))));

        let mut node = sample_node();
        node.position = Position::new(f64::NAN, 0.0);
        assert!(matches!(node.validate(), Err(CoreError::InvalidPosition(_))));
    }

    #[test]
    fn test_node_json_shape() {
        let mut node = sample_node();
        node.data
            .extra
            .insert("label".to_string(), serde_json::json!("Chart"));

        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "image");
        assert_eq!(json["data"]["strategy_id"], "s1");
        assert_eq!(json["data"]["label"], "Chart");

        let parsed: NodeRef = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, node);
    }

    #[test]
    fn test_edge_connect_and_validate() {
        let edge = EdgeRef::connect("a", "b");
        assert!(!edge.id.is_empty());
        assert!(edge.touches("a"));
        assert!(edge.touches("b"));
        assert!(!edge.touches("c"));
        assert!(edge.validate().is_ok());

        let looped = EdgeRef::new("e1", "a", "a");
        assert!(matches!(looped.validate(), Err(CoreError::InvalidEdge(_))));
    }

    #[test]
    fn test_edge_handles_skipped_when_absent() {
        let json = serde_json::to_string(&EdgeRef::new("e1", "a", "b")).unwrap();
        assert!(!json.contains("source_handle"));
    }
}
