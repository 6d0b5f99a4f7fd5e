//! Graph mutation trait.
//!
//! Abstracts the remote calls the edit history replays during undo and redo.
//! Methods return boxed futures so implementations can be shared as
//! `Arc<dyn GraphMutation>`.

use std::pin::Pin;
use std::sync::Arc;

use tradex_core::{EdgeRef, GraphOp, NodeRef, Position, StrategyId};

use crate::error::GraphResult;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Remote graph mutation API.
pub trait GraphMutation: Send + Sync {
    /// Create a node. The remote side assigns the id.
    fn create_node<'a>(
        &'a self,
        tool_type: &'a str,
        strategy_id: &'a StrategyId,
        position: Position,
    ) -> BoxFuture<'a, GraphResult<NodeRef>>;

    /// Delete a node.
    fn delete_node<'a>(
        &'a self,
        node_id: &'a str,
        tool_type: &'a str,
        strategy_id: &'a StrategyId,
    ) -> BoxFuture<'a, GraphResult<()>>;

    /// Create an edge. The returned edge may carry a server-assigned id.
    fn create_edge<'a>(
        &'a self,
        strategy_id: &'a StrategyId,
        edge: &'a EdgeRef,
    ) -> BoxFuture<'a, GraphResult<EdgeRef>>;

    /// Delete an edge.
    fn delete_edge<'a>(
        &'a self,
        strategy_id: &'a StrategyId,
        edge_id: &'a str,
    ) -> BoxFuture<'a, GraphResult<()>>;

    /// Move a node to an absolute position.
    fn move_node<'a>(
        &'a self,
        strategy_id: &'a StrategyId,
        node_id: &'a str,
        position: Position,
    ) -> BoxFuture<'a, GraphResult<()>>;

    /// Attach an uploaded file to a node.
    fn attach_file<'a>(
        &'a self,
        strategy_id: &'a StrategyId,
        node_id: &'a str,
        file_url: &'a str,
    ) -> BoxFuture<'a, GraphResult<()>>;

    /// Detach a file from a node.
    fn detach_file<'a>(
        &'a self,
        strategy_id: &'a StrategyId,
        node_id: &'a str,
        file_url: &'a str,
    ) -> BoxFuture<'a, GraphResult<()>>;
}

/// Arc wrapper for GraphMutation trait objects.
pub type DynGraphMutation = Arc<dyn GraphMutation>;

/// What a successful [`GraphOp`] produced.
#[derive(Debug, Clone, PartialEq)]
pub enum OpEffect {
    /// A node was (re-)created; carries the server's node with its new id.
    NodeCreated(NodeRef),
    /// An edge was (re-)created.
    EdgeCreated(EdgeRef),
    /// The mutation completed with nothing to report.
    Done,
}

/// Issue exactly one remote call for `op`.
pub async fn execute(api: &dyn GraphMutation, op: &GraphOp) -> GraphResult<OpEffect> {
    match op {
        GraphOp::CreateNode {
            tool_type,
            strategy_id,
            position,
        } => api
            .create_node(tool_type, strategy_id, *position)
            .await
            .map(OpEffect::NodeCreated),
        GraphOp::DeleteNode {
            node_id,
            tool_type,
            strategy_id,
        } => api
            .delete_node(node_id, tool_type, strategy_id)
            .await
            .map(|()| OpEffect::Done),
        GraphOp::CreateEdge { strategy_id, edge } => api
            .create_edge(strategy_id, edge)
            .await
            .map(OpEffect::EdgeCreated),
        GraphOp::DeleteEdge {
            strategy_id,
            edge_id,
        } => api
            .delete_edge(strategy_id, edge_id)
            .await
            .map(|()| OpEffect::Done),
        GraphOp::MoveNode {
            strategy_id,
            node_id,
            position,
        } => api
            .move_node(strategy_id, node_id, *position)
            .await
            .map(|()| OpEffect::Done),
        GraphOp::AttachFile {
            strategy_id,
            node_id,
            file_url,
        } => api
            .attach_file(strategy_id, node_id, file_url)
            .await
            .map(|()| OpEffect::Done),
        GraphOp::DetachFile {
            strategy_id,
            node_id,
            file_url,
        } => api
            .detach_file(strategy_id, node_id, file_url)
            .await
            .map(|()| OpEffect::Done),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{GraphCall, MockGraphApi};

    #[tokio::test]
    async fn test_execute_create_node_returns_created() {
        let api = MockGraphApi::new();
        let op = GraphOp::CreateNode {
            tool_type: "video".to_string(),
            strategy_id: StrategyId::new("s1"),
            position: Position::new(3.0, 4.0),
        };

        let effect = execute(&api, &op).await.unwrap();
        match effect {
            OpEffect::NodeCreated(node) => {
                assert_eq!(node.tool_type(), "video");
                assert_eq!(node.position, Position::new(3.0, 4.0));
            }
            other => panic!("unexpected effect: {other:?}"),
        }
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_execute_move_node_issues_one_call() {
        let api = MockGraphApi::new();
        let op = GraphOp::MoveNode {
            strategy_id: StrategyId::new("s1"),
            node_id: "n1".to_string(),
            position: Position::new(1.0, 1.0),
        };

        let effect = execute(&api, &op).await.unwrap();
        assert_eq!(effect, OpEffect::Done);
        assert_eq!(
            api.calls(),
            vec![GraphCall::MoveNode {
                node_id: "n1".to_string(),
                position: Position::new(1.0, 1.0),
            }]
        );
    }

    #[tokio::test]
    async fn test_execute_propagates_failure() {
        let api = MockGraphApi::new();
        api.fail_next("boom");
        let op = GraphOp::DeleteEdge {
            strategy_id: StrategyId::new("s1"),
            edge_id: "e1".to_string(),
        };
        assert!(execute(&api, &op).await.is_err());
    }
}
