//! In-memory graph API.
//!
//! Records every call it receives, keeps a node/edge store so tests can
//! assert on remote state, and fails calls on demand.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tradex_core::{EdgeRef, NodeRef, Position, StrategyId};

use crate::error::{GraphError, GraphResult};
use crate::mutation::{BoxFuture, GraphMutation};

/// A call received by [`MockGraphApi`].
#[derive(Debug, Clone, PartialEq)]
pub enum GraphCall {
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
        edge: EdgeRef,
    },
    DeleteEdge {
        edge_id: String,
    },
    MoveNode {
        node_id: String,
        position: Position,
    },
    AttachFile {
        node_id: String,
        file_url: String,
    },
    DetachFile {
        node_id: String,
        file_url: String,
    },
}

#[derive(Debug, Default)]
struct Store {
    nodes: HashMap<String, NodeRef>,
    edges: HashMap<String, EdgeRef>,
    files: HashMap<String, Vec<String>>,
}

/// Mock graph API for testing.
#[derive(Debug)]
pub struct MockGraphApi {
    /// Recorded calls, including failed ones.
    calls: Mutex<Vec<GraphCall>>,
    /// Remote graph state after successful calls.
    store: Mutex<Store>,
    /// Call index -> failure reason.
    failures: Mutex<BTreeMap<u64, String>>,
    /// Number of calls received so far.
    call_count: AtomicU64,
    /// Counter for assigned node ids.
    next_node: AtomicU64,
    /// Artificial delay before each call settles.
    latency: Mutex<Option<Duration>>,
    /// Fail deletes/moves of unknown entities with `NotFound`.
    strict: AtomicBool,
}

impl Default for MockGraphApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGraphApi {
    /// Create a new lenient mock with an empty graph.
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            store: Mutex::new(Store::default()),
            failures: Mutex::new(BTreeMap::new()),
            call_count: AtomicU64::new(0),
            next_node: AtomicU64::new(1),
            latency: Mutex::new(None),
            strict: AtomicBool::new(false),
        }
    }

    /// Fail the next call with `reason`.
    pub fn fail_next(&self, reason: impl Into<String>) {
        self.fail_nth(0, reason);
    }

    /// Fail the call `n` positions from now (0 = next call).
    pub fn fail_nth(&self, n: u64, reason: impl Into<String>) {
        let index = self.call_count.load(Ordering::SeqCst) + n;
        self.failures.lock().insert(index, reason.into());
    }

    /// Delay every call by `latency` before it settles.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = Some(latency);
    }

    /// Reject operations on nodes/edges the mock does not know about.
    pub fn set_strict(&self, strict: bool) {
        self.strict.store(strict, Ordering::SeqCst);
    }

    /// Seed a node into the store.
    pub fn insert_node(&self, node: NodeRef) {
        self.store.lock().nodes.insert(node.id.clone(), node);
    }

    /// Get recorded calls.
    pub fn calls(&self) -> Vec<GraphCall> {
        self.calls.lock().clone()
    }

    /// Clear recorded calls.
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Node currently stored under `id`.
    pub fn node(&self, id: &str) -> Option<NodeRef> {
        self.store.lock().nodes.get(id).cloned()
    }

    /// All stored nodes, sorted by id.
    pub fn nodes(&self) -> Vec<NodeRef> {
        let mut nodes: Vec<_> = self.store.lock().nodes.values().cloned().collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        nodes
    }

    /// Check whether an edge is stored.
    pub fn has_edge(&self, id: &str) -> bool {
        self.store.lock().edges.contains_key(id)
    }

    /// Files attached to a node.
    pub fn files(&self, node_id: &str) -> Vec<String> {
        self.store
            .lock()
            .files
            .get(node_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Record the call and decide whether it fails.
    async fn begin(&self, call: GraphCall) -> GraphResult<()> {
        let index = self.call_count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().push(call);

        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        match self.failures.lock().remove(&index) {
            Some(reason) => Err(GraphError::Rejected(reason)),
            None => Ok(()),
        }
    }

    fn is_strict(&self) -> bool {
        self.strict.load(Ordering::SeqCst)
    }
}

impl GraphMutation for MockGraphApi {
    fn create_node<'a>(
        &'a self,
        tool_type: &'a str,
        strategy_id: &'a StrategyId,
        position: Position,
    ) -> BoxFuture<'a, GraphResult<NodeRef>> {
        Box::pin(async move {
            self.begin(GraphCall::CreateNode {
                tool_type: tool_type.to_string(),
                strategy_id: strategy_id.clone(),
                position,
            })
            .await?;

            let id = format!("node-{}", self.next_node.fetch_add(1, Ordering::SeqCst));
            let node = NodeRef::new(id, tool_type, strategy_id.clone(), position);
            self.insert_node(node.clone());
            Ok(node)
        })
    }

    fn delete_node<'a>(
        &'a self,
        node_id: &'a str,
        tool_type: &'a str,
        strategy_id: &'a StrategyId,
    ) -> BoxFuture<'a, GraphResult<()>> {
        Box::pin(async move {
            self.begin(GraphCall::DeleteNode {
                node_id: node_id.to_string(),
                tool_type: tool_type.to_string(),
                strategy_id: strategy_id.clone(),
            })
            .await?;

            let mut store = self.store.lock();
            if store.nodes.remove(node_id).is_none() && self.is_strict() {
                return Err(GraphError::NotFound(node_id.to_string()));
            }
            store.edges.retain(|_, edge| !edge.touches(node_id));
            store.files.remove(node_id);
            Ok(())
        })
    }

    fn create_edge<'a>(
        &'a self,
        _strategy_id: &'a StrategyId,
        edge: &'a EdgeRef,
    ) -> BoxFuture<'a, GraphResult<EdgeRef>> {
        Box::pin(async move {
            self.begin(GraphCall::CreateEdge { edge: edge.clone() })
                .await?;

            let mut store = self.store.lock();
            if self.is_strict()
                && !(store.nodes.contains_key(&edge.source) && store.nodes.contains_key(&edge.target))
            {
                return Err(GraphError::NotFound(format!(
                    "endpoint of edge {}",
                    edge.id
                )));
            }
            store.edges.insert(edge.id.clone(), edge.clone());
            Ok(edge.clone())
        })
    }

    fn delete_edge<'a>(
        &'a self,
        _strategy_id: &'a StrategyId,
        edge_id: &'a str,
    ) -> BoxFuture<'a, GraphResult<()>> {
        Box::pin(async move {
            self.begin(GraphCall::DeleteEdge {
                edge_id: edge_id.to_string(),
            })
            .await?;

            if self.store.lock().edges.remove(edge_id).is_none() && self.is_strict() {
                return Err(GraphError::NotFound(edge_id.to_string()));
            }
            Ok(())
        })
    }

    fn move_node<'a>(
        &'a self,
        _strategy_id: &'a StrategyId,
        node_id: &'a str,
        position: Position,
    ) -> BoxFuture<'a, GraphResult<()>> {
        Box::pin(async move {
            self.begin(GraphCall::MoveNode {
                node_id: node_id.to_string(),
                position,
            })
            .await?;

            match self.store.lock().nodes.get_mut(node_id) {
                Some(node) => node.position = position,
                None if self.is_strict() => return Err(GraphError::NotFound(node_id.to_string())),
                None => {}
            }
            Ok(())
        })
    }

    fn attach_file<'a>(
        &'a self,
        _strategy_id: &'a StrategyId,
        node_id: &'a str,
        file_url: &'a str,
    ) -> BoxFuture<'a, GraphResult<()>> {
        Box::pin(async move {
            self.begin(GraphCall::AttachFile {
                node_id: node_id.to_string(),
                file_url: file_url.to_string(),
            })
            .await?;

            self.store
                .lock()
                .files
                .entry(node_id.to_string())
                .or_default()
                .push(file_url.to_string());
            Ok(())
        })
    }

    fn detach_file<'a>(
        &'a self,
        _strategy_id: &'a StrategyId,
        node_id: &'a str,
        file_url: &'a str,
    ) -> BoxFuture<'a, GraphResult<()>> {
        Box::pin(async move {
            self.begin(GraphCall::DetachFile {
                node_id: node_id.to_string(),
                file_url: file_url.to_string(),
            })
            .await?;

            let mut store = self.store.lock();
            let files = store.files.entry(node_id.to_string()).or_default();
            let before = files.len();
            files.retain(|url| url != file_url);
            if files.len() == before && self.is_strict() {
                return Err(GraphError::NotFound(file_url.to_string()));
            }
            Ok(())
        })
    }
}
