//! Editor session orchestration.
//!
//! The session stands in for the canvas editor view: it owns the
//! [`ActionHistory`] for one strategy, applies user edits remotely before
//! recording them, and keeps a local [`CanvasModel`] in step with undo,
//! redo, and batch results.

use std::collections::BTreeMap;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use tradex_core::{Action, EdgeRef, NodeRef, StrategyId};
use tradex_graph::DynGraphMutation;
use tradex_history::{ActionHistory, HistoryConfig, HistoryEvent, HistoryOutcome};

use crate::error::{AppError, AppResult};
use crate::session::{resolve_node_ref, Command, Control, EditStep, SessionScript};

/// Local view of the canvas graph.
#[derive(Debug, Default, Clone, Serialize)]
pub struct CanvasModel {
    nodes: BTreeMap<String, NodeRef>,
    edges: BTreeMap<String, EdgeRef>,
    files: BTreeMap<String, Vec<String>>,
}

impl CanvasModel {
    pub fn node(&self, id: &str) -> Option<&NodeRef> {
        self.nodes.get(id)
    }

    pub fn edge(&self, id: &str) -> Option<&EdgeRef> {
        self.edges.get(id)
    }

    pub fn files(&self, node_id: &str) -> &[String] {
        self.files.get(node_id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Apply `action` (forward) or its inverse to the local graph.
    pub fn apply(&mut self, action: &Action, forward: bool) {
        match action {
            Action::AddNode { node } | Action::DeleteNode { node } => {
                let adds = matches!(action, Action::AddNode { .. }) == forward;
                if adds {
                    self.nodes.insert(node.id.clone(), node.clone());
                } else {
                    self.nodes.remove(&node.id);
                    self.edges.retain(|_, edge| !edge.touches(&node.id));
                    self.files.remove(&node.id);
                }
            }
            Action::UploadFile { node_id, file_url } | Action::RemoveFile { node_id, file_url } => {
                let adds = matches!(action, Action::UploadFile { .. }) == forward;
                let files = self.files.entry(node_id.clone()).or_default();
                files.retain(|url| url != file_url);
                if adds {
                    files.push(file_url.clone());
                }
            }
            Action::AddEdge { edge } | Action::RemoveEdge { edge } => {
                let adds = matches!(action, Action::AddEdge { .. }) == forward;
                if adds {
                    self.edges.insert(edge.id.clone(), edge.clone());
                } else {
                    self.edges.remove(&edge.id);
                }
            }
            Action::MoveNode { node_id, from, to } => {
                if let Some(node) = self.nodes.get_mut(node_id) {
                    node.position = if forward { *to } else { *from };
                }
            }
        }
    }

    /// Rename edge `old` to `new`.
    pub fn remap_edge(&mut self, old: &str, new: &str) {
        if let Some(mut edge) = self.edges.remove(old) {
            edge.id = new.to_string();
            self.edges.insert(new.to_string(), edge);
        }
    }

    /// Rename node `old` to `new` everywhere.
    pub fn remap_node(&mut self, old: &str, new: &str) {
        if let Some(mut node) = self.nodes.remove(old) {
            node.id = new.to_string();
            self.nodes.insert(new.to_string(), node);
        }
        for edge in self.edges.values_mut() {
            if edge.source == old {
                edge.source = new.to_string();
            }
            if edge.target == old {
                edge.target = new.to_string();
            }
        }
        if let Some(files) = self.files.remove(old) {
            self.files.insert(new.to_string(), files);
        }
    }
}

/// Result of one session command.
#[derive(Debug, Clone, Serialize)]
pub struct CommandReport {
    pub index: usize,
    pub op: &'static str,
    /// Outcome label ("applied", "nothing_to_do", "rolled_back", "failed", ...).
    pub result: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Summary printed at the end of a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub strategy_id: StrategyId,
    pub commands: Vec<CommandReport>,
    pub undo_depth: usize,
    pub redo_depth: usize,
    pub nodes: usize,
    pub edges: usize,
}

/// One open strategy canvas.
pub struct EditorSession {
    strategy_id: StrategyId,
    api: DynGraphMutation,
    history: ActionHistory,
    events: mpsc::UnboundedReceiver<HistoryEvent>,
    model: CanvasModel,
    /// Ids of nodes created by `add_node`, for `$N` references.
    created: Vec<String>,
}

impl EditorSession {
    pub fn new(strategy_id: StrategyId, api: DynGraphMutation, config: &HistoryConfig) -> Self {
        let (tx, events) = mpsc::unbounded_channel();
        let history = ActionHistory::new(strategy_id.clone(), api.clone(), config).with_events(tx);
        Self {
            strategy_id,
            api,
            history,
            events,
            model: CanvasModel::default(),
            created: Vec::new(),
        }
    }

    pub fn history(&self) -> &ActionHistory {
        &self.history
    }

    pub fn model(&self) -> &CanvasModel {
        &self.model
    }

    /// Ids created so far, in creation order.
    pub fn created(&self) -> &[String] {
        &self.created
    }

    /// Run every command of `script` in order.
    ///
    /// Individual command failures are reported, not propagated.
    pub async fn run(&mut self, script: &SessionScript) -> SessionReport {
        info!(
            strategy_id = %self.strategy_id,
            commands = script.commands.len(),
            "Running editor session"
        );

        let mut commands = Vec::with_capacity(script.commands.len());
        for (index, command) in script.commands.iter().enumerate() {
            let (result, detail) = match self.execute(command).await {
                Ok(outcome) => {
                    if outcome.is_failure() {
                        warn!(index, op = command.name(), result = outcome.label(), "Command did not fully apply");
                    }
                    (outcome.label().to_string(), Self::outcome_detail(&outcome))
                }
                Err(e) => {
                    warn!(index, op = command.name(), error = %e, "Command failed");
                    ("failed".to_string(), Some(e.to_string()))
                }
            };
            commands.push(CommandReport {
                index,
                op: command.name(),
                result,
                detail,
            });
        }

        SessionReport {
            strategy_id: self.strategy_id.clone(),
            commands,
            undo_depth: self.history.undo_len(),
            redo_depth: self.history.redo_len(),
            nodes: self.model.node_count(),
            edges: self.model.edge_count(),
        }
    }

    /// Execute one command.
    pub async fn execute(&mut self, command: &Command) -> AppResult<HistoryOutcome> {
        let outcome = match command {
            Command::Edit(step) => self.apply_edit(step).await?,
            Command::Control(Control::Undo) => {
                let outcome = self.history.undo().await;
                if outcome == HistoryOutcome::Applied {
                    if let Some(entry) = self.history.peek_redo() {
                        self.model.apply(&entry.action, false);
                    }
                }
                outcome
            }
            Command::Control(Control::Redo) => {
                let outcome = self.history.redo().await;
                if outcome == HistoryOutcome::Applied {
                    if let Some(entry) = self.history.peek_undo() {
                        self.model.apply(&entry.action, true);
                    }
                }
                outcome
            }
            Command::Control(Control::Batch { actions }) => self.apply_batch(actions).await?,
        };
        self.drain_events();
        Ok(outcome)
    }

    /// Apply an edit remotely, then record it.
    async fn apply_edit(&mut self, step: &EditStep) -> AppResult<HistoryOutcome> {
        let action = match step {
            EditStep::AddNode {
                tool_type,
                position,
            } => {
                let node = self
                    .api
                    .create_node(tool_type, &self.strategy_id, *position)
                    .await?;
                self.created.push(node.id.clone());
                Action::AddNode { node }
            }
            EditStep::DeleteNode { node_id } => {
                let node = self.lookup_node(node_id)?;
                self.api
                    .delete_node(&node.id, node.tool_type(), node.strategy_id())
                    .await?;
                Action::DeleteNode { node }
            }
            EditStep::MoveNode { node_id, to } => {
                let node = self.lookup_node(node_id)?;
                self.api
                    .move_node(&self.strategy_id, &node.id, *to)
                    .await?;
                Action::MoveNode {
                    node_id: node.id,
                    from: node.position,
                    to: *to,
                }
            }
            EditStep::UploadFile { node_id, file_url } => {
                let node_id = resolve_node_ref(node_id, &self.created)?;
                self.api
                    .attach_file(&self.strategy_id, &node_id, file_url)
                    .await?;
                Action::UploadFile {
                    node_id,
                    file_url: file_url.clone(),
                }
            }
            EditStep::RemoveFile { node_id, file_url } => {
                let node_id = resolve_node_ref(node_id, &self.created)?;
                self.api
                    .detach_file(&self.strategy_id, &node_id, file_url)
                    .await?;
                Action::RemoveFile {
                    node_id,
                    file_url: file_url.clone(),
                }
            }
            EditStep::Connect { source, target } => {
                let edge = self.connect_edge(source, target)?;
                let edge = self.api.create_edge(&self.strategy_id, &edge).await?;
                Action::AddEdge { edge }
            }
            EditStep::Disconnect { edge_id } => {
                let edge = self.lookup_edge(edge_id)?;
                self.api.delete_edge(&self.strategy_id, &edge.id).await?;
                Action::RemoveEdge { edge }
            }
        };

        self.model.apply(&action, true);
        Ok(self.history.record(action))
    }

    /// Build batch actions locally and hand them to the history.
    ///
    /// Steps may only reference nodes that exist before the batch starts.
    /// On success the planned actions are applied to the canvas; placeholder
    /// ids are then replaced through the re-creation events. Steps a failed
    /// batch already performed remotely are applied too, unrecorded.
    async fn apply_batch(&mut self, steps: &[EditStep]) -> AppResult<HistoryOutcome> {
        let mut actions = Vec::with_capacity(steps.len());
        for (index, step) in steps.iter().enumerate() {
            actions.push(self.plan(index, step)?);
        }
        let total = actions.len();

        let outcome = self.history.batch_apply(actions.clone()).await;
        match &outcome {
            HistoryOutcome::Applied => self.show(&actions),
            HistoryOutcome::Partial { applied, .. } => {
                warn!(
                    applied = applied.len(),
                    total,
                    "Batch stopped early; applied steps are on the canvas but not in history"
                );
                self.show(applied);
            }
            _ => {}
        }
        Ok(outcome)
    }

    /// Apply remotely performed actions to the local canvas.
    fn show(&mut self, actions: &[Action]) {
        for action in actions {
            if let Action::AddNode { node } = action {
                self.created.push(node.id.clone());
            }
            self.model.apply(action, true);
        }
    }

    /// Turn an edit step into an action without calling the API.
    fn plan(&self, index: usize, step: &EditStep) -> AppResult<Action> {
        let action = match step {
            EditStep::AddNode {
                tool_type,
                position,
            } => Action::AddNode {
                node: NodeRef::new(
                    format!("pending-{index}"),
                    tool_type.clone(),
                    self.strategy_id.clone(),
                    *position,
                ),
            },
            EditStep::DeleteNode { node_id } => Action::DeleteNode {
                node: self.lookup_node(node_id)?,
            },
            EditStep::MoveNode { node_id, to } => {
                let node = self.lookup_node(node_id)?;
                Action::MoveNode {
                    node_id: node.id,
                    from: node.position,
                    to: *to,
                }
            }
            EditStep::UploadFile { node_id, file_url } => Action::UploadFile {
                node_id: resolve_node_ref(node_id, &self.created)?,
                file_url: file_url.clone(),
            },
            EditStep::RemoveFile { node_id, file_url } => Action::RemoveFile {
                node_id: resolve_node_ref(node_id, &self.created)?,
                file_url: file_url.clone(),
            },
            EditStep::Connect { source, target } => Action::AddEdge {
                edge: self.connect_edge(source, target)?,
            },
            EditStep::Disconnect { edge_id } => Action::RemoveEdge {
                edge: self.lookup_edge(edge_id)?,
            },
        };
        action.validate()?;
        Ok(action)
    }

    fn lookup_node(&self, raw: &str) -> AppResult<NodeRef> {
        let id = resolve_node_ref(raw, &self.created)?;
        self.model
            .node(&id)
            .cloned()
            .ok_or_else(|| AppError::Session(format!("Unknown node {id}")))
    }

    fn lookup_edge(&self, id: &str) -> AppResult<EdgeRef> {
        self.model
            .edge(id)
            .cloned()
            .ok_or_else(|| AppError::Session(format!("Unknown edge {id}")))
    }

    fn connect_edge(&self, source: &str, target: &str) -> AppResult<EdgeRef> {
        let edge = EdgeRef::connect(
            resolve_node_ref(source, &self.created)?,
            resolve_node_ref(target, &self.created)?,
        );
        edge.validate()?;
        Ok(edge)
    }

    /// React to history notifications.
    fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                HistoryEvent::NodeRecreated {
                    previous_id,
                    current,
                } => {
                    self.model.remap_node(&previous_id, &current.id);
                    for id in self.created.iter_mut().filter(|id| **id == previous_id) {
                        *id = current.id.clone();
                    }
                    let changed = self.history.remap_node_id(&previous_id, &current.id);
                    debug!(%previous_id, current_id = %current.id, changed, "Remapped re-created node");
                }
                HistoryEvent::EdgeRecreated {
                    previous_id,
                    current,
                } => {
                    self.model.remap_edge(&previous_id, &current.id);
                    let changed = self.history.remap_edge_id(&previous_id, &current.id);
                    debug!(%previous_id, current_id = %current.id, changed, "Remapped re-created edge");
                }
                other => debug!(event = ?other, "History event"),
            }
        }
    }

    fn outcome_detail(outcome: &HistoryOutcome) -> Option<String> {
        match outcome {
            HistoryOutcome::RolledBack { reason } => Some(reason.clone()),
            HistoryOutcome::Partial { applied, reason } => Some(format!(
                "{} step(s) applied before failure: {reason}",
                applied.len()
            )),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradex_core::Position;

    fn node(id: &str) -> NodeRef {
        NodeRef::new(id, "indicator", StrategyId::new("s1"), Position::new(1.0, 2.0))
    }

    #[test]
    fn test_inverse_of_add_node_removes_touching_edges() {
        let mut model = CanvasModel::default();
        model.apply(&Action::AddNode { node: node("a") }, true);
        model.apply(&Action::AddNode { node: node("b") }, true);
        model.apply(
            &Action::AddEdge {
                edge: EdgeRef::new("e1", "a", "b"),
            },
            true,
        );
        assert_eq!(model.edge_count(), 1);

        model.apply(&Action::AddNode { node: node("a") }, false);
        assert!(model.node("a").is_none());
        assert_eq!(model.node_count(), 1);
        assert_eq!(model.edge_count(), 0);
    }

    #[test]
    fn test_delete_node_inverse_restores_node() {
        let mut model = CanvasModel::default();
        let action = Action::DeleteNode { node: node("a") };
        model.apply(&action, false);
        assert!(model.node("a").is_some());
        model.apply(&action, true);
        assert!(model.node("a").is_none());
    }

    #[test]
    fn test_move_and_files() {
        let mut model = CanvasModel::default();
        model.apply(&Action::AddNode { node: node("a") }, true);

        let mv = Action::MoveNode {
            node_id: "a".to_string(),
            from: Position::new(1.0, 2.0),
            to: Position::new(5.0, 6.0),
        };
        model.apply(&mv, true);
        assert_eq!(model.node("a").map(|n| n.position), Some(Position::new(5.0, 6.0)));
        model.apply(&mv, false);
        assert_eq!(model.node("a").map(|n| n.position), Some(Position::new(1.0, 2.0)));

        let upload = Action::UploadFile {
            node_id: "a".to_string(),
            file_url: "https://files/x.csv".to_string(),
        };
        model.apply(&upload, true);
        model.apply(&upload, true);
        assert_eq!(model.files("a"), ["https://files/x.csv".to_string()]);
        model.apply(&upload, false);
        assert!(model.files("a").is_empty());
    }

    #[test]
    fn test_remap_edge_renames_key_and_id() {
        let mut model = CanvasModel::default();
        model.apply(
            &Action::AddEdge {
                edge: EdgeRef::new("e1", "a", "b"),
            },
            true,
        );
        model.remap_edge("e1", "srv-e1");
        assert!(model.edge("e1").is_none());
        assert_eq!(model.edge("srv-e1").map(|e| e.id.as_str()), Some("srv-e1"));
    }

    #[test]
    fn test_remap_node_rewrites_edges_and_files() {
        let mut model = CanvasModel::default();
        model.apply(&Action::AddNode { node: node("a") }, true);
        model.apply(&Action::AddNode { node: node("b") }, true);
        model.apply(
            &Action::AddEdge {
                edge: EdgeRef::new("e1", "a", "b"),
            },
            true,
        );
        model.apply(
            &Action::UploadFile {
                node_id: "a".to_string(),
                file_url: "f".to_string(),
            },
            true,
        );

        model.remap_node("a", "a2");
        assert!(model.node("a").is_none());
        assert_eq!(model.node("a2").map(|n| n.id.as_str()), Some("a2"));
        assert_eq!(model.edge("e1").map(|e| e.source.as_str()), Some("a2"));
        assert_eq!(model.files("a2"), ["f".to_string()]);
    }
}
