//! Async action history bound to one strategy canvas.
//!
//! Undo and redo move the entry between stacks *before* issuing the remote
//! call so the editor can update immediately; if the call fails the move is
//! reverted by sequence number. Only one undo/redo/batch may be in flight at
//! a time; `record` calls that arrive meanwhile are queued and applied, in
//! order, once the in-flight operation settles.

use std::time::Instant;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use tradex_core::{Action, GraphOp, StrategyId};
use tradex_graph::{execute, DynGraphMutation, GraphResult, OpEffect};
use tradex_telemetry::Metrics;

use crate::config::HistoryConfig;
use crate::event::HistoryEvent;
use crate::guard::{BusyFlag, BusyGuard};
use crate::outcome::HistoryOutcome;
use crate::stack::{HistoryEntry, HistoryStack};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Undo,
    Redo,
}

impl Direction {
    fn name(self) -> &'static str {
        match self {
            Self::Undo => "undo",
            Self::Redo => "redo",
        }
    }
}

/// Undo/redo log for one open strategy canvas.
pub struct ActionHistory {
    /// Strategy the canvas belongs to; scopes edge, move, and file calls.
    strategy_id: StrategyId,
    /// Remote graph API.
    api: DynGraphMutation,
    stack: Mutex<HistoryStack>,
    /// Records received while an operation was in flight.
    pending: Mutex<Vec<Action>>,
    busy: BusyFlag,
    events: Option<mpsc::UnboundedSender<HistoryEvent>>,
}

impl ActionHistory {
    /// Create an empty history for `strategy_id`.
    pub fn new(strategy_id: StrategyId, api: DynGraphMutation, config: &HistoryConfig) -> Self {
        Self {
            strategy_id,
            api,
            stack: Mutex::new(HistoryStack::new(config.max_depth)),
            pending: Mutex::new(Vec::new()),
            busy: BusyFlag::new(),
            events: None,
        }
    }

    /// Send failure and identity-change notifications to `tx`.
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<HistoryEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn strategy_id(&self) -> &StrategyId {
        &self.strategy_id
    }

    /// Record an edit the caller has already applied.
    ///
    /// Clears the redo stack. While an undo/redo/batch is in flight the
    /// record is queued and `Queued` is returned.
    pub fn record(&self, action: Action) -> HistoryOutcome {
        let mut pending = self.pending.lock();
        if self.busy.is_busy() {
            debug!(kind = %action.kind(), "History busy, queueing record");
            pending.push(action);
            Metrics::history_op("record", "queued");
            return HistoryOutcome::Queued;
        }

        let mut stack = self.stack.lock();
        Self::flush(&mut pending, &mut stack);
        let kind = action.kind();
        let seq = stack.record(action);
        debug!(seq, %kind, undo = stack.undo_len(), "Recorded action");
        Metrics::history_op("record", "applied");
        Metrics::history_depth(stack.undo_len(), stack.redo_len());
        HistoryOutcome::Applied
    }

    /// Revert the most recent edit.
    pub async fn undo(&self) -> HistoryOutcome {
        self.step(Direction::Undo).await
    }

    /// Re-apply the most recently undone edit.
    pub async fn redo(&self) -> HistoryOutcome {
        self.step(Direction::Redo).await
    }

    /// Apply `actions` remotely, in order, as one unit.
    ///
    /// Each action's forward mutation is awaited before the next is issued.
    /// The first failure abandons the batch: earlier steps stay applied
    /// remotely, are returned in `Partial`, and nothing is recorded. On success every action, carrying
    /// any server-assigned identity, is appended to the undo stack.
    pub async fn batch_apply(&self, actions: Vec<Action>) -> HistoryOutcome {
        let Some(guard) = self.busy.try_acquire() else {
            warn!("Batch rejected, another history operation is in flight");
            Metrics::history_op("batch", "busy");
            return HistoryOutcome::Busy;
        };

        if actions.is_empty() {
            return self.finish(guard, "batch", HistoryOutcome::NothingToDo);
        }

        let total = actions.len();
        let mut applied = Vec::with_capacity(total);
        for (index, mut action) in actions.into_iter().enumerate() {
            let op = action.forward(&self.strategy_id);
            match self.perform(&op).await {
                Ok(effect) => {
                    self.apply_effect_to(&mut action, effect);
                    applied.push(action);
                }
                Err(e) => {
                    let reason = e.to_string();
                    warn!(
                        step = index,
                        total,
                        op = op.name(),
                        retryable = e.is_retryable(),
                        error = %reason,
                        "Batch aborted, earlier steps remain applied"
                    );
                    self.emit(HistoryEvent::BatchAborted {
                        applied: index,
                        total,
                        reason: reason.clone(),
                    });
                    let outcome = HistoryOutcome::Partial { applied, reason };
                    return self.finish(guard, "batch", outcome);
                }
            }
        }

        self.stack.lock().extend(applied);
        info!(total, "Batch applied");
        self.finish(guard, "batch", HistoryOutcome::Applied)
    }

    pub fn can_undo(&self) -> bool {
        self.stack.lock().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.stack.lock().can_redo()
    }

    pub fn undo_len(&self) -> usize {
        self.stack.lock().undo_len()
    }

    pub fn redo_len(&self) -> usize {
        self.stack.lock().redo_len()
    }

    /// Copy of the entry `undo` would revert next.
    pub fn peek_undo(&self) -> Option<HistoryEntry> {
        self.stack.lock().peek_undo().cloned()
    }

    /// Copy of the entry `redo` would re-apply next.
    pub fn peek_redo(&self) -> Option<HistoryEntry> {
        self.stack.lock().peek_redo().cloned()
    }

    /// Copy of the undo stack, oldest first.
    pub fn undo_entries(&self) -> Vec<HistoryEntry> {
        self.stack.lock().undo_entries().cloned().collect()
    }

    /// Copy of the redo stack, oldest first.
    pub fn redo_entries(&self) -> Vec<HistoryEntry> {
        self.stack.lock().redo_entries().cloned().collect()
    }

    /// Rewrite references to node `old` as `new` in every stored entry.
    pub fn remap_node_id(&self, old: &str, new: &str) -> usize {
        let changed = self.stack.lock().remap_node_id(old, new);
        debug!(old, new, changed, "Remapped node id in history");
        changed
    }

    /// Rewrite references to edge `old` as `new` in every stored entry.
    pub fn remap_edge_id(&self, old: &str, new: &str) -> usize {
        let changed = self.stack.lock().remap_edge_id(old, new);
        debug!(old, new, changed, "Remapped edge id in history");
        changed
    }

    /// Drop both stacks and any queued records.
    pub fn clear(&self) {
        let mut pending = self.pending.lock();
        pending.clear();
        self.stack.lock().clear();
        Metrics::history_depth(0, 0);
    }

    async fn step(&self, direction: Direction) -> HistoryOutcome {
        let name = direction.name();
        let Some(guard) = self.busy.try_acquire() else {
            warn!(op = name, "Rejected, another history operation is in flight");
            Metrics::history_op(name, "busy");
            return HistoryOutcome::Busy;
        };

        let entry = {
            let mut pending = self.pending.lock();
            let mut stack = self.stack.lock();
            Self::flush(&mut pending, &mut stack);
            match direction {
                Direction::Undo => stack.begin_undo(),
                Direction::Redo => stack.begin_redo(),
            }
        };
        let Some(entry) = entry else {
            debug!(op = name, "Nothing to do");
            return self.finish(guard, name, HistoryOutcome::NothingToDo);
        };

        let kind = entry.action.kind();
        let op = match direction {
            Direction::Undo => entry.action.inverse(&self.strategy_id),
            Direction::Redo => entry.action.forward(&self.strategy_id),
        };

        let outcome = match self.perform(&op).await {
            Ok(effect) => {
                self.apply_effect(entry.seq, effect);
                info!(op = name, seq = entry.seq, %kind, remote = op.name(), "History step applied");
                HistoryOutcome::Applied
            }
            Err(e) => {
                let reason = e.to_string();
                let restored = {
                    let mut stack = self.stack.lock();
                    match direction {
                        Direction::Undo => stack.rollback_undo(entry.seq),
                        Direction::Redo => stack.rollback_redo(entry.seq),
                    }
                };
                warn!(
                    op = name,
                    seq = entry.seq,
                    %kind,
                    remote = op.name(),
                    restored,
                    retryable = e.is_retryable(),
                    error = %reason,
                    "Remote call failed, history step rolled back"
                );
                self.emit(match direction {
                    Direction::Undo => HistoryEvent::UndoFailed {
                        kind,
                        reason: reason.clone(),
                    },
                    Direction::Redo => HistoryEvent::RedoFailed {
                        kind,
                        reason: reason.clone(),
                    },
                });
                HistoryOutcome::RolledBack { reason }
            }
        };

        self.finish(guard, name, outcome)
    }

    /// Issue one remote call and record its latency.
    async fn perform(&self, op: &GraphOp) -> GraphResult<OpEffect> {
        let started = Instant::now();
        let result = execute(self.api.as_ref(), op).await;
        Metrics::remote_latency(op.name(), started.elapsed().as_secs_f64() * 1000.0);
        result
    }

    /// Store a server-assigned identity on entry `seq`.
    fn apply_effect(&self, seq: u64, effect: OpEffect) {
        let recreated = self
            .stack
            .lock()
            .update(seq, |action| Self::absorb(action, effect))
            .flatten();
        if let Some(event) = recreated {
            self.emit(event);
        }
    }

    fn apply_effect_to(&self, action: &mut Action, effect: OpEffect) {
        if let Some(event) = Self::absorb(action, effect) {
            self.emit(event);
        }
    }

    /// Replace the node/edge stored in `action` with the created one.
    ///
    /// Returns a `NodeRecreated`/`EdgeRecreated` event when the id changed.
    fn absorb(action: &mut Action, effect: OpEffect) -> Option<HistoryEvent> {
        match effect {
            OpEffect::NodeCreated(node) => {
                let current = node.clone();
                let previous = action.replace_node(node)?;
                (previous.id != current.id).then(|| {
                    info!(previous_id = %previous.id, current_id = %current.id, "Node re-created under new id");
                    HistoryEvent::NodeRecreated {
                        previous_id: previous.id,
                        current,
                    }
                })
            }
            OpEffect::EdgeCreated(edge) => {
                let current = edge.clone();
                let previous = action.replace_edge(edge)?;
                (previous.id != current.id).then(|| {
                    info!(previous_id = %previous.id, current_id = %current.id, "Edge re-created under new id");
                    HistoryEvent::EdgeRecreated {
                        previous_id: previous.id,
                        current,
                    }
                })
            }
            OpEffect::Done => None,
        }
    }

    /// Apply queued records, release the slot, and publish metrics.
    fn finish(&self, guard: BusyGuard<'_>, op: &str, outcome: HistoryOutcome) -> HistoryOutcome {
        let mut pending = self.pending.lock();
        let (undo, redo) = {
            let mut stack = self.stack.lock();
            Self::flush(&mut pending, &mut stack);
            (stack.undo_len(), stack.redo_len())
        };
        drop(guard);
        drop(pending);

        Metrics::history_op(op, outcome.label());
        Metrics::history_depth(undo, redo);
        outcome
    }

    fn flush(pending: &mut Vec<Action>, stack: &mut HistoryStack) {
        if pending.is_empty() {
            return;
        }
        debug!(count = pending.len(), "Applying queued records");
        for action in pending.drain(..) {
            stack.record(action);
        }
    }

    fn emit(&self, event: HistoryEvent) {
        if let Some(tx) = &self.events {
            // Receiver may be gone; events are best-effort.
            let _ = tx.send(event);
        }
    }
}
