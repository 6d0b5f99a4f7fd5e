//! Undo/redo stack pair.
//!
//! Pure bookkeeping, no remote calls. Entries move between the stacks as
//! whole values and are identified by a sequence number, so an optimistic
//! move can be reverted exactly.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use tradex_core::Action;

/// One recorded edit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    /// Monotonic sequence number, unique within the stack.
    pub seq: u64,
    pub action: Action,
    pub recorded_at: DateTime<Utc>,
}

/// Linear undo/redo timeline.
///
/// Invariants:
/// - an entry is on at most one stack
/// - recording clears the redo stack
/// - the undo stack never exceeds `max_depth` (0 = unbounded)
#[derive(Debug, Default)]
pub struct HistoryStack {
    /// Applied edits, most recent last.
    undo: VecDeque<HistoryEntry>,
    /// Undone edits, most recent last.
    redo: Vec<HistoryEntry>,
    next_seq: u64,
    max_depth: usize,
}

impl HistoryStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            ..Self::default()
        }
    }

    /// Append an applied edit and invalidate redo.
    pub fn record(&mut self, action: Action) -> u64 {
        let seq = self.push_undo(action);
        self.redo.clear();
        self.trim();
        seq
    }

    /// Append several applied edits in order and invalidate redo.
    pub fn extend(&mut self, actions: impl IntoIterator<Item = Action>) {
        for action in actions {
            self.push_undo(action);
        }
        self.redo.clear();
        self.trim();
    }

    /// Move the most recent undo entry to the redo stack.
    ///
    /// Returns a copy of the moved entry.
    pub fn begin_undo(&mut self) -> Option<HistoryEntry> {
        let entry = self.undo.pop_back()?;
        self.redo.push(entry.clone());
        Some(entry)
    }

    /// Revert [`Self::begin_undo`] for entry `seq`.
    pub fn rollback_undo(&mut self, seq: u64) -> bool {
        match self.redo.last() {
            Some(top) if top.seq == seq => {
                if let Some(entry) = self.redo.pop() {
                    self.undo.push_back(entry);
                }
                true
            }
            _ => false,
        }
    }

    /// Move the most recent redo entry back to the undo stack.
    pub fn begin_redo(&mut self) -> Option<HistoryEntry> {
        let entry = self.redo.pop()?;
        self.undo.push_back(entry.clone());
        Some(entry)
    }

    /// Revert [`Self::begin_redo`] for entry `seq`.
    pub fn rollback_redo(&mut self, seq: u64) -> bool {
        match self.undo.back() {
            Some(top) if top.seq == seq => {
                if let Some(entry) = self.undo.pop_back() {
                    self.redo.push(entry);
                }
                true
            }
            _ => false,
        }
    }

    /// Apply `f` to the action of entry `seq`, wherever it lives.
    pub fn update<R>(&mut self, seq: u64, f: impl FnOnce(&mut Action) -> R) -> Option<R> {
        self.undo
            .iter_mut()
            .chain(self.redo.iter_mut())
            .find(|entry| entry.seq == seq)
            .map(|entry| f(&mut entry.action))
    }

    /// Rewrite node `old` as `new` in every entry. Returns the number of
    /// entries changed.
    pub fn remap_node_id(&mut self, old: &str, new: &str) -> usize {
        self.undo
            .iter_mut()
            .chain(self.redo.iter_mut())
            .filter_map(|entry| entry.action.remap_node_id(old, new).then_some(()))
            .count()
    }

    /// Rewrite edge `old` as `new` in every entry. Returns the number of
    /// entries changed.
    pub fn remap_edge_id(&mut self, old: &str, new: &str) -> usize {
        self.undo
            .iter_mut()
            .chain(self.redo.iter_mut())
            .filter_map(|entry| entry.action.remap_edge_id(old, new).then_some(()))
            .count()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn peek_undo(&self) -> Option<&HistoryEntry> {
        self.undo.back()
    }

    pub fn peek_redo(&self) -> Option<&HistoryEntry> {
        self.redo.last()
    }

    /// Undo entries, oldest first.
    pub fn undo_entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.undo.iter()
    }

    /// Redo entries, oldest first.
    pub fn redo_entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.redo.iter()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    fn push_undo(&mut self, action: Action) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.undo.push_back(HistoryEntry {
            seq,
            action,
            recorded_at: Utc::now(),
        });
        seq
    }

    fn trim(&mut self) {
        if self.max_depth == 0 {
            return;
        }
        while self.undo.len() > self.max_depth {
            if let Some(dropped) = self.undo.pop_front() {
                debug!(seq = dropped.seq, kind = %dropped.action.kind(), "Dropped oldest history entry");
            }
        }
    }
}
