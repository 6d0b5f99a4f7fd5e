//! Operation outcomes.

use tradex_core::Action;

/// Result of a history operation.
///
/// Remote failures are reported here (and as [`crate::HistoryEvent`]s),
/// never as errors or panics.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryOutcome {
    /// Bookkeeping done and, where applicable, the remote call succeeded.
    Applied,
    /// Nothing to undo/redo, or an empty batch.
    NothingToDo,
    /// Another undo/redo/batch is in flight; nothing was changed.
    Busy,
    /// `record` arrived while an operation was in flight; it is applied
    /// once that operation settles.
    Queued,
    /// The remote call failed and the optimistic stack move was reverted.
    RolledBack { reason: String },
    /// A batch stopped at its first failure. The `applied` steps, carrying
    /// any server-assigned identity, were performed remotely and are not
    /// rolled back; nothing was recorded.
    Partial { applied: Vec<Action>, reason: String },
}

impl HistoryOutcome {
    /// Check if a remote call failed.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::RolledBack { .. } | Self::Partial { .. })
    }

    /// Metrics label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::NothingToDo => "nothing_to_do",
            Self::Busy => "busy",
            Self::Queued => "queued",
            Self::RolledBack { .. } => "rolled_back",
            Self::Partial { .. } => "partial",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_properties() {
        assert!(!HistoryOutcome::Applied.is_failure());
        assert!(!HistoryOutcome::NothingToDo.is_failure());

        let partial = HistoryOutcome::Partial {
            applied: Vec::new(),
            reason: "boom".to_string(),
        };
        assert!(partial.is_failure());
        assert_eq!(partial.label(), "partial");
    }
}
