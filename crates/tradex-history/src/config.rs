//! History configuration.

use serde::{Deserialize, Serialize};

use crate::error::{HistoryError, HistoryResult};

/// Upper bound accepted for `max_depth`.
pub const MAX_DEPTH_LIMIT: usize = 10_000;

/// Configuration for [`crate::ActionHistory`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum undo entries kept; the oldest are dropped first.
    /// 0 = unbounded. Default: 100.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_max_depth() -> usize {
    100
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

impl HistoryConfig {
    /// Unbounded history.
    pub fn unbounded() -> Self {
        Self { max_depth: 0 }
    }

    pub fn validate(&self) -> HistoryResult<()> {
        if self.max_depth > MAX_DEPTH_LIMIT {
            return Err(HistoryError::InvalidConfig(format!(
                "max_depth {} exceeds limit {MAX_DEPTH_LIMIT}",
                self.max_depth
            )));
        }
        Ok(())
    }
}
