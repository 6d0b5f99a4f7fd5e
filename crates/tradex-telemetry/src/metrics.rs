//! Prometheus metrics for the canvas edit history.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. A registration failure
//! means duplicate metric names, which is a programming error that should
//! surface on first use rather than be swallowed.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, register_int_gauge_vec, CounterVec,
    Encoder, HistogramVec, IntGaugeVec, TextEncoder,
};

use crate::error::{TelemetryError, TelemetryResult};

/// History operations by outcome.
/// Labels: op (record/undo/redo/batch), result (applied/nothing_to_do/busy/queued/rolled_back/partial)
pub static HISTORY_OPS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tradex_history_ops_total",
        "Total edit-history operations by outcome",
        &["op", "result"]
    )
    .unwrap()
});

/// Remote graph call latency in milliseconds.
pub static HISTORY_REMOTE_LATENCY_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "tradex_history_remote_latency_ms",
        "Latency of remote graph mutations issued by the edit history",
        &["op"],
        vec![5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 10000.0]
    )
    .unwrap()
});

/// Current stack depth.
/// Labels: stack (undo/redo)
pub static HISTORY_DEPTH: Lazy<IntGaugeVec> = Lazy::new(|| {
    register_int_gauge_vec!(
        "tradex_history_depth",
        "Number of entries on the undo and redo stacks",
        &["stack"]
    )
    .unwrap()
});

/// Metrics helper.
pub struct Metrics;

impl Metrics {
    /// Record the outcome of a history operation.
    pub fn history_op(op: &str, result: &str) {
        HISTORY_OPS_TOTAL.with_label_values(&[op, result]).inc();
    }

    /// Record latency of one remote graph call.
    pub fn remote_latency(op: &str, latency_ms: f64) {
        HISTORY_REMOTE_LATENCY_MS
            .with_label_values(&[op])
            .observe(latency_ms);
    }

    /// Publish current stack depths.
    pub fn history_depth(undo: usize, redo: usize) {
        HISTORY_DEPTH
            .with_label_values(&["undo"])
            .set(undo as i64);
        HISTORY_DEPTH
            .with_label_values(&["redo"])
            .set(redo as i64);
    }

    /// Render all registered metrics in the Prometheus text format.
    pub fn gather_text() -> TelemetryResult<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&prometheus::gather(), &mut buffer)
            .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::Metrics(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_op_counter_increments() {
        let before = HISTORY_OPS_TOTAL
            .with_label_values(&["undo", "applied"])
            .get();
        Metrics::history_op("undo", "applied");
        let after = HISTORY_OPS_TOTAL
            .with_label_values(&["undo", "applied"])
            .get();
        assert!(after >= before + 1.0);
    }

    #[test]
    fn test_gather_text_contains_history_metrics() {
        Metrics::history_depth(3, 1);
        Metrics::remote_latency("create_node", 12.0);
        let text = Metrics::gather_text().unwrap();
        assert!(text.contains("tradex_history_depth"));
        assert!(text.contains("tradex_history_remote_latency_ms"));
    }
}
