// Metrics hooks for the matching layer.
//
// Callers install a global `MatchMetrics` implementation via
// [`set_match_metrics`]; `PieceMatcher` then reports per-request latency and
// outcome for each `match_piece` call. This keeps instrumentation decoupled
// from any specific metrics backend.
use std::sync::{Arc, RwLock};
use std::time::Duration;

use once_cell::sync::OnceCell;

/// Metrics observer for match operations.
pub trait MatchMetrics: Send + Sync {
    /// Record the outcome of one match request.
    ///
    /// `puzzle_id` is the puzzle the piece was matched against, `latency` the
    /// wall-clock duration of the whole request including descriptor
    /// extraction, and `best_confidence` the confidence of the surfaced best
    /// match, if any.
    fn record_match(&self, puzzle_id: &str, latency: Duration, best_confidence: Option<f32>);
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn MatchMetrics>>> {
    static METRICS: OnceCell<RwLock<Option<Arc<dyn MatchMetrics>>>> = OnceCell::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

pub(crate) fn metrics_recorder() -> Option<Arc<dyn MatchMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

/// Install or clear the global match metrics recorder.
///
/// Typically called once during service startup so all `PieceMatcher`
/// instances share the same metrics backend.
pub fn set_match_metrics(recorder: Option<Arc<dyn MatchMetrics>>) {
    let lock = metrics_lock();
    let mut guard = lock
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}
