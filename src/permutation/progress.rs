//! Progress reporting and cooperative cancellation for permutation runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;

/// Receives a notification after every finished permutation
///
/// Called from worker threads; `completed` counts finished permutations
/// in completion order, not permutation index.
pub trait ProgressSink: Send + Sync {
    fn on_permutation(&self, completed: usize, total: usize);
}

/// Ignores all progress
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_permutation(&self, _completed: usize, _total: usize) {}
}

/// Logs progress through `tracing` in steps of roughly ten percent
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn on_permutation(&self, completed: usize, total: usize) {
        let step = (total / 10).max(1);
        if completed % step == 0 || completed == total {
            info!(completed, total, "permutations done");
        }
    }
}

/// Shared flag asking a running permutation loop to stop early
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; permutations already running finish first
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
