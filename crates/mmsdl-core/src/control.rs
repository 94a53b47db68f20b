//! Cooperative cancellation for segment workers and the writer loop.
//!
//! A download holds two tokens: an internal one shared with its workers
//! (tripped on timeout or on the first fatal worker error) and an optional
//! caller-owned one (e.g. set from a Ctrl-C handler) that the writer polls.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
