//! Cooperative cancellation for long-running iteration workers.
//!
//! A single shared boolean, polled at every loop head and chunked into
//! one-second sleep slices, bounds cancellation latency to about a second
//! without needing a full cancellation-token plumbed through every sleep
//! and database call.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// A cheaply-cloneable flag that every iteration worker polls to learn
/// whether the [`Migrator`](https://docs.rs/migrator-worker) has asked it to
/// stop.
#[derive(Clone, Default)]
pub struct ShutdownSignal {
    terminated: Arc<AtomicBool>,
}

impl ShutdownSignal {
    /// Create a new, untriggered signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag. Idempotent; does not close any connections itself.
    pub fn trigger(&self) {
        self.terminated.store(true, Ordering::SeqCst);
    }

    /// Whether [`trigger`](Self::trigger) has been called.
    pub fn is_triggered(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    /// Sleep for `duration`, checking the signal every second so a
    /// `trigger()` call from another task is observed within ~1s.
    ///
    /// Returns `true` if the full duration elapsed, `false` if interrupted
    /// by termination partway through.
    pub async fn sleep_interruptible(&self, duration: Duration) -> bool {
        let mut remaining = duration;
        while remaining > Duration::ZERO {
            if self.is_triggered() {
                return false;
            }
            let chunk = remaining.min(POLL_INTERVAL);
            tokio::time::sleep(chunk).await;
            remaining = remaining.saturating_sub(chunk);
        }
        !self.is_triggered()
    }
}
