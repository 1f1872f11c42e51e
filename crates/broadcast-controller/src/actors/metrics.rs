//! Mailbox monitoring for the controller actor.
//!
//! Depth thresholds: < 100 normal, 100-500 elevated, > 500 critical.
//! Prometheus counters and gauges carry the `bc_` prefix and are emitted at
//! the call sites that change state; this module tracks the mailbox itself.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tracing::{debug, warn};

/// Mailbox depth below this is normal.
pub const MAILBOX_NORMAL: usize = 100;
/// Mailbox depth above this is critical.
pub const MAILBOX_WARNING: usize = 500;

/// Tracks queue depth and throughput for one actor mailbox.
#[derive(Debug)]
pub struct MailboxMonitor {
    /// Actor identifier for log correlation.
    actor_id: String,
    /// Current mailbox depth.
    depth: AtomicUsize,
    /// Peak mailbox depth observed.
    peak_depth: AtomicUsize,
    /// Total messages processed.
    messages_processed: AtomicU64,
}

impl MailboxMonitor {
    /// Create a monitor for the given actor.
    #[must_use]
    pub fn new(actor_id: impl Into<String>) -> Self {
        Self {
            actor_id: actor_id.into(),
            depth: AtomicUsize::new(0),
            peak_depth: AtomicUsize::new(0),
            messages_processed: AtomicU64::new(0),
        }
    }

    /// Record a message entering the mailbox.
    pub fn record_enqueue(&self) {
        let new_depth = self.depth.fetch_add(1, Ordering::Relaxed) + 1;

        let mut current_peak = self.peak_depth.load(Ordering::Relaxed);
        while new_depth > current_peak {
            match self.peak_depth.compare_exchange_weak(
                current_peak,
                new_depth,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => current_peak = actual,
            }
        }

        if new_depth > MAILBOX_WARNING {
            warn!(
                target: "bc.actor.mailbox",
                actor_id = %self.actor_id,
                depth = new_depth,
                "Mailbox depth critical"
            );
        } else if new_depth == MAILBOX_NORMAL {
            // Log once when crossing the elevated threshold.
            debug!(
                target: "bc.actor.mailbox",
                actor_id = %self.actor_id,
                depth = new_depth,
                "Mailbox depth elevated"
            );
        }
    }

    /// Record a message leaving the mailbox (processed).
    pub fn record_dequeue(&self) {
        self.depth.fetch_sub(1, Ordering::Relaxed);
        self.messages_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Current mailbox depth.
    #[must_use]
    pub fn current_depth(&self) -> usize {
        self.depth.load(Ordering::Relaxed)
    }

    /// Peak mailbox depth observed.
    #[must_use]
    pub fn peak_depth(&self) -> usize {
        self.peak_depth.load(Ordering::Relaxed)
    }

    /// Total messages processed.
    #[must_use]
    pub fn messages_processed(&self) -> u64 {
        self.messages_processed.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_enqueue_dequeue_tracks_depth() {
        let monitor = MailboxMonitor::new("bc-test");
        monitor.record_enqueue();
        monitor.record_enqueue();
        assert_eq!(monitor.current_depth(), 2);

        monitor.record_dequeue();
        assert_eq!(monitor.current_depth(), 1);
        assert_eq!(monitor.messages_processed(), 1);
    }

    #[test]
    fn test_peak_depth_is_retained() {
        let monitor = MailboxMonitor::new("bc-test");
        for _ in 0..5 {
            monitor.record_enqueue();
        }
        for _ in 0..5 {
            monitor.record_dequeue();
        }
        assert_eq!(monitor.current_depth(), 0);
        assert_eq!(monitor.peak_depth(), 5);
        assert_eq!(monitor.messages_processed(), 5);
    }
}
