//! Process-wide replication counters.
//!
//! Plain atomics rather than a histogram/timer library: the coordinator's
//! own latency is dominated by network round-trips a metrics crate can't
//! observe any better than a timestamp diff the caller can already take.
//! Exposed as a snapshot struct so a caller can wire it into whatever
//! metrics exporter the surrounding node uses.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared, cheaply cloneable (via reference, not value) counters for every
/// replication request that passes through this process.
#[derive(Default)]
pub struct ReplicatorMetrics {
    requests_started: AtomicU64,
    requests_succeeded: AtomicU64,
    requests_failed: AtomicU64,
    requests_timed_out: AtomicU64,
    repair_entries_enqueued: AtomicU64,
}

impl fmt::Debug for ReplicatorMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplicatorMetrics")
            .field("requests_started", &self.requests_started.load(Ordering::Relaxed))
            .field("requests_succeeded", &self.requests_succeeded.load(Ordering::Relaxed))
            .field("requests_failed", &self.requests_failed.load(Ordering::Relaxed))
            .field("requests_timed_out", &self.requests_timed_out.load(Ordering::Relaxed))
            .field(
                "repair_entries_enqueued",
                &self.repair_entries_enqueued.load(Ordering::Relaxed),
            )
            .finish()
    }
}

/// A point-in-time read of [`ReplicatorMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    /// Total replication requests accepted by the facade.
    pub requests_started: u64,
    /// Requests that reached write quorum.
    pub requests_succeeded: u64,
    /// Requests that failed quorum before the deadline.
    pub requests_failed: u64,
    /// Requests whose deadline elapsed before quorum was decided.
    pub requests_timed_out: u64,
    /// Repair-queue entries enqueued across every request.
    pub repair_entries_enqueued: u64,
}

impl ReplicatorMetrics {
    /// Creates a zeroed counter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that a request was accepted by the facade.
    pub fn record_started(&self) {
        self.requests_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Records that a request reached write quorum.
    pub fn record_succeeded(&self) {
        self.requests_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    /// Records that a request failed quorum before its deadline.
    pub fn record_failed(&self) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Records that a request's deadline elapsed before quorum was decided.
    pub fn record_timed_out(&self) {
        self.requests_timed_out.fetch_add(1, Ordering::Relaxed);
    }

    /// Records that a repair entry was enqueued.
    pub fn record_repair_enqueued(&self) {
        self.repair_entries_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    /// Takes a consistent-enough snapshot of all counters.
    ///
    /// Each field is read independently, so a snapshot taken concurrently
    /// with in-flight requests may not reflect a single atomic instant;
    /// this mirrors how the counters are consumed by periodic exporters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_started: self.requests_started.load(Ordering::Relaxed),
            requests_succeeded: self.requests_succeeded.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
            requests_timed_out: self.requests_timed_out.load(Ordering::Relaxed),
            repair_entries_enqueued: self.repair_entries_enqueued.load(Ordering::Relaxed),
        }
    }
}
