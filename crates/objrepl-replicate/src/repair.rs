//! Repair queue contract: the durable, best-effort sink the coordinator
//! pushes reconciliation work to whenever a replica fails.
//!
//! The queue itself — ordering, deduplication, retry policy — is an
//! external collaborator's responsibility (see the crate root docs). This
//! module only defines the contract the coordinator depends on and a
//! scriptable in-memory implementation for tests.

use std::sync::Arc;

use async_trait::async_trait;
use objrepl_types::PartitionId;
use tokio::sync::Mutex;
use tracing::debug;

/// The kind of reconciliation a repair entry requests.
///
/// Any other kind (this crate recognizes only these two) is a silent
/// no-op at the queue, per the repair enqueuer's contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepairKind {
    /// A replicated `Put` did not reach one or more replicas.
    ErrReplicate,
    /// A replicated `Delete` did not reach one or more replicas.
    ErrDelete,
}

impl From<objrepl_types::Method> for RepairKind {
    fn from(method: objrepl_types::Method) -> Self {
        match method {
            objrepl_types::Method::Put => Self::ErrReplicate,
            objrepl_types::Method::Delete => Self::ErrDelete,
        }
    }
}

/// A single durable repair entry as seen by the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairEntry {
    /// What kind of reconciliation is needed.
    pub kind: RepairKind,
    /// The object's partition (placement group).
    pub partition: PartitionId,
    /// The object's key.
    pub key: bytes::Bytes,
}

/// Durable queue used to schedule asynchronous reconciliation for replicas
/// that did not acknowledge a write.
///
/// Enqueue is fire-and-forget from the coordinator's perspective:
/// implementations must not propagate failures back to the coordinator.
/// Any failure to durably enqueue is the queue implementation's concern to
/// log and retry internally.
#[async_trait]
pub trait RepairQueue: Send + Sync {
    /// Schedules a reconciliation entry. Always best-effort; the
    /// coordinator does not observe whether this ultimately lands
    /// durably.
    async fn enqueue(&self, entry: RepairEntry);
}

/// In-memory [`RepairQueue`] that records every enqueue, for test
/// assertions.
#[derive(Debug, Default)]
pub struct InMemoryRepairQueue {
    entries: Mutex<Vec<RepairEntry>>,
}

impl InMemoryRepairQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Returns a snapshot of every entry enqueued so far, in enqueue order.
    pub async fn entries(&self) -> Vec<RepairEntry> {
        self.entries.lock().await.clone()
    }

    /// Returns the number of entries enqueued so far.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Returns `true` if no entries have been enqueued.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl RepairQueue for InMemoryRepairQueue {
    async fn enqueue(&self, entry: RepairEntry) {
        debug!(
            kind = ?entry.kind,
            partition = entry.partition,
            "recorded repair entry in in-memory queue"
        );
        self.entries.lock().await.push(entry);
    }
}
