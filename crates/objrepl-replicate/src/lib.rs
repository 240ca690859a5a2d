//! # Object Replication Coordinator
//!
//! This crate implements the per-request replication coordinator of a
//! distributed object-storage node: the subsystem that durably writes (or
//! deletes) a single object on a fixed set of storage replicas and decides,
//! under a write-quorum policy and a deadline, whether the caller's request
//! succeeded, failed, or must be repaired asynchronously.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                         Replicator (facade)                     │
//! ├────────────────────────────────────────────────────────────────┤
//! │                                                                  │
//! │   caller ──► replicate() ──► Coordinator ──► on_complete()       │
//! │                                  │  ▲                            │
//! │                     inbox ◄──────┘  └── reply (once)             │
//! │                        ▲                                        │
//! │        ┌───────────────┼───────────────┐                        │
//! │        │               │               │                        │
//! │   local endpoint   remote endpoint  unreachable                  │
//! │   (ObjectStore)    (RemoteTransport)  (synthesized Fail)          │
//! │                                                                  │
//! │   every Outcome::Fail also enqueues a RepairEntry ──► RepairQueue │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Core Components
//!
//! - [`facade::Replicator`] — the synchronous entry point; builds a fresh
//!   coordinator per call and awaits its single reply.
//! - [`coordinator`] — the request-scoped state machine: quorum and
//!   deadline rules, the reply latch, and repair-coverage draining.
//! - [`endpoint`] — the local and remote per-target tasks that actually
//!   carry out a write and post exactly one outcome to the coordinator's
//!   inbox.
//! - [`store`] / [`transport`] / [`repair`] — the contracts for this
//!   crate's three external collaborators (local object store, remote RPC
//!   transport, durable repair queue), each with a scriptable in-memory
//!   implementation for tests.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use bytes::Bytes;
//! use objrepl_replicate::config::ReplicatorConfig;
//! use objrepl_replicate::facade::Replicator;
//! use objrepl_replicate::repair::InMemoryRepairQueue;
//! use objrepl_replicate::store::ScriptedStore;
//! use objrepl_replicate::transport::ScriptedTransport;
//! use objrepl_types::{Method, ReplicaTarget, ReplicateObject};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let replicator = Replicator::new(
//!     1,
//!     ReplicatorConfig::default(),
//!     Arc::new(ScriptedStore::ok(Bytes::from_static(b"checksum"))),
//!     ScriptedTransport::new(),
//!     InMemoryRepairQueue::new(),
//! );
//!
//! let targets = vec![ReplicaTarget::reachable(1), ReplicaTarget::reachable(2)];
//! let object = ReplicateObject {
//!     partition: 7,
//!     key: Bytes::from_static(b"object-key"),
//!     req_id: 1,
//!     payload: Bytes::from_static(b"payload"),
//! };
//!
//! replicator
//!     .replicate(Method::Put, 2, targets, object, |outcome| {
//!         println!("{outcome:?}");
//!     })
//!     .await;
//! # }
//! ```

pub mod config;
pub mod coordinator;
pub mod endpoint;
pub mod error;
pub mod facade;
pub mod inbox;
pub mod metrics;
pub mod repair;
pub mod store;
pub mod transport;

pub use config::ReplicatorConfig;
pub use coordinator::ReplicateOutcome;
pub use error::{ReplicatorError, ReplicatorResult};
pub use facade::Replicator;
pub use metrics::{MetricsSnapshot, ReplicatorMetrics};
