//! Construction-time and developer-misuse error types.
//!
//! Per-replica failures are not modeled here: they travel as
//! [`objrepl_types::Outcome::Fail`] into the coordinator and, from there,
//! into [`crate::coordinator::ReplicateOutcome`], which is delivered to the
//! caller's completion callback rather than returned as a Rust `Result`.
//! This enum only covers failures that prevent a replication request from
//! ever starting.

use thiserror::Error;

/// Result type for fallible coordinator/config construction.
pub type ReplicatorResult<T> = Result<T, ReplicatorError>;

/// Errors that can occur while configuring or constructing the replicator,
/// as opposed to errors produced by a replication attempt itself.
#[derive(Error, Debug)]
pub enum ReplicatorError {
    /// The supplied [`crate::config::ReplicatorConfig`] is not usable.
    #[error("invalid replicator configuration: {0}")]
    Config(String),
}
