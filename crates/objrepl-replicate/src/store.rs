//! Local object store contract: the collaborator that actually persists
//! bytes for the node the coordinator is running on, and returns a content
//! checksum.

use async_trait::async_trait;
use objrepl_types::{Checksum, ReplicateObject};
use thiserror::Error;
use uuid::Uuid;

/// Opaque store-level failure. Converted to an
/// [`objrepl_types::FailureCause`] by the local endpoint before it reaches
/// the coordinator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct StoreError(String);

impl StoreError {
    /// Wraps an arbitrary store-level diagnostic.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// The local object store that backs this node's replica.
///
/// The correlation token lets the store match a reply to a call when it
/// may be handling concurrent writes; this crate's in-memory
/// implementation ignores it, but a real store would use it to correlate
/// an async completion callback.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Persists `object` and returns its content checksum.
    async fn put(&self, object: &ReplicateObject, token: Uuid) -> Result<Checksum, StoreError>;

    /// Removes `object` (a tombstone write) and returns a checksum for the
    /// tombstone record.
    async fn delete(&self, object: &ReplicateObject, token: Uuid) -> Result<Checksum, StoreError>;
}

/// A scriptable, in-memory [`ObjectStore`] for tests: always returns the
/// same result, regardless of how many times it is called.
#[derive(Debug, Clone)]
pub struct ScriptedStore {
    result: Result<Checksum, StoreError>,
}

impl ScriptedStore {
    /// A store that always succeeds with `checksum`.
    #[must_use]
    pub fn ok(checksum: Checksum) -> Self {
        Self {
            result: Ok(checksum),
        }
    }

    /// A store that always fails with `cause`.
    #[must_use]
    pub fn failing(cause: impl Into<String>) -> Self {
        Self {
            result: Err(StoreError::new(cause)),
        }
    }
}

#[async_trait]
impl ObjectStore for ScriptedStore {
    async fn put(&self, _object: &ReplicateObject, _token: Uuid) -> Result<Checksum, StoreError> {
        self.result.clone()
    }

    async fn delete(
        &self,
        _object: &ReplicateObject,
        _token: Uuid,
    ) -> Result<Checksum, StoreError> {
        self.result.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn object() -> ReplicateObject {
        ReplicateObject {
            partition: 1,
            key: Bytes::from_static(b"key"),
            req_id: 1,
            payload: Bytes::from_static(b"payload"),
        }
    }

    #[tokio::test]
    async fn scripted_store_ok() {
        let store = ScriptedStore::ok(Bytes::from_static(b"checksum"));
        let result = store.put(&object(), Uuid::nil()).await;
        assert_eq!(result.unwrap(), Bytes::from_static(b"checksum"));
    }

    #[tokio::test]
    async fn scripted_store_failing() {
        let store = ScriptedStore::failing("disk_full");
        let result = store.delete(&object(), Uuid::nil()).await;
        assert_eq!(result.unwrap_err().to_string(), "disk_full");
    }
}
