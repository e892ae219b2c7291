//! Low-latency key-value backend port.
//!
//! The volatile store only needs string values with a TTL, a per-key version
//! for optimistic read-modify-write, and pipelined multi-key operations. Any
//! backend that can offer those (in-process map, networked cache) fits
//! behind this trait.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;

/// A stored value together with the version it was read at.
///
/// Versions increase on every write to the key, so two reads returning the
/// same version saw the same value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned {
    pub value: String,
    pub version: u64,
}

/// TTL-bounded key-value storage.
///
/// Expired keys behave exactly like keys that were never written: `get`
/// returns `Ok(None)`.
///
/// # Errors
///
/// Every method reports backend unavailability as
/// [`StoreError::Unavailable`]. Bulk methods report per key and never fail
/// the whole batch.
#[async_trait]
pub trait KeyValueBackend: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &'static str;

    /// Read a key.
    async fn get(&self, key: &str) -> Result<Option<Versioned>, StoreError>;

    /// Write a key unconditionally, refreshing its TTL. Returns the new
    /// version.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<u64, StoreError>;

    /// Write a key only if its current version is `expected`.
    ///
    /// Returns `Ok(false)` when another writer got there first or the key
    /// expired in between.
    async fn compare_and_set(
        &self,
        key: &str,
        expected: u64,
        value: String,
        ttl: Duration,
    ) -> Result<bool, StoreError>;

    /// Pipelined multi-get. Results are in the same order as `keys`.
    async fn get_many(&self, keys: &[String]) -> Vec<Result<Option<Versioned>, StoreError>>;

    /// Pipelined multi-set. Results are in the same order as `entries`.
    async fn set_many(
        &self,
        entries: Vec<(String, String)>,
        ttl: Duration,
    ) -> Vec<Result<u64, StoreError>>;

    /// Pipelined multi-delete. Each result is `true` when a live key was
    /// removed and `false` when there was nothing to remove.
    async fn delete_many(&self, keys: &[String]) -> Vec<Result<bool, StoreError>>;
}
