//! In-process key-value backend.
//!
//! Entries carry an expiry on tokio's clock, so paused-time tests can step
//! over a TTL without sleeping. Expired entries are dropped lazily on read
//! and by [`MemoryBackend::purge_expired`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use crate::error::StoreError;
use crate::port::outbound::volatile::{KeyValueBackend, Versioned};

#[derive(Debug)]
struct Entry {
    value: String,
    version: u64,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// Concurrent in-memory backend with TTL and per-key versions.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: DashMap<String, Entry>,
    /// Shared counter so a key recreated after expiry never reuses a version.
    next_version: AtomicU64,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn bump(&self) -> u64 {
        self.next_version.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn read(&self, key: &str) -> Option<Versioned> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if entry.is_live(now) {
                return Some(Versioned {
                    value: entry.value.clone(),
                    version: entry.version,
                });
            }
        }
        self.entries.remove_if(key, |_, entry| !entry.is_live(now));
        None
    }

    fn write(&self, key: &str, value: String, ttl: Duration) -> u64 {
        let version = self.bump();
        self.entries.insert(
            key.to_string(),
            Entry {
                value,
                version,
                expires_at: Instant::now() + ttl,
            },
        );
        version
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        before.saturating_sub(self.entries.len())
    }

    /// Number of stored entries, including expired ones not yet purged.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl KeyValueBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<Versioned>, StoreError> {
        Ok(self.read(key))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<u64, StoreError> {
        Ok(self.write(key, value, ttl))
    }

    async fn compare_and_set(
        &self,
        key: &str,
        expected: u64,
        value: String,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let now = Instant::now();
        let Some(mut entry) = self.entries.get_mut(key) else {
            return Ok(false);
        };
        if !entry.is_live(now) || entry.version != expected {
            return Ok(false);
        }
        entry.value = value;
        entry.version = self.bump();
        entry.expires_at = now + ttl;
        Ok(true)
    }

    async fn get_many(&self, keys: &[String]) -> Vec<Result<Option<Versioned>, StoreError>> {
        keys.iter().map(|key| Ok(self.read(key))).collect()
    }

    async fn set_many(
        &self,
        entries: Vec<(String, String)>,
        ttl: Duration,
    ) -> Vec<Result<u64, StoreError>> {
        entries
            .into_iter()
            .map(|(key, value)| Ok(self.write(&key, value, ttl)))
            .collect()
    }

    async fn delete_many(&self, keys: &[String]) -> Vec<Result<bool, StoreError>> {
        let now = Instant::now();
        keys.iter()
            .map(|key| {
                Ok(self
                    .entries
                    .remove(key)
                    .is_some_and(|(_, entry)| entry.is_live(now)))
            })
            .collect()
    }
}
