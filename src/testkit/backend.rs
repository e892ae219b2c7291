//! Key-value backend with switchable failures.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::adapter::outbound::memory::MemoryBackend;
use crate::error::StoreError;
use crate::port::{KeyValueBackend, Versioned};

#[derive(Debug, Default)]
struct Faults {
    reads: bool,
    writes: bool,
    prefixes: Vec<String>,
}

/// [`MemoryBackend`] that can be told to fail reads, writes, or every
/// operation on keys with a given prefix.
#[derive(Debug, Default)]
pub struct FlakyBackend {
    inner: MemoryBackend,
    faults: RwLock<Faults>,
}

impl FlakyBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.faults.write().reads = fail;
    }

    pub fn fail_writes(&self, fail: bool) {
        self.faults.write().writes = fail;
    }

    /// Fail every operation on keys starting with `prefix`.
    pub fn fail_key(&self, prefix: &str, fail: bool) {
        let mut faults = self.faults.write();
        faults.prefixes.retain(|p| p != prefix);
        if fail {
            faults.prefixes.push(prefix.to_string());
        }
    }

    fn check(&self, key: &str, write: bool) -> Result<(), StoreError> {
        let faults = self.faults.read();
        let by_kind = if write { faults.writes } else { faults.reads };
        if by_kind || faults.prefixes.iter().any(|p| key.starts_with(p.as_str())) {
            return Err(StoreError::Unavailable(format!("injected failure on {key}")));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueBackend for FlakyBackend {
    fn name(&self) -> &'static str {
        "flaky"
    }

    async fn get(&self, key: &str) -> Result<Option<Versioned>, StoreError> {
        self.check(key, false)?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<u64, StoreError> {
        self.check(key, true)?;
        self.inner.set(key, value, ttl).await
    }

    async fn compare_and_set(
        &self,
        key: &str,
        expected: u64,
        value: String,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        self.check(key, true)?;
        self.inner.compare_and_set(key, expected, value, ttl).await
    }

    async fn get_many(&self, keys: &[String]) -> Vec<Result<Option<Versioned>, StoreError>> {
        let mut results = Vec::with_capacity(keys.len());
        for key in keys {
            results.push(self.get(key).await);
        }
        results
    }

    async fn set_many(
        &self,
        entries: Vec<(String, String)>,
        ttl: Duration,
    ) -> Vec<Result<u64, StoreError>> {
        let mut results = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            results.push(self.set(&key, value, ttl).await);
        }
        results
    }

    async fn delete_many(&self, keys: &[String]) -> Vec<Result<bool, StoreError>> {
        let mut results = Vec::with_capacity(keys.len());
        for key in keys {
            let result = match self.check(key, true) {
                Ok(()) => self
                    .inner
                    .delete_many(std::slice::from_ref(key))
                    .await
                    .pop()
                    .unwrap_or(Ok(false)),
                Err(e) => Err(e),
            };
            results.push(result);
        }
        results
    }
}
