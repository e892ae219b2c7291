//! Redis key-value backend.
//!
//! Every key is a hash holding the serialized value under `v` and its
//! version under `ver`. Versions are drawn from one shared counter key, so a
//! key recreated after expiry never reuses a version an old reader holds.
//! Writes run as Lua scripts: the version bump, the value and the TTL change
//! in one step. Bulk operations go out as a single pipeline.

use std::time::Duration;

use ::redis::aio::ConnectionManager;
use ::redis::{Client, RedisError, RedisResult, Script};
use async_trait::async_trait;
use tracing::info;

use crate::error::StoreError;
use crate::port::outbound::volatile::{KeyValueBackend, Versioned};

const VALUE_FIELD: &str = "v";
const VERSION_FIELD: &str = "ver";

const SET_SCRIPT: &str = r"
local version = redis.call('INCR', KEYS[2])
redis.call('HSET', KEYS[1], 'v', ARGV[1], 'ver', version)
redis.call('PEXPIRE', KEYS[1], ARGV[2])
return version
";

const CAS_SCRIPT: &str = r"
local current = redis.call('HGET', KEYS[1], 'ver')
if not current or tonumber(current) ~= tonumber(ARGV[1]) then
  return 0
end
local version = redis.call('INCR', KEYS[2])
redis.call('HSET', KEYS[1], 'v', ARGV[2], 'ver', version)
redis.call('PEXPIRE', KEYS[1], ARGV[3])
return 1
";

type Fields = (Option<String>, Option<u64>);

fn unavailable(err: &RedisError) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

fn versioned((value, version): Fields) -> Option<Versioned> {
    match (value, version) {
        (Some(value), Some(version)) => Some(Versioned { value, version }),
        _ => None,
    }
}

/// Spread one pipeline outcome over every key of the batch.
fn per_key<T, U>(
    len: usize,
    result: RedisResult<Vec<T>>,
    convert: impl Fn(T) -> U,
) -> Vec<Result<U, StoreError>> {
    match result {
        Ok(values) => values.into_iter().map(|value| Ok(convert(value))).collect(),
        Err(e) => (0..len).map(|_| Err(unavailable(&e))).collect(),
    }
}

/// Key-value backend on a Redis server.
pub struct RedisBackend {
    conn: ConnectionManager,
    version_key: String,
    set_script: Script,
    cas_script: Script,
}

impl RedisBackend {
    /// Connect to `url` and verify the server answers.
    ///
    /// `version_key` names the counter every write draws its version from.
    ///
    /// # Errors
    ///
    /// [`StoreError::Unavailable`] if the URL is invalid or the server does
    /// not respond.
    pub async fn connect(url: &str, version_key: impl Into<String>) -> Result<Self, StoreError> {
        let client = Client::open(url).map_err(|e| unavailable(&e))?;
        let mut conn = client
            .get_connection_manager()
            .await
            .map_err(|e| unavailable(&e))?;
        let pong: String = ::redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| unavailable(&e))?;
        info!(url, reply = %pong, "Redis reachable");

        Ok(Self {
            conn,
            version_key: version_key.into(),
            set_script: Script::new(SET_SCRIPT),
            cas_script: Script::new(CAS_SCRIPT),
        })
    }
}

#[async_trait]
impl KeyValueBackend for RedisBackend {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<Versioned>, StoreError> {
        let mut conn = self.conn.clone();
        let fields: Fields = ::redis::cmd("HMGET")
            .arg(key)
            .arg(VALUE_FIELD)
            .arg(VERSION_FIELD)
            .query_async(&mut conn)
            .await
            .map_err(|e| unavailable(&e))?;
        Ok(versioned(fields))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<u64, StoreError> {
        let mut conn = self.conn.clone();
        let version: u64 = self
            .set_script
            .key(key)
            .key(&self.version_key)
            .arg(value)
            .arg(ttl_millis(ttl))
            .invoke_async(&mut conn)
            .await
            .map_err(|e| unavailable(&e))?;
        Ok(version)
    }

    async fn compare_and_set(
        &self,
        key: &str,
        expected: u64,
        value: String,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let applied: i64 = self
            .cas_script
            .key(key)
            .key(&self.version_key)
            .arg(expected)
            .arg(value)
            .arg(ttl_millis(ttl))
            .invoke_async(&mut conn)
            .await
            .map_err(|e| unavailable(&e))?;
        Ok(applied == 1)
    }

    async fn get_many(&self, keys: &[String]) -> Vec<Result<Option<Versioned>, StoreError>> {
        if keys.is_empty() {
            return Vec::new();
        }
        let mut pipe = ::redis::pipe();
        for key in keys {
            pipe.cmd("HMGET").arg(key).arg(VALUE_FIELD).arg(VERSION_FIELD);
        }
        let mut conn = self.conn.clone();
        let result: RedisResult<Vec<Fields>> = pipe.query_async(&mut conn).await;
        per_key(keys.len(), result, versioned)
    }

    async fn set_many(
        &self,
        entries: Vec<(String, String)>,
        ttl: Duration,
    ) -> Vec<Result<u64, StoreError>> {
        if entries.is_empty() {
            return Vec::new();
        }
        let ttl = ttl_millis(ttl);
        let mut pipe = ::redis::pipe();
        for (key, value) in &entries {
            pipe.cmd("EVAL")
                .arg(SET_SCRIPT)
                .arg(2)
                .arg(key)
                .arg(&self.version_key)
                .arg(value)
                .arg(ttl);
        }
        let mut conn = self.conn.clone();
        let result: RedisResult<Vec<u64>> = pipe.query_async(&mut conn).await;
        per_key(entries.len(), result, |version| version)
    }

    async fn delete_many(&self, keys: &[String]) -> Vec<Result<bool, StoreError>> {
        if keys.is_empty() {
            return Vec::new();
        }
        let mut pipe = ::redis::pipe();
        for key in keys {
            pipe.cmd("DEL").arg(key);
        }
        let mut conn = self.conn.clone();
        let result: RedisResult<Vec<u64>> = pipe.query_async(&mut conn).await;
        per_key(keys.len(), result, |removed| removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_is_whole_milliseconds_and_never_zero() {
        assert_eq!(ttl_millis(Duration::from_secs(1800)), 1_800_000);
        assert_eq!(ttl_millis(Duration::from_micros(10)), 1);
        assert_eq!(ttl_millis(Duration::MAX), u64::MAX);
    }

    #[test]
    fn partial_hash_reads_as_missing() {
        assert_eq!(versioned((None, None)), None);
        assert_eq!(versioned((Some("x".into()), None)), None);
        assert_eq!(
            versioned((Some("x".into()), Some(4))),
            Some(Versioned {
                value: "x".into(),
                version: 4
            })
        );
    }

    #[test]
    fn failed_pipeline_fails_every_key() {
        let err = RedisError::from((::redis::ErrorKind::IoError, "connection reset"));
        let result: RedisResult<Vec<u64>> = Err(err);
        let results = per_key(3, result, |version| version);

        assert_eq!(results.len(), 3);
        assert!(results
            .iter()
            .all(|r| matches!(r, Err(StoreError::Unavailable(_)))));
    }

    #[test]
    fn successful_pipeline_keeps_order() {
        let results = per_key(2, Ok(vec![0u64, 1]), |removed| removed > 0);
        let flags: Vec<bool> = results.into_iter().map(Result::unwrap).collect();
        assert_eq!(flags, vec![false, true]);
    }
}
