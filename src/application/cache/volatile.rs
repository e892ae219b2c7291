//! Volatile per-event state: price coefficients/active flags and live scores.
//!
//! Everything here is expendable. A missing key is answered with
//! [`StoreError::NotFound`] and repaired by the next session reload, never by
//! inventing state on the spot.
//!
//! Price lists are shared between the monitor and session reloads, so they
//! are written with optimistic versioning: read value and version, mutate,
//! compare-and-set, retry on conflict. Scores have a single writer per event
//! (its simulator) and are set directly.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::{EventId, EventPriceState, PriceId, ScoreSnapshot};
use crate::error::StoreError;
use crate::port::outbound::volatile::KeyValueBackend;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

fn prices_key(event_id: EventId) -> String {
    format!("event_prices:{event_id}")
}

fn score_key(event_id: EventId) -> String {
    format!("score:{event_id}")
}

fn encode<T: Serialize + ?Sized>(key: &str, value: &T) -> StoreResult<String> {
    serde_json::to_string(value).map_err(|source| StoreError::Corrupt {
        key: key.to_string(),
        source,
    })
}

fn decode<T: DeserializeOwned>(key: &str, value: &str) -> StoreResult<T> {
    serde_json::from_str(value).map_err(|source| StoreError::Corrupt {
        key: key.to_string(),
        source,
    })
}

/// Typed facade over a [`KeyValueBackend`].
pub struct VolatileStateStore {
    backend: Arc<dyn KeyValueBackend>,
    ttl: Duration,
    max_update_attempts: u32,
}

impl VolatileStateStore {
    #[must_use]
    pub fn new(backend: Arc<dyn KeyValueBackend>, ttl: Duration, max_update_attempts: u32) -> Self {
        Self {
            backend,
            ttl,
            max_update_attempts: max_update_attempts.max(1),
        }
    }

    /// Name of the underlying backend.
    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Replace the price list of an event, refreshing its TTL.
    pub async fn set_event_prices(
        &self,
        event_id: EventId,
        prices: &[EventPriceState],
    ) -> StoreResult<()> {
        let key = prices_key(event_id);
        let data = encode(&key, prices)?;
        self.backend.set(&key, data, self.ttl).await?;
        Ok(())
    }

    /// Read the price list of an event.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when the list was never written or expired.
    pub async fn get_event_prices(&self, event_id: EventId) -> StoreResult<Vec<EventPriceState>> {
        let key = prices_key(event_id);
        match self.backend.get(&key).await? {
            Some(stored) => decode(&key, &stored.value),
            None => Err(StoreError::NotFound { key }),
        }
    }

    /// Read-modify-write an event's price list.
    ///
    /// `mutate` returns how many entries it changed; when that is zero
    /// nothing is written. The closure may run more than once if another
    /// writer updates the list concurrently, each time on a fresh read.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if the list is absent, and
    /// [`StoreError::VersionConflict`] if every attempt lost the race.
    pub async fn update_event_prices<F>(&self, event_id: EventId, mut mutate: F) -> StoreResult<usize>
    where
        F: FnMut(&mut [EventPriceState]) -> usize + Send,
    {
        let key = prices_key(event_id);

        for attempt in 1..=self.max_update_attempts {
            let Some(stored) = self.backend.get(&key).await? else {
                return Err(StoreError::NotFound { key });
            };
            let mut prices: Vec<EventPriceState> = decode(&key, &stored.value)?;

            let changed = mutate(&mut prices);
            if changed == 0 {
                return Ok(0);
            }

            let data = encode(&key, &prices)?;
            if self
                .backend
                .compare_and_set(&key, stored.version, data, self.ttl)
                .await?
            {
                return Ok(changed);
            }
            debug!(%event_id, attempt, "Price list changed underneath update, retrying");
        }

        Err(StoreError::VersionConflict {
            key,
            attempts: self.max_update_attempts,
        })
    }

    /// Mark the listed prices of an event inactive.
    ///
    /// Idempotent: prices already inactive are left alone. Returns how many
    /// flipped from active to inactive.
    pub async fn deactivate_event_prices(
        &self,
        event_id: EventId,
        price_ids: &HashSet<PriceId>,
    ) -> StoreResult<usize> {
        if price_ids.is_empty() {
            return Ok(0);
        }
        self.update_event_prices(event_id, |prices| {
            let mut flipped = 0;
            for price in prices.iter_mut() {
                if price_ids.contains(&price.price_id) && price.deactivate() {
                    flipped += 1;
                }
            }
            flipped
        })
        .await
    }

    /// Write new coefficients for prices that are still active.
    ///
    /// Inactive prices are skipped even if present in `coefficients`, so a
    /// recompute racing a deactivation can never bring a price back.
    pub async fn apply_coefficients(
        &self,
        event_id: EventId,
        coefficients: &HashMap<PriceId, Decimal>,
    ) -> StoreResult<usize> {
        if coefficients.is_empty() {
            return Ok(0);
        }
        self.update_event_prices(event_id, |prices| {
            let mut changed = 0;
            for price in prices.iter_mut().filter(|p| p.active) {
                if let Some(&coefficient) = coefficients.get(&price.price_id) {
                    if price.coefficient != coefficient {
                        price.coefficient = coefficient;
                        changed += 1;
                    }
                }
            }
            changed
        })
        .await
    }

    /// Store the live score of an event.
    pub async fn set_score_snapshot(&self, score: &ScoreSnapshot) -> StoreResult<()> {
        let key = score_key(score.event_id());
        let data = encode(&key, score)?;
        self.backend.set(&key, data, self.ttl).await?;
        Ok(())
    }

    /// Read the live score of an event.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when no score is stored or it expired.
    pub async fn get_score_snapshot(&self, event_id: EventId) -> StoreResult<ScoreSnapshot> {
        let key = score_key(event_id);
        match self.backend.get(&key).await? {
            Some(stored) => decode(&key, &stored.value),
            None => Err(StoreError::NotFound { key }),
        }
    }

    /// Store many scores in one pipelined call.
    ///
    /// A key that fails to encode or write is logged and skipped. Returns the
    /// number written.
    pub async fn set_all_score_snapshots(&self, scores: &[ScoreSnapshot]) -> usize {
        let mut entries = Vec::with_capacity(scores.len());
        for score in scores {
            let key = score_key(score.event_id());
            match encode(&key, score) {
                Ok(data) => entries.push((key, data)),
                Err(e) => warn!(error = %e, "Skipping score snapshot"),
            }
        }

        let keys: Vec<String> = entries.iter().map(|(key, _)| key.clone()).collect();
        let results = self.backend.set_many(entries, self.ttl).await;

        let mut written = 0;
        for (key, result) in keys.iter().zip(results) {
            match result {
                Ok(_) => written += 1,
                Err(e) => warn!(key = %key, error = %e, "Failed to store score snapshot"),
            }
        }
        written
    }

    /// Read many scores in one pipelined call.
    ///
    /// Missing keys are absent from the result; failing or corrupt keys are
    /// logged and skipped.
    pub async fn get_all_score_snapshots(
        &self,
        event_ids: &[EventId],
    ) -> HashMap<EventId, ScoreSnapshot> {
        if event_ids.is_empty() {
            return HashMap::new();
        }

        let keys: Vec<String> = event_ids.iter().copied().map(score_key).collect();
        let results = self.backend.get_many(&keys).await;

        let mut scores = HashMap::with_capacity(event_ids.len());
        for ((event_id, key), result) in event_ids.iter().zip(&keys).zip(results) {
            match result {
                Ok(Some(stored)) => match decode::<ScoreSnapshot>(key, &stored.value) {
                    Ok(score) => {
                        scores.insert(*event_id, score);
                    }
                    Err(e) => warn!(error = %e, "Skipping corrupt score snapshot"),
                },
                Ok(None) => {}
                Err(e) => warn!(key = %key, error = %e, "Failed to read score snapshot"),
            }
        }
        scores
    }

    /// Drop the price list and score of every listed event in one pipelined
    /// call. Failing keys are logged and skipped. Returns how many keys held
    /// live state.
    pub async fn discard_events(&self, event_ids: &[EventId]) -> usize {
        if event_ids.is_empty() {
            return 0;
        }

        let keys: Vec<String> = event_ids
            .iter()
            .flat_map(|event_id| [prices_key(*event_id), score_key(*event_id)])
            .collect();
        let results = self.backend.delete_many(&keys).await;

        let mut removed = 0;
        for (key, result) in keys.iter().zip(results) {
            match result {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(e) => warn!(key = %key, error = %e, "Failed to discard volatile state"),
            }
        }
        removed
    }
}
