//! Broadcast port for publishing repriced coefficients.
//!
//! An update is published to a channel derived from the event and market,
//! so subscribers can follow one market of one match.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::{EventPriceId, PriceId};
use crate::error::BroadcastError;

/// A coefficient change enriched with the names subscribers display.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceUpdate {
    pub sport: String,
    pub country: String,
    pub competition: String,
    pub event_name: String,
    pub event_code: String,
    pub collection_name: String,
    pub collection_code: String,
    pub market_name: String,
    pub market_code: String,
    pub price_name: String,
    pub price_code: String,
    pub old_coefficient: Decimal,
    pub new_coefficient: Decimal,
    pub coefficient_id: EventPriceId,
    pub price_id: PriceId,
    pub active: bool,
    pub timestamp: DateTime<Utc>,
}

/// Flat JSON body published to subscribers.
#[derive(Debug, Serialize)]
struct Payload<'a> {
    sport: &'a str,
    country: &'a str,
    competition: &'a str,
    event: &'a str,
    event_code: &'a str,
    market: &'a str,
    market_name: &'a str,
    market_collection_code: &'a str,
    market_collection_name: &'a str,
    price: &'a str,
    price_code: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    new_coefficient: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    old_coefficient: Decimal,
    coefficient_id: EventPriceId,
    price_id: PriceId,
    active: bool,
    timestamp: String,
}

impl PriceUpdate {
    /// Channel name: lower-cased event name without spaces, then the
    /// collection code and market code, joined by underscores.
    #[must_use]
    pub fn channel(&self) -> String {
        format!(
            "{}_{}_{}",
            self.event_name.to_lowercase().replace(' ', ""),
            self.collection_code.to_lowercase(),
            self.market_code.to_lowercase()
        )
    }

    /// JSON payload published on [`channel`](Self::channel).
    ///
    /// # Errors
    ///
    /// [`BroadcastError::Encode`] if the update cannot be serialized.
    pub fn payload(&self) -> Result<serde_json::Value, BroadcastError> {
        let payload = Payload {
            sport: &self.sport,
            country: &self.country,
            competition: &self.competition,
            event: &self.event_name,
            event_code: &self.event_code,
            market: &self.market_code,
            market_name: &self.market_name,
            market_collection_code: &self.collection_code,
            market_collection_name: &self.collection_name,
            price: &self.price_name,
            price_code: &self.price_code,
            new_coefficient: self.new_coefficient,
            old_coefficient: self.old_coefficient,
            coefficient_id: self.coefficient_id,
            price_id: self.price_id,
            active: self.active,
            timestamp: self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        };
        serde_json::to_value(payload).map_err(|source| BroadcastError::Encode {
            channel: self.channel(),
            source,
        })
    }
}

/// Publishes price updates to subscribers.
///
/// Callers log a failed publish and carry on; a broadcaster must never block
/// the monitor waiting for acknowledgement beyond the call itself.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Transport name for logging.
    fn name(&self) -> &'static str;

    /// Verify the transport is reachable. Called once at startup.
    async fn check(&self) -> Result<(), BroadcastError> {
        Ok(())
    }

    /// Publish one update.
    async fn publish(&self, update: &PriceUpdate) -> Result<(), BroadcastError>;
}

/// A no-op broadcaster for when publishing is disabled.
pub struct NullBroadcaster;

#[async_trait]
impl Broadcaster for NullBroadcaster {
    fn name(&self) -> &'static str {
        "null"
    }

    async fn publish(&self, _update: &PriceUpdate) -> Result<(), BroadcastError> {
        Ok(())
    }
}

/// A broadcaster that logs every update via tracing.
pub struct LogBroadcaster;

#[async_trait]
impl Broadcaster for LogBroadcaster {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn publish(&self, update: &PriceUpdate) -> Result<(), BroadcastError> {
        let payload = update.payload()?;
        tracing::info!(
            channel = %update.channel(),
            old = %update.old_coefficient,
            new = %update.new_coefficient,
            %payload,
            "Price update"
        );
        Ok(())
    }
}
