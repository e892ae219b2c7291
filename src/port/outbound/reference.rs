//! Persistent reference store ports.
//!
//! The session only needs the store to be consistent as of reload time: it
//! reads the active hierarchy once, and writes final state back at teardown.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::{Event, EventId, EventPriceRecord, EventPriceState, ScoreSnapshot};
use crate::error::Result;

/// Flat event row as listed by the activation surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventSummary {
    pub id: EventId,
    pub code: String,
    pub name: String,
}

/// Read access to the static hierarchy plus end-of-session persistence.
#[async_trait]
pub trait ReferenceSource: Send + Sync {
    /// All active events with their competition → country → sport chain and
    /// teams.
    async fn load_active_events(&self) -> Result<Vec<Event>>;

    /// Every event price of an active event whose market is active, with the
    /// price → market → collection chain attached.
    async fn load_active_event_prices(&self) -> Result<Vec<EventPriceRecord>>;

    /// Persist coefficients and active flags. Returns rows written.
    async fn save_event_prices(&self, prices: &[EventPriceState]) -> Result<usize>;

    /// Persist final scores. Returns rows written.
    async fn save_scores(&self, scores: &[ScoreSnapshot]) -> Result<usize>;
}

/// Write access used by the activation trigger.
#[async_trait]
pub trait ActivationStore: Send + Sync {
    /// Mark every event price active again.
    async fn activate_event_prices(&self) -> Result<usize>;

    /// Mark exactly `codes` active and every other market inactive.
    async fn activate_markets(&self, codes: &[String]) -> Result<usize>;

    /// Mark exactly `codes` active, every other event inactive, and reset the
    /// scores of the activated events to 0–0.
    async fn activate_events(&self, codes: &[String]) -> Result<usize>;

    /// Events currently marked active, without their hierarchy.
    async fn list_active_events(&self) -> Result<Vec<EventSummary>>;
}
