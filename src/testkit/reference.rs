//! In-memory reference and activation stores.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::adapter::outbound::sqlite::seed;
use crate::domain::{Event, EventPriceRecord, EventPriceState, ScoreSnapshot};
use crate::error::{Error, Result};
use crate::port::{ActivationStore, EventSummary, ReferenceSource};

/// Reference source backed by fixed vectors.
///
/// Writes from session teardown are kept so tests can inspect them.
#[derive(Default)]
pub struct MemoryReferenceSource {
    events: Vec<Event>,
    records: Vec<EventPriceRecord>,
    failing: bool,
    saved_prices: Mutex<Vec<EventPriceState>>,
    saved_scores: Mutex<Vec<ScoreSnapshot>>,
}

impl MemoryReferenceSource {
    pub fn new(events: Vec<Event>, records: Vec<EventPriceRecord>) -> Self {
        Self {
            events,
            records,
            ..Self::default()
        }
    }

    /// The full demo catalog.
    pub fn demo() -> Self {
        let (events, records) = seed::demo_catalog();
        Self::new(events, records)
    }

    /// A source whose every call fails.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn saved_prices(&self) -> Vec<EventPriceState> {
        self.saved_prices.lock().clone()
    }

    pub fn saved_scores(&self) -> Vec<ScoreSnapshot> {
        self.saved_scores.lock().clone()
    }

    fn check(&self) -> Result<()> {
        if self.failing {
            return Err(Error::Connection("reference store offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ReferenceSource for MemoryReferenceSource {
    async fn load_active_events(&self) -> Result<Vec<Event>> {
        self.check()?;
        Ok(self.events.iter().filter(|e| e.active).cloned().collect())
    }

    async fn load_active_event_prices(&self) -> Result<Vec<EventPriceRecord>> {
        self.check()?;
        Ok(self.records.clone())
    }

    async fn save_event_prices(&self, prices: &[EventPriceState]) -> Result<usize> {
        self.check()?;
        self.saved_prices.lock().extend_from_slice(prices);
        Ok(prices.len())
    }

    async fn save_scores(&self, scores: &[ScoreSnapshot]) -> Result<usize> {
        self.check()?;
        self.saved_scores.lock().extend_from_slice(scores);
        Ok(scores.len())
    }
}

/// Activation store that records each call in order.
///
/// Calls are recorded as `prices`, `markets:<codes>` and `events:<codes>`,
/// with codes joined by commas.
#[derive(Default)]
pub struct RecordingActivationStore {
    calls: Mutex<Vec<String>>,
}

impl RecordingActivationStore {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ActivationStore for RecordingActivationStore {
    async fn activate_event_prices(&self) -> Result<usize> {
        self.calls.lock().push("prices".into());
        Ok(0)
    }

    async fn activate_markets(&self, codes: &[String]) -> Result<usize> {
        self.calls.lock().push(format!("markets:{}", codes.join(",")));
        Ok(codes.len())
    }

    async fn activate_events(&self, codes: &[String]) -> Result<usize> {
        self.calls.lock().push(format!("events:{}", codes.join(",")));
        Ok(codes.len())
    }

    async fn list_active_events(&self) -> Result<Vec<EventSummary>> {
        Ok(Vec::new())
    }
}
