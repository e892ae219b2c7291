//! A fully wired in-memory session over the demo catalog.
//!
//! Every handle is public so tests can poke the backend, read the store and
//! inspect what was broadcast or persisted.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::backend::FlakyBackend;
use super::broadcast::RecordingBroadcaster;
use super::reference::MemoryReferenceSource;
use crate::adapter::outbound::sqlite::seed;
use crate::application::cache::{StaticReferenceCache, VolatileStateStore};
use crate::application::pricing::MarketLifecycleEngine;
use crate::application::simulation::{ScoreMonitor, SessionSettings, SimulationSession};
use crate::domain::{EventId, PriceId, ScoreSnapshot};
use crate::port::Broadcaster;

/// Shared handles of one test session.
pub struct TestSession {
    pub source: Arc<MemoryReferenceSource>,
    pub reference: Arc<StaticReferenceCache>,
    pub store: Arc<VolatileStateStore>,
    pub backend: Arc<FlakyBackend>,
    pub broadcaster: Arc<RecordingBroadcaster>,
}

impl TestSession {
    /// Prices each demo event carries.
    pub const PRICES_PER_EVENT: usize = seed::PRICES_PER_EVENT;

    const TTL: Duration = Duration::from_secs(3600);
    const MONITOR_PERIOD: Duration = Duration::from_secs(3);

    fn with_source(source: MemoryReferenceSource) -> Self {
        let backend = Arc::new(FlakyBackend::new());
        let store = Arc::new(VolatileStateStore::new(backend.clone(), Self::TTL, 3));
        Self {
            source: Arc::new(source),
            reference: Arc::new(StaticReferenceCache::new()),
            store,
            backend,
            broadcaster: Arc::new(RecordingBroadcaster::default()),
        }
    }

    /// Demo source wired up, nothing loaded yet.
    pub async fn new() -> Self {
        Self::with_source(MemoryReferenceSource::demo())
    }

    /// A session whose reference source always fails.
    pub async fn failing_source() -> Self {
        Self::with_source(MemoryReferenceSource::failing())
    }

    /// Reference loaded, prices seeded and every event at 0-0.
    pub async fn seeded() -> Self {
        let session = Self::new().await;
        let seed = session
            .reference
            .load(session.source.as_ref())
            .await
            .expect("demo catalog loads");
        for (event_id, prices) in &seed {
            session
                .store
                .set_event_prices(*event_id, prices)
                .await
                .expect("prices seeded");
        }
        let kickoff: Vec<ScoreSnapshot> = session
            .event_ids()
            .into_iter()
            .map(ScoreSnapshot::kickoff)
            .collect();
        session.store.set_all_score_snapshots(&kickoff).await;
        session
    }

    /// Demo event ids in id order.
    pub fn event_ids(&self) -> Vec<EventId> {
        let (events, _) = seed::demo_catalog();
        events.into_iter().map(|event| event.id).collect()
    }

    pub fn first_event_id(&self) -> EventId {
        self.event_ids()[0]
    }

    /// Price code of `price_id` as the reference cache knows it.
    pub fn price_code(&self, event_id: EventId, price_id: PriceId) -> String {
        self.reference
            .relation(event_id, price_id)
            .map(|relation| relation.price_code)
            .unwrap_or_default()
    }

    pub fn lifecycle(&self) -> MarketLifecycleEngine {
        MarketLifecycleEngine::new(Arc::clone(&self.reference), Arc::clone(&self.store))
    }

    /// Monitor publishing to the recording broadcaster.
    pub fn monitor(&self) -> ScoreMonitor {
        self.monitor_with(self.broadcaster.clone())
    }

    pub fn monitor_with(&self, broadcaster: Arc<dyn Broadcaster>) -> ScoreMonitor {
        ScoreMonitor::new(
            Arc::clone(&self.reference),
            Arc::clone(&self.store),
            broadcaster,
            Self::MONITOR_PERIOD,
            StdRng::seed_from_u64(42),
        )
    }

    /// Session over these handles.
    pub fn simulation(&self, settings: SessionSettings) -> SimulationSession {
        SimulationSession::new(
            self.source.clone(),
            Arc::clone(&self.reference),
            Arc::clone(&self.store),
            self.broadcaster.clone(),
            settings,
        )
    }
}
