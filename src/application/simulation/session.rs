//! One simulation session from reference load to teardown.
//!
//! ```text
//! load reference ─► seed volatile ─► spawn simulators + monitor
//!                                          │
//!                      duration elapsed or external cancel
//!                                          ▼
//!                   cancel ─► join all ─► persist final state
//! ```

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::monitor::{MonitorReport, ScoreMonitor};
use super::simulator::{EventSimulator, SimulatorReport};
use crate::application::cache::{StaticReferenceCache, VolatileStateStore};
use crate::domain::{EventId, EventPriceState, ScoreSnapshot};
use crate::error::Result;
use crate::port::{Broadcaster, ReferenceSource};

/// Timing and randomness of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub duration: Duration,
    pub simulation_interval: Duration,
    pub monitor_interval: Duration,
    /// Fixed seed for reproducible runs; entropy when unset.
    pub seed: Option<u64>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(55),
            simulation_interval: Duration::from_secs(10),
            monitor_interval: Duration::from_secs(3),
            seed: None,
        }
    }
}

/// What a finished session did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub generation: u64,
    pub events: usize,
    pub simulators: Vec<SimulatorReport>,
    pub monitor: MonitorReport,
    pub persisted_prices: usize,
    pub persisted_scores: usize,
}

impl SessionReport {
    /// Goals scored across all events.
    #[must_use]
    pub fn goals(&self) -> u64 {
        self.simulators.iter().map(|report| report.ticks).sum()
    }
}

/// Coordinates the simulators and the monitor for one run.
pub struct SimulationSession {
    source: Arc<dyn ReferenceSource>,
    reference: Arc<StaticReferenceCache>,
    store: Arc<VolatileStateStore>,
    broadcaster: Arc<dyn Broadcaster>,
    settings: SessionSettings,
}

impl SimulationSession {
    #[must_use]
    pub fn new(
        source: Arc<dyn ReferenceSource>,
        reference: Arc<StaticReferenceCache>,
        store: Arc<VolatileStateStore>,
        broadcaster: Arc<dyn Broadcaster>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            source,
            reference,
            store,
            broadcaster,
            settings,
        }
    }

    fn rng(&self, stream: u64) -> StdRng {
        match self.settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(stream)),
            None => StdRng::from_entropy(),
        }
    }

    /// Run the session until its duration elapses or `cancel` fires.
    ///
    /// Returns after every task has stopped, so nothing writes scores once
    /// this resolves.
    ///
    /// # Errors
    ///
    /// Fails before spawning anything if the reference load or volatile
    /// seeding fails. Teardown persistence errors are logged, not returned.
    pub async fn run(&self, cancel: CancellationToken) -> Result<SessionReport> {
        let previous = self.reference.generation();
        let seed = self.reference.load(self.source.as_ref()).await?;
        let current = self.reference.generation();
        let generation = current.number();

        let stale: Vec<EventId> = previous
            .event_ids()
            .filter(|event_id| current.event(*event_id).is_none())
            .collect();
        if !stale.is_empty() {
            let discarded = self.store.discard_events(&stale).await;
            info!(events = stale.len(), discarded, "Dropped state of deactivated events");
        }

        for (event_id, prices) in &seed {
            self.store.set_event_prices(*event_id, prices).await?;
        }

        let events = self.reference.active_events();
        let kickoff: Vec<ScoreSnapshot> = events
            .iter()
            .map(|event| ScoreSnapshot::kickoff(event.id))
            .collect();
        let seeded = self.store.set_all_score_snapshots(&kickoff).await;
        if seeded < kickoff.len() {
            warn!(seeded, expected = kickoff.len(), "Some scores were not seeded");
        }

        let token = cancel.child_token();
        let mut simulators = JoinSet::new();
        for score in kickoff {
            let stream = u64::from(score.event_id().get().unsigned_abs()) + 1;
            let simulator = EventSimulator::new(
                score,
                Arc::clone(&self.store),
                self.settings.simulation_interval,
                self.rng(stream),
            );
            simulators.spawn(simulator.run(token.clone()));
        }

        let monitor = ScoreMonitor::new(
            Arc::clone(&self.reference),
            Arc::clone(&self.store),
            Arc::clone(&self.broadcaster),
            self.settings.monitor_interval,
            self.rng(0),
        );
        let monitor = tokio::spawn(monitor.run(token.clone()));

        info!(
            generation,
            events = events.len(),
            duration_secs = self.settings.duration.as_secs(),
            broadcaster = self.broadcaster.name(),
            "Session started"
        );

        tokio::select! {
            () = tokio::time::sleep(self.settings.duration) => info!("Session duration elapsed"),
            () = cancel.cancelled() => info!("Session cancelled"),
        }
        token.cancel();

        let mut reports = Vec::with_capacity(events.len());
        while let Some(joined) = simulators.join_next().await {
            match joined {
                Ok(report) => reports.push(report),
                Err(e) => warn!(error = %e, "Simulator task failed"),
            }
        }
        reports.sort_by_key(|report| report.event_id);
        let monitor = monitor.await?;

        let event_ids: Vec<EventId> = events.iter().map(|event| event.id).collect();
        let (persisted_prices, persisted_scores) = self.persist(&event_ids).await;

        let report = SessionReport {
            generation,
            events: events.len(),
            simulators: reports,
            monitor,
            persisted_prices,
            persisted_scores,
        };
        info!(
            goals = report.goals(),
            published = report.monitor.published,
            persisted_prices,
            persisted_scores,
            "Session finished"
        );
        Ok(report)
    }

    /// Best-effort write-back of final coefficients and scores.
    async fn persist(&self, event_ids: &[EventId]) -> (usize, usize) {
        let mut prices: Vec<EventPriceState> = Vec::new();
        for event_id in event_ids {
            match self.store.get_event_prices(*event_id).await {
                Ok(list) => prices.extend(list),
                Err(e) => warn!(%event_id, error = %e, "Final prices unavailable"),
            }
        }
        let persisted_prices = match self.source.save_event_prices(&prices).await {
            Ok(count) => count,
            Err(e) => {
                warn!(error = %e, "Failed to persist final prices");
                0
            }
        };

        let scores: Vec<ScoreSnapshot> = self
            .store
            .get_all_score_snapshots(event_ids)
            .await
            .into_values()
            .collect();
        let persisted_scores = match self.source.save_scores(&scores).await {
            Ok(count) => count,
            Err(e) => {
                warn!(error = %e, "Failed to persist final scores");
                0
            }
        };

        (persisted_prices, persisted_scores)
    }
}
