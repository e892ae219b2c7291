//! Central score reconciliation loop.
//!
//! Each cycle compares every active event's score with the last one the
//! monitor acted on. A change closes decided markets, reprices what is still
//! open and publishes one update per repriced price.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::rngs::StdRng;
use rust_decimal::Decimal;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::cache::{StaticReferenceCache, VolatileStateStore};
use crate::application::pricing::{calculator, MarketLifecycleEngine};
use crate::domain::{EventId, PriceId, ScoreSnapshot};
use crate::error::StoreError;
use crate::port::Broadcaster;

/// Counters for one monitor cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub checked: usize,
    pub changed: usize,
    pub failed: usize,
    pub published: usize,
    pub publish_failures: usize,
}

/// Counters accumulated over a monitor run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorReport {
    pub cycles: u64,
    pub changed: usize,
    pub failed: usize,
    pub published: usize,
    pub publish_failures: usize,
}

impl MonitorReport {
    fn absorb(&mut self, cycle: &CycleReport) {
        self.cycles += 1;
        self.changed += cycle.changed;
        self.failed += cycle.failed;
        self.published += cycle.published;
        self.publish_failures += cycle.publish_failures;
    }
}

#[derive(Debug, Default)]
struct RepriceOutcome {
    published: usize,
    publish_failures: usize,
}

/// Polls scores and drives repricing for every active event.
pub struct ScoreMonitor {
    reference: Arc<StaticReferenceCache>,
    store: Arc<VolatileStateStore>,
    lifecycle: MarketLifecycleEngine,
    broadcaster: Arc<dyn Broadcaster>,
    period: Duration,
    rng: StdRng,
    baseline: HashMap<EventId, ScoreSnapshot>,
}

impl ScoreMonitor {
    #[must_use]
    pub fn new(
        reference: Arc<StaticReferenceCache>,
        store: Arc<VolatileStateStore>,
        broadcaster: Arc<dyn Broadcaster>,
        period: Duration,
        rng: StdRng,
    ) -> Self {
        let lifecycle = MarketLifecycleEngine::new(Arc::clone(&reference), Arc::clone(&store));
        Self {
            reference,
            store,
            lifecycle,
            broadcaster,
            period,
            rng,
            baseline: HashMap::new(),
        }
    }

    /// Last score the monitor acted on for an event.
    #[must_use]
    pub fn baseline(&self, event_id: EventId) -> Option<ScoreSnapshot> {
        self.baseline.get(&event_id).copied()
    }

    /// Run one reconciliation cycle.
    pub async fn poll_once(&mut self) -> CycleReport {
        let event_ids: Vec<EventId> = self
            .reference
            .active_events()
            .into_iter()
            .map(|event| event.id)
            .collect();
        let scores = self.store.get_all_score_snapshots(&event_ids).await;

        let mut cycle = CycleReport {
            checked: event_ids.len(),
            ..CycleReport::default()
        };

        for event_id in event_ids {
            let Some(score) = scores.get(&event_id).copied() else {
                debug!(%event_id, "No score snapshot");
                cycle.failed += 1;
                continue;
            };
            let changed = self
                .baseline
                .get(&event_id)
                .map_or(true, |previous| score.differs_from(previous));
            if !changed {
                continue;
            }
            cycle.changed += 1;

            match self.reprice(event_id, &score).await {
                Ok(outcome) => {
                    cycle.published += outcome.published;
                    cycle.publish_failures += outcome.publish_failures;
                    self.baseline.insert(event_id, score);
                }
                Err(e) => {
                    cycle.failed += 1;
                    warn!(%event_id, error = %e, "Repricing failed, retrying next cycle");
                }
            }
        }

        cycle
    }

    async fn reprice(
        &mut self,
        event_id: EventId,
        score: &ScoreSnapshot,
    ) -> Result<RepriceOutcome, StoreError> {
        self.lifecycle.apply(event_id, score).await?;

        let prices = self.store.get_event_prices(event_id).await?;
        let mut previous: HashMap<PriceId, Decimal> = HashMap::new();
        let mut updates: HashMap<PriceId, Decimal> = HashMap::new();
        for state in prices.iter().filter(|state| state.active) {
            let Some(relation) = self.reference.relation(event_id, state.price_id) else {
                continue;
            };
            let Some(coefficient) = calculator::compute(
                &relation.market_code,
                &relation.price_code,
                score,
                &mut self.rng,
            ) else {
                continue;
            };
            previous.insert(state.price_id, state.coefficient);
            updates.insert(state.price_id, coefficient);
        }
        if updates.is_empty() {
            return Ok(RepriceOutcome::default());
        }

        self.store.apply_coefficients(event_id, &updates).await?;

        // Publish what actually landed: a price closed concurrently keeps its
        // old coefficient and is not announced.
        let current = self.store.get_event_prices(event_id).await?;
        let timestamp = Utc::now();
        let mut outcome = RepriceOutcome::default();
        for state in current.iter().filter(|state| state.active) {
            if updates.get(&state.price_id) != Some(&state.coefficient) {
                continue;
            }
            let Some(context) = self.reference.enrich(event_id, state.price_id) else {
                continue;
            };
            let old = previous
                .get(&state.price_id)
                .copied()
                .unwrap_or(state.coefficient);
            let update = context.into_update(state, old, timestamp);

            match self.broadcaster.publish(&update).await {
                Ok(()) => outcome.published += 1,
                Err(e) => {
                    outcome.publish_failures += 1;
                    warn!(
                        %event_id,
                        channel = %update.channel(),
                        broadcaster = self.broadcaster.name(),
                        error = %e,
                        "Publish failed"
                    );
                }
            }
        }

        debug!(
            %event_id,
            team1 = score.team1_score(),
            team2 = score.team2_score(),
            published = outcome.published,
            "Repriced"
        );
        Ok(outcome)
    }

    /// Poll every period until `cancel` fires.
    pub async fn run(mut self, cancel: CancellationToken) -> MonitorReport {
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut report = MonitorReport::default();

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let cycle = self.poll_once().await;
                    report.absorb(&cycle);
                }
            }
        }

        info!(
            cycles = report.cycles,
            changed = report.changed,
            published = report.published,
            failed = report.failed,
            "Monitor stopped"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ScoreSnapshot;
    use crate::testkit::broadcast::FailingBroadcaster;
    use crate::testkit::session::TestSession;
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_first_cycle_publishes_every_active_price() {
        let session = TestSession::seeded().await;
        let mut monitor = session.monitor();

        let cycle = monitor.poll_once().await;

        assert_eq!(cycle.checked, session.event_ids().len());
        assert_eq!(cycle.changed, cycle.checked);
        assert_eq!(cycle.failed, 0);
        assert_eq!(cycle.published, TestSession::PRICES_PER_EVENT * cycle.checked);
        assert_eq!(session.broadcaster.len(), cycle.published);
    }

    #[tokio::test]
    async fn test_unchanged_score_is_skipped() {
        let session = TestSession::seeded().await;
        let mut monitor = session.monitor();
        monitor.poll_once().await;
        session.broadcaster.clear();

        let cycle = monitor.poll_once().await;

        assert_eq!(cycle.changed, 0);
        assert!(session.broadcaster.is_empty());
    }

    #[tokio::test]
    async fn test_goal_closes_line_and_reprices_the_rest() {
        let session = TestSession::seeded().await;
        let event_id = session.first_event_id();
        let mut monitor = session.monitor();
        monitor.poll_once().await;
        session.broadcaster.clear();

        let score = ScoreSnapshot::new(event_id, 1, 0);
        session.store.set_score_snapshot(&score).await.unwrap();
        let cycle = monitor.poll_once().await;

        assert_eq!(cycle.changed, 1);
        assert_eq!(monitor.baseline(event_id), Some(score));

        let published: HashSet<String> = session
            .broadcaster
            .updates()
            .into_iter()
            .map(|update| update.price_code)
            .collect();
        assert_eq!(published.len(), TestSession::PRICES_PER_EVENT - 2);
        assert!(!published.contains("O5"));
        assert!(!published.contains("U5"));

        let home = session
            .broadcaster
            .updates()
            .into_iter()
            .find(|update| update.price_code == "1")
            .unwrap();
        assert!(home.new_coefficient >= rust_decimal_macros::dec!(1.10));
        assert!(home.new_coefficient < rust_decimal_macros::dec!(1.60));
        assert!(home.active);
    }

    #[tokio::test]
    async fn test_old_coefficient_is_previous_value() {
        let session = TestSession::seeded().await;
        let event_id = session.first_event_id();
        let mut monitor = session.monitor();
        monitor.poll_once().await;

        let before: HashMap<PriceId, Decimal> = session
            .store
            .get_event_prices(event_id)
            .await
            .unwrap()
            .into_iter()
            .map(|state| (state.price_id, state.coefficient))
            .collect();
        session.broadcaster.clear();

        session
            .store
            .set_score_snapshot(&ScoreSnapshot::new(event_id, 0, 1))
            .await
            .unwrap();
        monitor.poll_once().await;

        for update in session.broadcaster.updates() {
            assert_eq!(update.old_coefficient, before[&update.price_id]);
        }
    }

    #[tokio::test]
    async fn test_missing_prices_leave_baseline_for_retry() {
        let session = TestSession::seeded().await;
        let event_id = session.first_event_id();
        let mut monitor = session.monitor();

        session.backend.fail_key("event_prices:", true);
        let cycle = monitor.poll_once().await;
        assert_eq!(cycle.failed, cycle.checked);
        assert_eq!(monitor.baseline(event_id), None);

        session.backend.fail_key("event_prices:", false);
        let cycle = monitor.poll_once().await;
        assert_eq!(cycle.failed, 0);
        assert!(monitor.baseline(event_id).is_some());
    }

    #[tokio::test]
    async fn test_publish_failures_do_not_stop_the_cycle() {
        let session = TestSession::seeded().await;
        let mut monitor = session.monitor_with(Arc::new(FailingBroadcaster));

        let cycle = monitor.poll_once().await;

        assert_eq!(cycle.published, 0);
        assert_eq!(
            cycle.publish_failures,
            TestSession::PRICES_PER_EVENT * cycle.checked
        );
        assert_eq!(cycle.failed, 0);
        assert!(monitor.baseline(session.first_event_id()).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_polls_until_cancelled() {
        let session = TestSession::seeded().await;
        let monitor = session.monitor();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(monitor.run(cancel.clone()));

        tokio::time::sleep(Duration::from_secs(10)).await;
        cancel.cancel();
        let report = handle.await.unwrap();

        assert_eq!(report.cycles, 3);
        assert_eq!(report.changed, session.event_ids().len());
    }
}
