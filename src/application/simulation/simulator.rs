//! Per-event score simulation.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::Rng;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::application::cache::VolatileStateStore;
use crate::domain::{EventId, ScoreSnapshot, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatorState {
    Running,
    Stopped,
}

/// Final state of a simulator after it stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatorReport {
    pub event_id: EventId,
    pub ticks: u64,
    pub final_score: ScoreSnapshot,
    pub failed_writes: u64,
}

/// Drives the score of one event: one goal per tick, to a random side.
///
/// The simulator is the only writer of its event's score key.
pub struct EventSimulator {
    score: ScoreSnapshot,
    store: Arc<VolatileStateStore>,
    period: Duration,
    rng: StdRng,
    state: SimulatorState,
    ticks: u64,
    failed_writes: u64,
}

impl EventSimulator {
    #[must_use]
    pub fn new(
        initial: ScoreSnapshot,
        store: Arc<VolatileStateStore>,
        period: Duration,
        rng: StdRng,
    ) -> Self {
        Self {
            score: initial,
            store,
            period,
            rng,
            state: SimulatorState::Running,
            ticks: 0,
            failed_writes: 0,
        }
    }

    #[must_use]
    pub fn event_id(&self) -> EventId {
        self.score.event_id()
    }

    #[must_use]
    pub fn state(&self) -> SimulatorState {
        self.state
    }

    #[must_use]
    pub fn score(&self) -> ScoreSnapshot {
        self.score
    }

    /// Score one goal and write the snapshot.
    ///
    /// A failed write is logged and counted; the local score still advances
    /// and the next tick writes it again.
    pub async fn tick(&mut self) -> ScoreSnapshot {
        let side = if self.rng.gen_bool(0.5) {
            Side::Team1
        } else {
            Side::Team2
        };
        self.score.record_goal(side);
        self.ticks += 1;

        if let Err(e) = self.store.set_score_snapshot(&self.score).await {
            self.failed_writes += 1;
            warn!(event_id = %self.event_id(), error = %e, "Failed to write score");
        } else {
            debug!(
                event_id = %self.event_id(),
                team1 = self.score.team1_score(),
                team2 = self.score.team2_score(),
                "Goal"
            );
        }
        self.score
    }

    /// Tick every period until `cancel` fires. The first goal comes one
    /// full period after start.
    pub async fn run(mut self, cancel: CancellationToken) -> SimulatorReport {
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }

        self.state = SimulatorState::Stopped;
        debug!(event_id = %self.event_id(), ticks = self.ticks, "Simulator stopped");
        self.report()
    }

    #[must_use]
    pub fn report(&self) -> SimulatorReport {
        SimulatorReport {
            event_id: self.event_id(),
            ticks: self.ticks,
            final_score: self.score,
            failed_writes: self.failed_writes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::memory::MemoryBackend;
    use crate::testkit::backend::FlakyBackend;
    use rand::SeedableRng;

    const PERIOD: Duration = Duration::from_secs(10);

    fn store() -> Arc<VolatileStateStore> {
        Arc::new(VolatileStateStore::new(
            Arc::new(MemoryBackend::new()),
            Duration::from_secs(3600),
            3,
        ))
    }

    fn simulator(store: &Arc<VolatileStateStore>) -> EventSimulator {
        EventSimulator::new(
            ScoreSnapshot::kickoff(EventId::new(1)),
            Arc::clone(store),
            PERIOD,
            StdRng::seed_from_u64(11),
        )
    }

    #[tokio::test]
    async fn test_tick_scores_one_goal_and_writes() {
        let store = store();
        let mut sim = simulator(&store);

        let score = sim.tick().await;

        assert_eq!(score.total(), 1);
        assert_eq!(score.total(), score.team1_score() + score.team2_score());
        assert_eq!(store.get_score_snapshot(EventId::new(1)).await.unwrap(), score);
        assert_eq!(sim.state(), SimulatorState::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_ticks_on_period_until_cancelled() {
        let store = store();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(simulator(&store).run(cancel.clone()));

        tokio::time::sleep(Duration::from_secs(35)).await;
        cancel.cancel();
        let report = handle.await.unwrap();

        assert_eq!(report.ticks, 3);
        assert_eq!(report.final_score.total(), 3);
        assert_eq!(report.failed_writes, 0);
        assert_eq!(
            store.get_score_snapshot(EventId::new(1)).await.unwrap(),
            report.final_score
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_goal_before_first_period() {
        let store = store();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(simulator(&store).run(cancel.clone()));

        tokio::time::sleep(PERIOD - Duration::from_millis(1)).await;
        cancel.cancel();

        assert_eq!(handle.await.unwrap().ticks, 0);
        assert!(store
            .get_score_snapshot(EventId::new(1))
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_writes_do_not_stop_the_simulator() {
        let backend = Arc::new(FlakyBackend::new());
        backend.fail_writes(true);
        let store = Arc::new(VolatileStateStore::new(
            backend.clone(),
            Duration::from_secs(3600),
            3,
        ));
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(simulator(&store).run(cancel.clone()));

        tokio::time::sleep(Duration::from_secs(25)).await;
        backend.fail_writes(false);
        tokio::time::sleep(Duration::from_secs(10)).await;
        cancel.cancel();
        let report = handle.await.unwrap();

        assert_eq!(report.ticks, 3);
        assert_eq!(report.failed_writes, 2);
        assert_eq!(
            store.get_score_snapshot(EventId::new(1)).await.unwrap().total(),
            3
        );
    }
}
