//! End-to-end sessions over a real SQLite reference store.

mod support;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use scoreline::adapter::outbound::memory::MemoryBackend;
use scoreline::adapter::outbound::sqlite::seed;
use scoreline::application::activation::{ActivationRequest, ActivationService};
use scoreline::application::cache::{StaticReferenceCache, VolatileStateStore};
use scoreline::application::simulation::{SessionSettings, SimulationSession};
use scoreline::domain::{EventId, PriceId};
use scoreline::port::ActivationStore;
use scoreline::testkit::broadcast::RecordingBroadcaster;
use support::temp_db::TempDb;
use tokio_util::sync::CancellationToken;

struct Harness {
    db: TempDb,
    reference: Arc<StaticReferenceCache>,
    store: Arc<VolatileStateStore>,
    broadcaster: Arc<RecordingBroadcaster>,
    activation: ActivationService,
}

impl Harness {
    async fn new() -> Self {
        let db = TempDb::seeded().await;
        let activation =
            ActivationService::new(db.store(), seed::event_codes(), seed::market_codes());
        Self {
            db,
            reference: Arc::new(StaticReferenceCache::new()),
            store: Arc::new(VolatileStateStore::new(
                Arc::new(MemoryBackend::new()),
                Duration::from_secs(3600),
                5,
            )),
            broadcaster: Arc::new(RecordingBroadcaster::default()),
            activation,
        }
    }

    async fn activate(&self, events: &[&str], markets: &[&str]) {
        let request = ActivationRequest::new(
            events.iter().map(|c| c.to_string()).collect(),
            markets.iter().map(|c| c.to_string()).collect(),
        );
        self.activation.activate(&request).await.unwrap();
    }

    fn session(&self, duration_secs: u64) -> SimulationSession {
        SimulationSession::new(
            self.db.store(),
            Arc::clone(&self.reference),
            Arc::clone(&self.store),
            self.broadcaster.clone(),
            SessionSettings {
                duration: Duration::from_secs(duration_secs),
                simulation_interval: Duration::from_secs(10),
                monitor_interval: Duration::from_secs(3),
                seed: Some(3),
            },
        )
    }
}

fn price_ids(codes: &[&str]) -> HashMap<PriceId, String> {
    let (_, records) = seed::demo_catalog();
    records
        .into_iter()
        .filter(|record| codes.contains(&record.price.code.as_str()))
        .map(|record| (record.price.id, record.price.code))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn activated_session_publishes_and_persists() {
    let harness = Harness::new().await;
    harness
        .activate(&["MA", "BB"], &["1X2", "OU5", "OU15", "BTTS"])
        .await;

    let report = harness.session(35).run(CancellationToken::new()).await.unwrap();

    assert_eq!(report.events, 2);
    assert_eq!(report.goals(), 6);
    assert_eq!(report.persisted_scores, 2);

    let updates = harness.broadcaster.updates();
    assert!(!updates.is_empty());
    let markets: HashSet<String> = updates.iter().map(|u| u.market_code.clone()).collect();
    assert!(markets.is_subset(
        &["1X2", "OU5", "OU15", "BTTS"]
            .into_iter()
            .map(String::from)
            .collect()
    ));
    assert!(updates
        .iter()
        .any(|u| u.channel() == "manutdvsarsenal_main_1x2"));
    assert!(updates
        .iter()
        .any(|u| u.channel() == "barcelonavsbayern_goals_ou5"));

    // Three goals each: the 0.5 and 1.5 lines are closed in the store.
    let closed = price_ids(&["O5", "U5", "O15", "U15"]);
    for sim in &report.simulators {
        let score = harness.db.store().score(sim.event_id).await.unwrap().unwrap();
        assert_eq!(score, sim.final_score);
        assert_eq!(score.total(), 3);

        let stored = harness.db.store().event_prices(sim.event_id).await.unwrap();
        for state in stored.iter().filter(|s| closed.contains_key(&s.price_id)) {
            assert!(!state.active, "{} still active", closed[&state.price_id]);
        }

        let live = harness.store.get_event_prices(sim.event_id).await.unwrap();
        for state in &live {
            let persisted = stored.iter().find(|s| s.id == state.id).unwrap();
            assert_eq!(persisted.coefficient, state.coefficient);
            assert_eq!(persisted.active, state.active);
        }
    }
}

#[tokio::test(start_paused = true)]
async fn only_activated_events_are_simulated() {
    let harness = Harness::new().await;
    harness.activate(&["MA"], &["1X2"]).await;

    let report = harness.session(12).run(CancellationToken::new()).await.unwrap();

    assert_eq!(report.events, 1);
    assert!(harness
        .broadcaster
        .updates()
        .iter()
        .all(|u| u.event_code == "MA" && u.market_code == "1X2"));

    let bayern = EventId::new(2);
    let untouched = harness.db.store().score(bayern).await.unwrap().unwrap();
    assert_eq!(untouched.total(), 0);
}

#[tokio::test]
async fn rejected_activation_leaves_store_alone() {
    let harness = Harness::new().await;
    let before = harness.db.store().list_active_events().await.unwrap();

    let request = ActivationRequest::new(vec!["MA".into(), "XX".into()], vec!["1X2".into()]);
    assert!(harness.activation.activate(&request).await.is_err());

    let after = harness.db.store().list_active_events().await.unwrap();
    assert_eq!(before, after);
    assert_eq!(after.len(), 5);
}

#[tokio::test(start_paused = true)]
async fn reload_starts_a_new_generation_from_kickoff() {
    let harness = Harness::new().await;
    harness.activate(&["MA", "JM"], &["1X2", "BTTS"]).await;

    let first = harness.session(25).run(CancellationToken::new()).await.unwrap();
    assert_eq!(first.generation, 1);
    assert!(first.simulators.iter().all(|sim| sim.final_score.total() == 2));

    harness.activate(&["JM"], &["1X2"]).await;
    let second = harness.session(12).run(CancellationToken::new()).await.unwrap();

    assert_eq!(second.generation, 2);
    assert_eq!(second.events, 1);
    assert_eq!(second.simulators[0].final_score.total(), 1);
    assert_eq!(harness.reference.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn deactivated_events_lose_volatile_state() {
    let harness = Harness::new().await;
    harness.activate(&["MA", "JM"], &["1X2", "BTTS"]).await;
    harness.session(25).run(CancellationToken::new()).await.unwrap();

    let manutd = EventId::new(1);
    assert!(harness.store.get_event_prices(manutd).await.is_ok());
    assert_eq!(
        harness.store.get_score_snapshot(manutd).await.unwrap().total(),
        2
    );

    harness.activate(&["JM"], &["1X2"]).await;
    let second = harness.session(12).run(CancellationToken::new()).await.unwrap();
    let juventus = second.simulators[0].event_id;

    assert!(harness
        .store
        .get_event_prices(manutd)
        .await
        .unwrap_err()
        .is_not_found());
    assert!(harness
        .store
        .get_score_snapshot(manutd)
        .await
        .unwrap_err()
        .is_not_found());
    assert!(harness.store.get_event_prices(juventus).await.is_ok());
    assert_eq!(
        harness.store.get_score_snapshot(juventus).await.unwrap(),
        second.simulators[0].final_score
    );
}
