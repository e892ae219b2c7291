//! Market closing rules.
//!
//! Once a line is decided by the score its prices stop trading. The rules
//! are cumulative: a total of three goals closes the 0.5, 1.5 and 2.5 lines
//! in one pass.

use std::sync::Arc;

use tracing::{debug, info};

use crate::application::cache::{StaticReferenceCache, VolatileStateStore};
use crate::domain::{EventId, ScoreSnapshot};
use crate::error::StoreError;

/// Over/under price codes closed once the total reaches the threshold.
const TOTAL_THRESHOLDS: [(u32, [&str; 2]); 5] = [
    (1, ["U5", "O5"]),
    (2, ["U15", "O15"]),
    (3, ["U25", "O25"]),
    (4, ["U35", "O35"]),
    (5, ["U45", "O45"]),
];

/// Closed once both teams have scored.
const BOTH_SCORED: [&str; 2] = ["BTTS_Y", "BTTS_N"];

/// Price codes that must be inactive for `score`.
#[must_use]
pub fn codes_to_deactivate(score: &ScoreSnapshot) -> Vec<&'static str> {
    let mut codes: Vec<&'static str> = TOTAL_THRESHOLDS
        .iter()
        .filter(|(threshold, _)| score.total() >= *threshold)
        .flat_map(|(_, codes)| codes.iter().copied())
        .collect();
    if score.both_scored() {
        codes.extend(BOTH_SCORED);
    }
    codes
}

/// Outcome of one lifecycle pass for an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeactivationReport {
    pub event_id: EventId,
    pub codes: Vec<&'static str>,
    /// Price ids the codes resolved to.
    pub resolved: usize,
    /// Prices flipped from active to inactive by this pass.
    pub deactivated: usize,
}

/// Applies the closing rules to an event's volatile price list.
pub struct MarketLifecycleEngine {
    reference: Arc<StaticReferenceCache>,
    store: Arc<VolatileStateStore>,
}

impl MarketLifecycleEngine {
    #[must_use]
    pub fn new(reference: Arc<StaticReferenceCache>, store: Arc<VolatileStateStore>) -> Self {
        Self { reference, store }
    }

    /// Deactivate every price the score has decided.
    ///
    /// Already inactive prices are left alone, so running this twice for the
    /// same score changes nothing the second time.
    pub async fn apply(
        &self,
        event_id: EventId,
        score: &ScoreSnapshot,
    ) -> Result<DeactivationReport, StoreError> {
        let codes = codes_to_deactivate(score);
        let mut report = DeactivationReport {
            event_id,
            codes,
            resolved: 0,
            deactivated: 0,
        };
        if report.codes.is_empty() {
            return Ok(report);
        }

        let price_ids = self.reference.price_ids_by_codes(&report.codes);
        report.resolved = price_ids.len();
        if price_ids.is_empty() {
            debug!(%event_id, codes = ?report.codes, "No prices match closing codes");
            return Ok(report);
        }

        report.deactivated = self
            .store
            .deactivate_event_prices(event_id, &price_ids)
            .await?;
        if report.deactivated > 0 {
            info!(
                %event_id,
                total = score.total(),
                deactivated = report.deactivated,
                "Closed decided markets"
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::session::TestSession;
    use std::collections::HashSet;

    fn score(team1: u32, team2: u32) -> ScoreSnapshot {
        ScoreSnapshot::new(EventId::new(1), team1, team2)
    }

    fn set(codes: Vec<&'static str>) -> HashSet<&'static str> {
        codes.into_iter().collect()
    }

    #[test]
    fn test_kickoff_closes_nothing() {
        assert!(codes_to_deactivate(&score(0, 0)).is_empty());
    }

    #[test]
    fn test_first_goal_closes_lowest_line() {
        assert_eq!(set(codes_to_deactivate(&score(1, 0))), set(vec!["U5", "O5"]));
    }

    #[test]
    fn test_rules_are_cumulative() {
        assert_eq!(
            set(codes_to_deactivate(&score(2, 1))),
            set(vec!["U5", "O5", "U15", "O15", "U25", "O25", "BTTS_Y", "BTTS_N"])
        );
    }

    #[test]
    fn test_codes_grow_with_score() {
        let mut previous = HashSet::new();
        for (team1, team2) in [(0, 0), (1, 0), (1, 1), (2, 1), (3, 1), (3, 2), (4, 2)] {
            let current = set(codes_to_deactivate(&score(team1, team2)));
            assert!(current.is_superset(&previous));
            previous = current;
        }
        assert_eq!(previous.len(), 12);
    }

    #[tokio::test]
    async fn test_apply_deactivates_decided_prices() {
        let session = TestSession::seeded().await;
        let event_id = session.first_event_id();

        let report = session
            .lifecycle()
            .apply(event_id, &ScoreSnapshot::new(event_id, 1, 1))
            .await
            .unwrap();

        let prices = session.store.get_event_prices(event_id).await.unwrap();
        let inactive: HashSet<String> = prices
            .iter()
            .filter(|p| !p.active)
            .map(|p| session.price_code(event_id, p.price_id))
            .collect();

        assert_eq!(report.deactivated, 6);
        assert_eq!(
            inactive,
            ["U5", "O5", "U15", "O15", "BTTS_Y", "BTTS_N"]
                .into_iter()
                .map(String::from)
                .collect()
        );
    }

    #[tokio::test]
    async fn test_apply_is_idempotent() {
        let session = TestSession::seeded().await;
        let event_id = session.first_event_id();
        let score = ScoreSnapshot::new(event_id, 1, 0);
        let lifecycle = session.lifecycle();

        let first = lifecycle.apply(event_id, &score).await.unwrap();
        let snapshot = session.store.get_event_prices(event_id).await.unwrap();
        let second = lifecycle.apply(event_id, &score).await.unwrap();

        assert_eq!(first.deactivated, 2);
        assert_eq!(second.deactivated, 0);
        assert_eq!(
            session.store.get_event_prices(event_id).await.unwrap(),
            snapshot
        );
    }

    #[tokio::test]
    async fn test_apply_on_missing_prices_is_not_found() {
        let session = TestSession::seeded().await;
        let err = session
            .lifecycle()
            .apply(EventId::new(999), &ScoreSnapshot::new(EventId::new(999), 1, 0))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
