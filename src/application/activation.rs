//! Activation of events and markets for the next session.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::info;

use crate::error::{ActivationError, Result};
use crate::port::{ActivationStore, EventSummary};

/// Which events and markets to run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationRequest {
    pub event_codes: Vec<String>,
    pub market_codes: Vec<String>,
}

impl ActivationRequest {
    #[must_use]
    pub fn new(event_codes: Vec<String>, market_codes: Vec<String>) -> Self {
        Self {
            event_codes,
            market_codes,
        }
    }
}

/// Rows touched by an activation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivationReport {
    pub prices: usize,
    pub markets: usize,
    pub events: usize,
}

/// Validates requests against allow-lists and applies them to the store.
pub struct ActivationService {
    store: Arc<dyn ActivationStore>,
    allowed_events: HashSet<String>,
    allowed_markets: HashSet<String>,
}

impl ActivationService {
    #[must_use]
    pub fn new(
        store: Arc<dyn ActivationStore>,
        allowed_events: impl IntoIterator<Item = String>,
        allowed_markets: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            store,
            allowed_events: allowed_events.into_iter().collect(),
            allowed_markets: allowed_markets.into_iter().collect(),
        }
    }

    /// Check every code in `request` against the allow-lists.
    pub fn validate(&self, request: &ActivationRequest) -> std::result::Result<(), ActivationError> {
        if request.event_codes.is_empty() {
            return Err(ActivationError::NoEvents);
        }
        if request.market_codes.is_empty() {
            return Err(ActivationError::NoMarkets);
        }
        if let Some(code) = request
            .event_codes
            .iter()
            .find(|code| !self.allowed_events.contains(*code))
        {
            return Err(ActivationError::UnknownEventCode(code.clone()));
        }
        if let Some(code) = request
            .market_codes
            .iter()
            .find(|code| !self.allowed_markets.contains(*code))
        {
            return Err(ActivationError::UnknownMarketCode(code.clone()));
        }
        Ok(())
    }

    /// Validate, then reactivate every event price and mark exactly the
    /// requested markets and events active. Scores of the activated events
    /// are reset to 0–0.
    pub async fn activate(&self, request: &ActivationRequest) -> Result<ActivationReport> {
        self.validate(request)?;

        let report = ActivationReport {
            prices: self.store.activate_event_prices().await?,
            markets: self.store.activate_markets(&request.market_codes).await?,
            events: self.store.activate_events(&request.event_codes).await?,
        };
        info!(
            events = ?request.event_codes,
            markets = ?request.market_codes,
            prices = report.prices,
            "Activated"
        );
        Ok(report)
    }

    /// Events currently marked active.
    pub async fn active_events(&self) -> Result<Vec<EventSummary>> {
        self.store.list_active_events().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::testkit::reference::RecordingActivationStore;

    fn codes(list: &[&str]) -> Vec<String> {
        list.iter().map(|code| (*code).to_string()).collect()
    }

    fn service(store: Arc<RecordingActivationStore>) -> ActivationService {
        ActivationService::new(store, codes(&["MA", "BB"]), codes(&["1X2", "BTTS", "OU25"]))
    }

    #[test]
    fn test_rejects_empty_requests() {
        let service = service(Arc::new(RecordingActivationStore::default()));

        let no_events = ActivationRequest::new(vec![], codes(&["1X2"]));
        let no_markets = ActivationRequest::new(codes(&["MA"]), vec![]);

        assert_eq!(service.validate(&no_events), Err(ActivationError::NoEvents));
        assert_eq!(service.validate(&no_markets), Err(ActivationError::NoMarkets));
    }

    #[test]
    fn test_rejects_unknown_codes() {
        let service = service(Arc::new(RecordingActivationStore::default()));

        let bad_event = ActivationRequest::new(codes(&["MA", "ZZ"]), codes(&["1X2"]));
        let bad_market = ActivationRequest::new(codes(&["MA"]), codes(&["CS"]));

        assert_eq!(
            service.validate(&bad_event),
            Err(ActivationError::UnknownEventCode("ZZ".into()))
        );
        assert_eq!(
            service.validate(&bad_market),
            Err(ActivationError::UnknownMarketCode("CS".into()))
        );
    }

    #[tokio::test]
    async fn test_invalid_request_touches_nothing() {
        let store = Arc::new(RecordingActivationStore::default());
        let service = service(Arc::clone(&store));

        let err = service
            .activate(&ActivationRequest::new(codes(&["ZZ"]), codes(&["1X2"])))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Activation(_)));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_activation_order() {
        let store = Arc::new(RecordingActivationStore::default());
        let service = service(Arc::clone(&store));

        service
            .activate(&ActivationRequest::new(codes(&["MA"]), codes(&["1X2", "BTTS"])))
            .await
            .unwrap();

        assert_eq!(
            store.calls(),
            vec![
                "prices".to_string(),
                "markets:1X2,BTTS".to_string(),
                "events:MA".to_string()
            ]
        );
    }
}
