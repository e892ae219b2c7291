//! Session-scoped cache of the static reference hierarchy.
//!
//! A load builds a complete [`Generation`] off to the side and swaps it in
//! under the write lock, so readers see either the whole previous load or
//! the whole new one.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::domain::{Event, EventId, EventPriceState, PriceId, PriceRelation};
use crate::error::Result;
use crate::port::{PriceUpdate, ReferenceSource};

/// Names needed to enrich broadcasts for one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLookup {
    pub event_name: String,
    pub event_code: String,
    pub sport: String,
    pub country: String,
    pub competition: String,
    pub relations: HashMap<PriceId, PriceRelation>,
}

impl EventLookup {
    fn new(event: &Event) -> Self {
        Self {
            event_name: event.name.clone(),
            event_code: event.code.clone(),
            sport: event.sport_name().to_string(),
            country: event.country_name().to_string(),
            competition: event.competition_name().to_string(),
            relations: HashMap::new(),
        }
    }
}

/// Broadcast context for one price of one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceContext {
    pub sport: String,
    pub country: String,
    pub competition: String,
    pub event_name: String,
    pub event_code: String,
    pub relation: PriceRelation,
}

impl PriceContext {
    /// Combine the context with a coefficient change.
    #[must_use]
    pub fn into_update(
        self,
        state: &EventPriceState,
        old_coefficient: Decimal,
        timestamp: DateTime<Utc>,
    ) -> PriceUpdate {
        PriceUpdate {
            sport: self.sport,
            country: self.country,
            competition: self.competition,
            event_name: self.event_name,
            event_code: self.event_code,
            collection_name: self.relation.collection_name,
            collection_code: self.relation.collection_code,
            market_name: self.relation.market_name,
            market_code: self.relation.market_code,
            price_name: self.relation.price_name,
            price_code: self.relation.price_code,
            old_coefficient,
            new_coefficient: state.coefficient,
            coefficient_id: state.id,
            price_id: state.price_id,
            active: state.active,
            timestamp,
        }
    }
}

/// One complete, immutable load of reference data.
#[derive(Debug, Default)]
pub struct Generation {
    number: u64,
    events: HashMap<EventId, Event>,
    lookups: HashMap<EventId, EventLookup>,
}

impl Generation {
    /// Load counter; 0 means nothing has been loaded yet.
    #[must_use]
    pub fn number(&self) -> u64 {
        self.number
    }

    #[must_use]
    pub fn event(&self, event_id: EventId) -> Option<&Event> {
        self.events.get(&event_id)
    }

    /// Ids of every event in this load, in no particular order.
    pub fn event_ids(&self) -> impl Iterator<Item = EventId> + '_ {
        self.events.keys().copied()
    }

    #[must_use]
    pub fn lookup(&self, event_id: EventId) -> Option<&EventLookup> {
        self.lookups.get(&event_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Initial per-event price states produced by a load, used to seed the
/// volatile store.
pub type SeedPrices = HashMap<EventId, Vec<EventPriceState>>;

/// Thread-safe holder of the current [`Generation`].
#[derive(Debug, Default)]
pub struct StaticReferenceCache {
    current: RwLock<Arc<Generation>>,
}

impl StaticReferenceCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every active event and active price relation from `source` and
    /// replace the current generation.
    ///
    /// Both queries run before the lock is taken; if either fails the
    /// previous generation is kept and the error returned. Prices whose
    /// event is not active are dropped.
    pub async fn load(&self, source: &dyn ReferenceSource) -> Result<SeedPrices> {
        let events = source.load_active_events().await?;
        let records = source.load_active_event_prices().await?;

        let mut generation = Generation::default();
        let mut seed: SeedPrices = HashMap::with_capacity(events.len());

        for event in events {
            generation.lookups.insert(event.id, EventLookup::new(&event));
            seed.insert(event.id, Vec::new());
            generation.events.insert(event.id, event);
        }

        let mut dropped = 0usize;
        for record in records {
            let event_id = record.state.event_id;
            let Some(lookup) = generation.lookups.get_mut(&event_id) else {
                dropped += 1;
                continue;
            };
            lookup
                .relations
                .insert(record.price.id, PriceRelation::from(&record.price));
            seed.entry(event_id).or_default().push(record.state);
        }
        if dropped > 0 {
            debug!(dropped, "Skipped prices of inactive events");
        }

        let event_count = generation.events.len();
        let price_count: usize = seed.values().map(Vec::len).sum();

        let number = {
            let mut current = self.current.write();
            generation.number = current.number + 1;
            let number = generation.number;
            *current = Arc::new(generation);
            number
        };

        info!(
            generation = number,
            events = event_count,
            prices = price_count,
            "Reference data loaded"
        );
        Ok(seed)
    }

    /// The current generation. Holding it keeps that load alive even if a
    /// reload swaps in a newer one.
    #[must_use]
    pub fn generation(&self) -> Arc<Generation> {
        Arc::clone(&self.current.read())
    }

    /// Copy of every active event, ordered by id.
    #[must_use]
    pub fn active_events(&self) -> Vec<Event> {
        let generation = self.generation();
        let mut events: Vec<Event> = generation.events.values().cloned().collect();
        events.sort_by_key(|event| event.id);
        events
    }

    #[must_use]
    pub fn event(&self, event_id: EventId) -> Option<Event> {
        self.current.read().events.get(&event_id).cloned()
    }

    /// Number of events in the current generation.
    #[must_use]
    pub fn len(&self) -> usize {
        self.current.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids of every price whose code is in `codes`, across all events.
    #[must_use]
    pub fn price_ids_by_codes(&self, codes: &[&str]) -> HashSet<PriceId> {
        if codes.is_empty() {
            return HashSet::new();
        }
        let generation = self.generation();
        generation
            .lookups
            .values()
            .flat_map(|lookup| lookup.relations.values())
            .filter(|relation| codes.contains(&relation.price_code.as_str()))
            .map(|relation| relation.price_id)
            .collect()
    }

    /// Relation of one price within one event.
    #[must_use]
    pub fn relation(&self, event_id: EventId, price_id: PriceId) -> Option<PriceRelation> {
        let current = self.current.read();
        current.lookups.get(&event_id)?.relations.get(&price_id).cloned()
    }

    /// Broadcast context for a price, or `None` if either the event or the
    /// price is unknown to this generation.
    #[must_use]
    pub fn enrich(&self, event_id: EventId, price_id: PriceId) -> Option<PriceContext> {
        let current = self.current.read();
        let lookup = current.lookups.get(&event_id)?;
        let relation = lookup.relations.get(&price_id)?.clone();
        Some(PriceContext {
            sport: lookup.sport.clone(),
            country: lookup.country.clone(),
            competition: lookup.competition.clone(),
            event_name: lookup.event_name.clone(),
            event_code: lookup.event_code.clone(),
            relation,
        })
    }
}
