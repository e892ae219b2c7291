//! Mutable pricing unit: one coefficient for one price of one event.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{EventId, EventPriceId, PriceId};
use super::market::Price;

/// Coefficient and active flag of an event/price pair.
///
/// Serialized in the compact form kept in the volatile store:
/// `{id, event_id, price_id, coefficient, active}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPriceState {
    pub id: EventPriceId,
    pub event_id: EventId,
    pub price_id: PriceId,
    #[serde(with = "rust_decimal::serde::float")]
    pub coefficient: Decimal,
    pub active: bool,
}

impl EventPriceState {
    #[must_use]
    pub fn new(
        id: EventPriceId,
        event_id: EventId,
        price_id: PriceId,
        coefficient: Decimal,
        active: bool,
    ) -> Self {
        Self {
            id,
            event_id,
            price_id,
            coefficient,
            active,
        }
    }

    /// Clear the active flag. Returns true if it was set.
    ///
    /// There is no counterpart: a deactivated price stays inactive for the
    /// rest of the session.
    pub fn deactivate(&mut self) -> bool {
        std::mem::replace(&mut self.active, false)
    }
}

/// Event price as loaded from the reference store, with its full market
/// chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventPriceRecord {
    pub state: EventPriceState,
    pub price: Price,
}
