//! Canonical data model shared by every component.
//!
//! - [`event`] - Static event hierarchy (sport, country, competition, teams)
//! - [`market`] - Market collections, markets, prices and market families
//! - [`pricing`] - Per-event coefficient state
//! - [`score`] - Live score snapshots
//! - [`id`] - Typed row identifiers
//! - [`error`] - Invariant violations

pub mod error;
pub mod event;
pub mod id;
pub mod market;
pub mod pricing;
pub mod score;

pub use event::{Competition, Country, Event, Sport, Team};
pub use id::{EventId, EventPriceId, PriceId};
pub use market::{Market, MarketCollection, MarketFamily, Price, PriceRelation};
pub use pricing::{EventPriceRecord, EventPriceState};
pub use score::{ScoreSnapshot, Side};
