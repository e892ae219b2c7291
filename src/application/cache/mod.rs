//! Session caches shared by the simulators and the monitor.
//!
//! - [`reference::StaticReferenceCache`]: Immutable-per-session hierarchy and enrichment lookups
//! - [`volatile::VolatileStateStore`]: TTL-bounded price and score state

pub mod reference;
pub mod volatile;

pub use reference::{Generation, PriceContext, StaticReferenceCache};
pub use volatile::VolatileStateStore;
