//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │      Application        │
//!                    │  caches, pricing, sim   │
//!                    └───────────┬─────────────┘
//!          ┌─────────────────────┼─────────────────────┐
//!          ▼                     ▼                     ▼
//!   ┌─────────────┐       ┌─────────────┐       ┌─────────────┐
//!   │  Reference  │       │  Key-value  │       │ Broadcaster │
//!   │   (SQLite)  │       │  (volatile) │       │ (Centrifugo)│
//!   └─────────────┘       └─────────────┘       └─────────────┘
//! ```
//!
//! - [`ReferenceSource`], [`ActivationStore`] - Persistent reference data
//! - [`KeyValueBackend`] - TTL-bounded volatile state
//! - [`Broadcaster`] - Publishing price updates

pub mod outbound;

pub use outbound::broadcast::{Broadcaster, LogBroadcaster, NullBroadcaster, PriceUpdate};
pub use outbound::reference::{ActivationStore, EventSummary, ReferenceSource};
pub use outbound::volatile::{KeyValueBackend, Versioned};
