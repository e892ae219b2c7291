//! Domain validation errors.
//!
//! Returned when a value would break one of the model invariants, e.g. a
//! score snapshot whose total does not match its team scores.

use thiserror::Error;

use super::id::EventId;

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A snapshot's total must equal the sum of both team scores.
    #[error("score for event {event_id}: total {total} != {team1} + {team2}")]
    InconsistentTotal {
        event_id: EventId,
        team1: u32,
        team2: u32,
        total: u32,
    },

    /// Market code outside the supported families (`1X2`, `OU5`..`OU45`, `BTTS`).
    #[error("unsupported market code: {0}")]
    UnsupportedMarket(String),
}
