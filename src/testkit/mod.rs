//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`domain`] - Builders for events and event prices.
//! - [`reference`] - In-memory reference source and recording activation store.
//! - [`backend`] - Key-value backend with injectable failures.
//! - [`broadcast`] - Recording and failing broadcasters.
//! - [`session`] - [`TestSession`](session::TestSession), everything wired over the demo catalog.

pub mod backend;
pub mod broadcast;
pub mod domain;
pub mod reference;
pub mod session;
