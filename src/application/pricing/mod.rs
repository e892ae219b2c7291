//! Repricing: coefficient bands and market closing rules.
//!
//! - [`calculator`]: Score → coefficient for each market family
//! - [`lifecycle::MarketLifecycleEngine`]: Deactivates prices the score has decided

pub mod calculator;
pub mod lifecycle;

pub use lifecycle::{codes_to_deactivate, DeactivationReport, MarketLifecycleEngine};
