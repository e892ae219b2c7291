//! Outbound adapters (driven side).

pub mod centrifugo;
pub mod memory;
pub mod redis;
pub mod sqlite;
