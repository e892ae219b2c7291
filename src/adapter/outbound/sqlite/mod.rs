//! SQLite persistence adapters.
//!
//! Provides the reference store (hierarchy, activation, end-of-session
//! write-back) and the demo seed using Diesel ORM.

pub mod database;
pub mod reference;
pub mod seed;

pub use database::connection::{create_pool, run_migrations, DbPool};
pub use reference::SqliteReferenceStore;
