//! Scoreline - live sports event simulation with real-time repricing.
//!
//! Each active event gets its own score simulator. A central monitor notices
//! score changes, closes the markets a score has decided, reprices the rest
//! and publishes every new coefficient.
//!
//! # Architecture
//!
//! The crate follows a hexagonal layout:
//!
//! - **`domain`** - Events, markets, prices, coefficients and score snapshots
//! - **`port`** - Traits for the reference store, key-value backend and broadcaster
//! - **`application`** - Caches, pricing rules, simulators, monitor, session, activation
//! - **`adapter`** - SQLite, in-memory backend, Centrifugo, CLI
//! - **`infrastructure`** - Configuration, logging and service wiring
//!
//! # Example
//!
//! ```no_run
//! use scoreline::infrastructure::bootstrap::Services;
//! use scoreline::infrastructure::config::settings::Config;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> scoreline::error::Result<()> {
//! let services = Services::init(Config::load("config.toml")?).await?;
//! let report = services.session(None).run(CancellationToken::new()).await?;
//! println!("{} goals", report.goals());
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
