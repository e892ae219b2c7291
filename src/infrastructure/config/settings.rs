//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all application settings.
//! Configuration is loaded from a TOML file with an environment variable
//! override for the broadcast API key (`CENTRIFUGO_API_KEY`).
//!
//! # Example
//!
//! ```no_run
//! use scoreline::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use super::logging::LoggingConfig;
use crate::adapter::outbound::sqlite::seed;
use crate::application::simulation::SessionSettings;
use crate::error::{ConfigError, Result};

/// Environment variable holding the broadcast API key.
pub const API_KEY_ENV: &str = "CENTRIFUGO_API_KEY";

/// Reference store settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    pub path: String,
    /// Maximum pooled connections.
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "scoreline.db".into(),
            pool_size: 4,
        }
    }
}

/// Where volatile state lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolatileBackendKind {
    /// In-process map. State dies with the process.
    #[default]
    Memory,
    /// Redis server at `redis_url`.
    Redis,
}

/// Volatile state settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VolatileConfig {
    pub backend: VolatileBackendKind,
    /// Lifetime of every price list and score snapshot.
    pub ttl_secs: u64,
    /// Compare-and-set attempts before a price update gives up.
    pub max_update_attempts: u32,
    pub redis_url: String,
    /// Counter key every Redis write draws its version from.
    pub version_key: String,
}

impl VolatileConfig {
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for VolatileConfig {
    fn default() -> Self {
        Self {
            backend: VolatileBackendKind::default(),
            ttl_secs: 1800,
            max_update_attempts: 5,
            redis_url: "redis://127.0.0.1:6379".into(),
            version_key: "scoreline:version".into(),
        }
    }
}

/// Session timing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub duration_secs: u64,
    /// Seconds between goals on each event.
    pub simulation_interval_secs: u64,
    /// Seconds between monitor cycles.
    pub monitor_interval_secs: u64,
    /// Fixed RNG seed for reproducible runs.
    pub seed: Option<u64>,
}

impl SimulationConfig {
    /// Session settings, with `duration` overriding the configured one.
    #[must_use]
    pub fn session_settings(&self, duration: Option<Duration>) -> SessionSettings {
        SessionSettings {
            duration: duration.unwrap_or(Duration::from_secs(self.duration_secs)),
            simulation_interval: Duration::from_secs(self.simulation_interval_secs),
            monitor_interval: Duration::from_secs(self.monitor_interval_secs),
            seed: self.seed,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            duration_secs: 55,
            simulation_interval_secs: 10,
            monitor_interval_secs: 3,
            seed: None,
        }
    }
}

/// Broadcast transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BroadcastKind {
    /// Centrifugo server HTTP API.
    #[default]
    Centrifugo,
    /// Log every update.
    Log,
    /// Drop every update.
    Null,
}

/// Broadcast settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BroadcastConfig {
    pub kind: BroadcastKind,
    pub api_url: String,
    /// Loaded from `CENTRIFUGO_API_KEY`, never from the file. Required only
    /// when a Centrifugo broadcaster is built.
    #[serde(skip)]
    pub api_key: Option<String>,
    pub timeout_ms: u64,
}

impl BroadcastConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            kind: BroadcastKind::default(),
            api_url: "http://localhost:8000".into(),
            api_key: None,
            timeout_ms: 5000,
        }
    }
}

/// Codes an activation request may name.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ActivationConfig {
    pub events: Vec<String>,
    pub markets: Vec<String>,
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self {
            events: seed::event_codes(),
            markets: seed::market_codes(),
        }
    }
}

/// Main application configuration.
///
/// Every section is optional; an empty file yields the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// SQLite reference store.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Volatile price and score state.
    #[serde(default)]
    pub volatile: VolatileConfig,

    /// Session timing.
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Where price updates go.
    #[serde(default)]
    pub broadcast: BroadcastConfig,

    /// Allowed activation codes.
    #[serde(default)]
    pub activation: ActivationConfig,
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// Loads the broadcast API key from the `CENTRIFUGO_API_KEY` environment
    /// variable.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.broadcast.api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML content is malformed
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Initialize logging from the `[logging]` section.
    pub fn init_logging(&self) {
        self.logging.init();
    }

    fn validate(&self) -> Result<()> {
        if self.database.path.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "database.path",
            }
            .into());
        }
        if self.volatile.ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "volatile.ttl_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.volatile.max_update_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "volatile.max_update_attempts",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.volatile.backend == VolatileBackendKind::Redis {
            let url =
                Url::parse(&self.volatile.redis_url).map_err(|e| ConfigError::InvalidValue {
                    field: "volatile.redis_url",
                    reason: e.to_string(),
                })?;
            if !matches!(url.scheme(), "redis" | "rediss" | "redis+unix") {
                return Err(ConfigError::InvalidValue {
                    field: "volatile.redis_url",
                    reason: format!("unsupported scheme {}", url.scheme()),
                }
                .into());
            }
            if self.volatile.version_key.trim().is_empty() {
                return Err(ConfigError::MissingField {
                    field: "volatile.version_key",
                }
                .into());
            }
        }

        let sim = &self.simulation;
        if sim.duration_secs == 0 || sim.simulation_interval_secs == 0 || sim.monitor_interval_secs == 0
        {
            return Err(ConfigError::InvalidValue {
                field: "simulation",
                reason: "duration and intervals must be greater than 0".to_string(),
            }
            .into());
        }
        if self.volatile.ttl_secs <= sim.duration_secs {
            return Err(ConfigError::InvalidValue {
                field: "volatile.ttl_secs",
                reason: "must outlive simulation.duration_secs".to_string(),
            }
            .into());
        }

        if self.broadcast.kind == BroadcastKind::Centrifugo {
            Url::parse(&self.broadcast.api_url).map_err(|e| ConfigError::InvalidValue {
                field: "broadcast.api_url",
                reason: e.to_string(),
            })?;
            if self.broadcast.timeout_ms == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "broadcast.timeout_ms",
                    reason: "must be greater than 0".to_string(),
                }
                .into());
            }
        }

        if self.activation.events.is_empty() {
            return Err(ConfigError::MissingField {
                field: "activation.events",
            }
            .into());
        }
        if self.activation.markets.is_empty() {
            return Err(ConfigError::MissingField {
                field: "activation.markets",
            }
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG_BROADCAST: &str = "[broadcast]\nkind = \"log\"\n";

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config = Config::parse_toml(LOG_BROADCAST).unwrap();

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.database.path, "scoreline.db");
        assert_eq!(config.volatile.ttl(), Duration::from_secs(1800));
        assert_eq!(config.volatile.backend, VolatileBackendKind::Memory);
        assert_eq!(config.simulation.monitor_interval_secs, 3);
        assert_eq!(config.activation.events.len(), 5);
        assert_eq!(config.activation.markets.len(), 7);
    }

    #[test]
    fn test_session_settings_honor_override() {
        let config = Config::parse_toml(LOG_BROADCAST).unwrap();

        let default = config.simulation.session_settings(None);
        assert_eq!(default, SessionSettings::default());

        let short = config
            .simulation
            .session_settings(Some(Duration::from_secs(20)));
        assert_eq!(short.duration, Duration::from_secs(20));
        assert_eq!(short.simulation_interval, Duration::from_secs(10));
    }

    #[test]
    fn test_full_file_parses() {
        let toml = r#"
            [logging]
            level = "debug"
            format = "json"

            [database]
            path = "/tmp/ref.db"
            pool_size = 2

            [volatile]
            ttl_secs = 600
            max_update_attempts = 3

            [simulation]
            duration_secs = 30
            simulation_interval_secs = 5
            monitor_interval_secs = 1
            seed = 7

            [broadcast]
            kind = "null"

            [activation]
            events = ["MA"]
            markets = ["1X2", "BTTS"]
        "#;
        let config = Config::parse_toml(toml).unwrap();

        assert_eq!(config.logging.format, "json");
        assert_eq!(config.database.pool_size, 2);
        assert_eq!(config.volatile.max_update_attempts, 3);
        assert_eq!(config.simulation.seed, Some(7));
        assert_eq!(config.broadcast.kind, BroadcastKind::Null);
        assert_eq!(config.activation.markets, vec!["1X2", "BTTS"]);
    }

    #[test]
    fn test_rejects_zero_interval() {
        let toml = "[broadcast]\nkind = \"log\"\n[simulation]\nmonitor_interval_secs = 0\n";
        assert!(Config::parse_toml(toml).is_err());
    }

    #[test]
    fn test_rejects_ttl_shorter_than_session() {
        let toml = "[broadcast]\nkind = \"log\"\n[volatile]\nttl_secs = 30\n";
        let err = Config::parse_toml(toml).unwrap_err();
        assert!(err.to_string().contains("volatile.ttl_secs"));
    }

    #[test]
    fn test_selects_redis_backend() {
        let toml = "[broadcast]\nkind = \"log\"\n[volatile]\nbackend = \"redis\"\nredis_url = \"redis://cache:6380/2\"\n";
        let config = Config::parse_toml(toml).unwrap();

        assert_eq!(config.volatile.backend, VolatileBackendKind::Redis);
        assert_eq!(config.volatile.redis_url, "redis://cache:6380/2");
        assert_eq!(config.volatile.version_key, "scoreline:version");
    }

    #[test]
    fn test_rejects_redis_backend_with_bad_url() {
        let toml = "[broadcast]\nkind = \"log\"\n[volatile]\nbackend = \"redis\"\nredis_url = \"http://cache:6379\"\n";
        let err = Config::parse_toml(toml).unwrap_err();
        assert!(err.to_string().contains("volatile.redis_url"));

        let toml = "[broadcast]\nkind = \"log\"\n[volatile]\nbackend = \"redis\"\nversion_key = \" \"\n";
        assert!(Config::parse_toml(toml).is_err());
    }

    #[test]
    fn test_memory_backend_ignores_redis_settings() {
        let toml = "[broadcast]\nkind = \"log\"\n[volatile]\nredis_url = \"not a url\"\n";
        assert!(Config::parse_toml(toml).is_ok());
    }

    #[test]
    fn test_rejects_bad_api_url() {
        let toml = "[broadcast]\nkind = \"centrifugo\"\napi_url = \"not a url\"\n";
        assert!(Config::parse_toml(toml).is_err());
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = Config::parse_toml("[logging\nlevel = ").unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Config(ConfigError::Parse(_))
        ));
    }
}
