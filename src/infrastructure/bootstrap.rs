//! Infrastructure bootstrap helpers for runtime wiring.
//!
//! [`Services`] is built once at process start and hands every component
//! its dependencies explicitly.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use url::Url;

use crate::adapter::outbound::centrifugo::CentrifugoBroadcaster;
use crate::adapter::outbound::memory::MemoryBackend;
use crate::adapter::outbound::redis::RedisBackend;
use crate::adapter::outbound::sqlite::{create_pool, run_migrations, SqliteReferenceStore};
use crate::application::activation::ActivationService;
use crate::application::cache::{StaticReferenceCache, VolatileStateStore};
use crate::application::simulation::SimulationSession;
use crate::error::{ConfigError, Result};
use crate::infrastructure::config::settings::{
    BroadcastConfig, BroadcastKind, Config, DatabaseConfig, VolatileBackendKind, VolatileConfig,
    API_KEY_ENV,
};
use crate::port::outbound::volatile::KeyValueBackend;
use crate::port::{Broadcaster, LogBroadcaster, NullBroadcaster};

/// Open the SQLite pool, apply pending migrations and wrap it in a store.
pub fn init_reference_store(config: &DatabaseConfig) -> Result<Arc<SqliteReferenceStore>> {
    let pool = create_pool(&config.path, config.pool_size)?;
    let applied = run_migrations(&pool)?;
    info!(path = %config.path, applied, "Reference store ready");
    Ok(Arc::new(SqliteReferenceStore::new(pool)))
}

/// Build the configured broadcaster. Does not contact the transport.
pub fn build_broadcaster(config: &BroadcastConfig) -> Result<Arc<dyn Broadcaster>> {
    let broadcaster: Arc<dyn Broadcaster> = match config.kind {
        BroadcastKind::Centrifugo => {
            let url = Url::parse(&config.api_url)?;
            let key = config
                .api_key
                .clone()
                .ok_or(ConfigError::MissingField { field: API_KEY_ENV })?;
            Arc::new(CentrifugoBroadcaster::new(&url, key, config.timeout())?)
        }
        BroadcastKind::Log => Arc::new(LogBroadcaster),
        BroadcastKind::Null => Arc::new(NullBroadcaster),
    };
    Ok(broadcaster)
}

/// Volatile backend selected by `[volatile] backend`.
pub enum VolatileBackend {
    Memory(Arc<MemoryBackend>),
    Redis(Arc<RedisBackend>),
}

impl VolatileBackend {
    /// Build the configured backend. A Redis backend must answer a PING.
    ///
    /// # Errors
    ///
    /// Fails if the Redis server cannot be reached.
    pub async fn connect(config: &VolatileConfig) -> Result<Self> {
        let backend = match config.backend {
            VolatileBackendKind::Memory => Self::Memory(Arc::new(MemoryBackend::new())),
            VolatileBackendKind::Redis => Self::Redis(Arc::new(
                RedisBackend::connect(&config.redis_url, config.version_key.clone()).await?,
            )),
        };
        Ok(backend)
    }

    #[must_use]
    pub fn as_port(&self) -> Arc<dyn KeyValueBackend> {
        match self {
            Self::Memory(backend) => backend.clone(),
            Self::Redis(backend) => backend.clone(),
        }
    }
}

/// Long-lived components shared by every command.
pub struct Services {
    pub config: Config,
    pub reference_store: Arc<SqliteReferenceStore>,
    pub reference: Arc<StaticReferenceCache>,
    pub store: Arc<VolatileStateStore>,
    pub broadcaster: Arc<dyn Broadcaster>,
    pub activation: ActivationService,
    backend: VolatileBackend,
}

impl Services {
    /// Wire every component and verify the broadcaster is reachable.
    ///
    /// # Errors
    ///
    /// Fails if the database cannot be opened or migrated, the broadcaster
    /// cannot be built, or its startup check fails.
    pub async fn init(config: Config) -> Result<Self> {
        let reference_store = init_reference_store(&config.database)?;

        let broadcaster = build_broadcaster(&config.broadcast)?;
        broadcaster.check().await?;
        info!(broadcaster = broadcaster.name(), "Broadcaster ready");

        let backend = VolatileBackend::connect(&config.volatile).await?;
        let store = Arc::new(VolatileStateStore::new(
            backend.as_port(),
            config.volatile.ttl(),
            config.volatile.max_update_attempts,
        ));

        let activation = ActivationService::new(
            reference_store.clone(),
            config.activation.events.clone(),
            config.activation.markets.clone(),
        );

        Ok(Self {
            reference_store,
            reference: Arc::new(StaticReferenceCache::new()),
            store,
            broadcaster,
            activation,
            backend,
            config,
        })
    }

    /// A session over these services. `duration` overrides the configured one.
    #[must_use]
    pub fn session(&self, duration: Option<Duration>) -> SimulationSession {
        SimulationSession::new(
            self.reference_store.clone(),
            Arc::clone(&self.reference),
            Arc::clone(&self.store),
            Arc::clone(&self.broadcaster),
            self.config.simulation.session_settings(duration),
        )
    }

    /// Release volatile state. The pool closes when the last handle drops.
    ///
    /// Redis keeps its keys until their TTL runs out.
    pub fn shutdown(self) {
        match &self.backend {
            VolatileBackend::Memory(memory) => {
                let purged = memory.purge_expired();
                info!(
                    purged,
                    remaining = memory.len(),
                    volatile = self.store.backend_name(),
                    "Services stopped"
                );
            }
            VolatileBackend::Redis(_) => {
                info!(volatile = self.store.backend_name(), "Services stopped");
            }
        }
    }
}
