//! Engine wiring for the HTTP layer: record store backend, bus, stock catalog.

use std::sync::Arc;

use serde_json::Value as JsonValue;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use inkworks_events::{EventEnvelope, InMemoryEventBus};
use inkworks_infra::{
    Engine, EngineConfig, InMemoryRecordStore, InMemoryStockCatalog, PostgresRecordStore,
    RecordStore, StoreError,
};

use crate::config::{ConfigError, StorageBackend, StorageConfig};

pub type AppEventBus = Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>;
pub type AppEngine = Engine<Arc<dyn RecordStore>, AppEventBus>;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("database connection failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("schema setup failed: {0}")]
    Schema(#[from] StoreError),
}

pub struct AppServices {
    pub engine: AppEngine,
    pub catalog: Arc<InMemoryStockCatalog>,
}

impl AppServices {
    pub fn new(store: Arc<dyn RecordStore>, engine_config: EngineConfig) -> Self {
        let catalog = Arc::new(InMemoryStockCatalog::new());
        let bus: AppEventBus = Arc::new(InMemoryEventBus::new());
        let engine = Engine::new(store, bus, catalog.clone(), engine_config);
        Self { engine, catalog }
    }

    /// In-memory store; used by tests and local development.
    pub fn in_memory(engine_config: EngineConfig) -> Self {
        Self::new(Arc::new(InMemoryRecordStore::new()), engine_config)
    }
}

pub async fn build_services(
    storage: &StorageConfig,
    engine_config: EngineConfig,
) -> Result<AppServices, BootstrapError> {
    match storage.backend {
        StorageBackend::Memory => {
            tracing::info!("using in-memory record store");
            Ok(AppServices::in_memory(engine_config))
        }
        StorageBackend::Postgres => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(storage.database_url()?)
                .await?;
            let store = PostgresRecordStore::new(pool);
            store.ensure_schema().await?;
            tracing::info!("using postgres record store");
            Ok(AppServices::new(Arc::new(store), engine_config))
        }
    }
}
