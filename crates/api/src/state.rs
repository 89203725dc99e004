use std::sync::Arc;

use sqlx::PgPool;
use zeroapp_core::schema::EntityRegistry;
use zeroapp_core::store::RecordStore;

use crate::config::AppConfig;

/// Shared application state, passed to all handlers via Axum's `State`
/// extractor. Wrapped in `Arc` so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    store: RecordStore,
    registry: EntityRegistry,
    config: AppConfig,
}

impl AppState {
    pub fn new(pool: PgPool, config: AppConfig, registry: EntityRegistry) -> Self {
        Self {
            inner: Arc::new(InnerState {
                store: RecordStore::new(pool),
                registry,
                config,
            }),
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.inner.store
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.inner.registry
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }
}
