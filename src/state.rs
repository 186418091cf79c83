use std::sync::Arc;

use sqlx::PgPool;

use crate::config::CONFIG;
use crate::database::PgStore;
use crate::tenancy::store::{CounterStore, EntityStore};
use crate::tenancy::{OwnershipValidator, QuotaTracker, ReferenceGraphValidator};

/// Shared application state. One pool, one store, and the tenancy
/// validators built over it; cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub entities: Arc<dyn EntityStore>,
    pub ownership: OwnershipValidator,
    pub refs: ReferenceGraphValidator,
    pub quota: QuotaTracker,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let store = Arc::new(PgStore::new(pool.clone()));
        Self::with_stores(pool, store.clone(), store)
    }

    pub fn with_stores(
        pool: PgPool,
        entities: Arc<dyn EntityStore>,
        counters: Arc<dyn CounterStore>,
    ) -> Self {
        let ownership = OwnershipValidator::new(entities.clone());
        let refs = ReferenceGraphValidator::new(ownership.clone());
        let quota = QuotaTracker::new(
            counters,
            CONFIG.quota.warning_pct,
            CONFIG.quota.api_window_secs,
        );
        Self {
            pool,
            entities,
            ownership,
            refs,
            quota,
        }
    }
}
