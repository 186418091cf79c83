use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::tenancy::ownership::EntityKind;
use crate::tenancy::quota::CounterKind;
use crate::tenancy::store::{CounterStore, Counters, EntityRef, EntityStore, StoreError, TenantRef};

/// In-memory implementation of the storage seams. Backs the test suites
/// and `--local` development runs; production uses `PgStore`.
#[derive(Default)]
pub struct MemoryStore {
    entities: Mutex<HashMap<(EntityKind, Uuid), EntityRef>>,
    tenants: Mutex<HashMap<Uuid, TenantRef>>,
    counters: Mutex<HashMap<Uuid, Counters>>,
}

fn locked<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_entity(&self, kind: EntityKind, id: Uuid, tenant_id: Option<Uuid>) {
        locked(&self.entities).insert((kind, id), EntityRef { id, tenant_id });
    }

    pub fn remove_entity(&self, kind: EntityKind, id: Uuid) {
        locked(&self.entities).remove(&(kind, id));
    }

    pub fn put_tenant(&self, tenant: TenantRef) {
        locked(&self.tenants).insert(tenant.id, tenant);
    }

    pub fn set_window_start(&self, tenant_id: Uuid, started_at: DateTime<Utc>) {
        let mut counters = locked(&self.counters);
        let entry = counters
            .entry(tenant_id)
            .or_insert_with(|| Counters::empty(started_at));
        entry.api_window_started_at = started_at;
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn get_entity(&self, kind: EntityKind, id: Uuid) -> Result<Option<EntityRef>, StoreError> {
        Ok(locked(&self.entities).get(&(kind, id)).copied())
    }

    async fn get_tenant(&self, id: Uuid) -> Result<Option<TenantRef>, StoreError> {
        Ok(locked(&self.tenants).get(&id).cloned())
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn get_counters(&self, tenant_id: Uuid) -> Result<Counters, StoreError> {
        Ok(locked(&self.counters)
            .get(&tenant_id)
            .copied()
            .unwrap_or_else(|| Counters::empty(Utc::now())))
    }

    async fn increment(
        &self,
        tenant_id: Uuid,
        kind: CounterKind,
        delta: i64,
    ) -> Result<i64, StoreError> {
        let mut counters = locked(&self.counters);
        let entry = counters
            .entry(tenant_id)
            .or_insert_with(|| Counters::empty(Utc::now()));
        let slot = match kind {
            CounterKind::Users => &mut entry.users,
            CounterKind::Customers => &mut entry.customers,
            CounterKind::ApiCalls => &mut entry.api_calls,
        };
        *slot = (*slot + delta).max(0);
        Ok(*slot)
    }

    async fn reset_window(
        &self,
        tenant_id: Uuid,
        kind: CounterKind,
        started_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut counters = locked(&self.counters);
        let entry = counters
            .entry(tenant_id)
            .or_insert_with(|| Counters::empty(started_at));
        if kind == CounterKind::ApiCalls {
            entry.api_calls = 0;
            entry.api_window_started_at = started_at;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn increment_clamps_at_zero() {
        let store = MemoryStore::new();
        let tenant = Uuid::new_v4();
        let value = store
            .increment(tenant, CounterKind::Customers, -5)
            .await
            .unwrap();
        assert_eq!(value, 0);
    }

    #[tokio::test]
    async fn reset_window_zeroes_only_api_calls() {
        let store = MemoryStore::new();
        let tenant = Uuid::new_v4();
        store.increment(tenant, CounterKind::Users, 2).await.unwrap();
        store
            .increment(tenant, CounterKind::ApiCalls, 7)
            .await
            .unwrap();

        store
            .reset_window(tenant, CounterKind::ApiCalls, Utc::now())
            .await
            .unwrap();

        let counters = store.get_counters(tenant).await.unwrap();
        assert_eq!(counters.users, 2);
        assert_eq!(counters.api_calls, 0);
    }
}
