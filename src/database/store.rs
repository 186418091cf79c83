use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::tenancy::ownership::EntityKind;
use crate::tenancy::quota::{CounterKind, QuotaPolicy};
use crate::tenancy::store::{CounterStore, Counters, EntityRef, EntityStore, StoreError, TenantRef};

/// Postgres implementation of the storage seams, over the shared pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl EntityStore for PgStore {
    async fn get_entity(&self, kind: EntityKind, id: Uuid) -> Result<Option<EntityRef>, StoreError> {
        // Table names come from EntityKind::table(), a closed set of static
        // strings; the id is bound.
        let sql = format!("SELECT id, tenant_id FROM {} WHERE id = $1", kind.table());
        let row: Option<(Uuid, Option<Uuid>)> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(id, tenant_id)| EntityRef { id, tenant_id }))
    }

    async fn get_tenant(&self, id: Uuid) -> Result<Option<TenantRef>, StoreError> {
        let row: Option<(Uuid, String, String, i64, i64, i64)> = sqlx::query_as(
            "SELECT id, name, status, max_users, max_customers, max_api_calls \
             FROM tenants WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(
            |(id, name, status, max_users, max_customers, max_api_calls)| TenantRef {
                id,
                name,
                suspended: status == "suspended",
                policy: QuotaPolicy {
                    max_users,
                    max_customers,
                    max_api_calls,
                },
            },
        ))
    }
}

#[async_trait]
impl CounterStore for PgStore {
    async fn get_counters(&self, tenant_id: Uuid) -> Result<Counters, StoreError> {
        let rows: Vec<(String, i64, DateTime<Utc>)> = sqlx::query_as(
            "SELECT kind, count, window_started_at FROM usage_counters WHERE tenant_id = $1",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        let mut counters = Counters::empty(Utc::now());
        for (kind, count, window_started_at) in rows {
            match kind.as_str() {
                "users" => counters.users = count,
                "customers" => counters.customers = count,
                "api_calls" => {
                    counters.api_calls = count;
                    counters.api_window_started_at = window_started_at;
                }
                _ => {}
            }
        }
        Ok(counters)
    }

    async fn increment(
        &self,
        tenant_id: Uuid,
        kind: CounterKind,
        delta: i64,
    ) -> Result<i64, StoreError> {
        // Single-statement upsert so concurrent increments serialize on the
        // row; GREATEST clamps decrements at zero.
        let (count,): (i64,) = sqlx::query_as(
            "INSERT INTO usage_counters (tenant_id, kind, count, window_started_at) \
             VALUES ($1, $2, GREATEST($3, 0), NOW()) \
             ON CONFLICT (tenant_id, kind) \
             DO UPDATE SET count = GREATEST(usage_counters.count + $3, 0) \
             RETURNING count",
        )
        .bind(tenant_id)
        .bind(kind.as_str())
        .bind(delta)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn reset_window(
        &self,
        tenant_id: Uuid,
        kind: CounterKind,
        started_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO usage_counters (tenant_id, kind, count, window_started_at) \
             VALUES ($1, $2, 0, $3) \
             ON CONFLICT (tenant_id, kind) \
             DO UPDATE SET count = 0, window_started_at = $3",
        )
        .bind(tenant_id)
        .bind(kind.as_str())
        .bind(started_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
