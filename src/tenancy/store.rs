use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::tenancy::ownership::EntityKind;
use crate::tenancy::quota::{CounterKind, QuotaPolicy};

/// Errors from the storage collaborator
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Query error: {0}")]
    Query(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Minimal entity projection used for ownership checks: the id and the
/// tenant that owns it. `tenant_id` is `None` only for cross-tenant
/// principal records (super admins).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityRef {
    pub id: Uuid,
    pub tenant_id: Option<Uuid>,
}

/// Tenant projection consumed by the context middleware and the quota
/// tracker. Carries exactly what the core needs, not the full row.
#[derive(Debug, Clone)]
pub struct TenantRef {
    pub id: Uuid,
    pub name: String,
    pub suspended: bool,
    pub policy: QuotaPolicy,
}

/// Per-tenant usage counters. `api_window_started_at` marks the start of
/// the current API-call window; the tracker resets the counter lazily once
/// the window elapses.
#[derive(Debug, Clone, Copy)]
pub struct Counters {
    pub users: i64,
    pub customers: i64,
    pub api_calls: i64,
    pub api_window_started_at: DateTime<Utc>,
}

impl Counters {
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            users: 0,
            customers: 0,
            api_calls: 0,
            api_window_started_at: now,
        }
    }
}

/// Entity lookups consumed by the ownership validator and the context
/// middleware. Reads only; ownership validation never mutates.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn get_entity(&self, kind: EntityKind, id: Uuid) -> Result<Option<EntityRef>, StoreError>;

    async fn get_tenant(&self, id: Uuid) -> Result<Option<TenantRef>, StoreError>;
}

/// Counter mutations consumed by the quota tracker. `increment` must be an
/// atomic read-modify-write clamped at zero: concurrent creates must not
/// interleave into an undercount, and decrement at zero stays zero.
#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn get_counters(&self, tenant_id: Uuid) -> Result<Counters, StoreError>;

    /// Returns the new counter value after applying `delta`.
    async fn increment(
        &self,
        tenant_id: Uuid,
        kind: CounterKind,
        delta: i64,
    ) -> Result<i64, StoreError>;

    async fn reset_window(
        &self,
        tenant_id: Uuid,
        kind: CounterKind,
        started_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}
