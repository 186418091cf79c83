use thiserror::Error;
use uuid::Uuid;

use crate::tenancy::ownership::EntityKind;
use crate::tenancy::quota::CounterKind;
use crate::tenancy::store::StoreError;

/// Failure alphabet of the tenant-isolation core. All variants are terminal
/// for the current operation; the HTTP layer maps them to status codes.
#[derive(Debug, Error)]
pub enum TenancyError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("No tenant scope bound to this request")]
    TenantRequired,

    /// Referenced entity is absent or belongs to another tenant. The message
    /// must stay identical to a genuinely missing id so the tenant boundary
    /// is indistinguishable from absence.
    #[error("{kind} not found")]
    Ownership { kind: EntityKind, id: Uuid },

    #[error("{counter} quota exceeded ({usage} of {limit})")]
    QuotaExceeded {
        counter: CounterKind,
        usage: i64,
        limit: i64,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}
