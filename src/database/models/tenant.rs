use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::tenancy::quota::QuotaPolicy;
use crate::tenancy::store::TenantRef;

/// Tenant row. Limits are copied from the plan tier at provisioning and
/// rewritten on plan change, so reads never consult the tier table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    pub status: String,
    pub plan: String,
    pub max_users: i64,
    pub max_customers: i64,
    pub max_api_calls: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    pub fn suspended(&self) -> bool {
        self.status == "suspended"
    }

    pub fn policy(&self) -> QuotaPolicy {
        QuotaPolicy {
            max_users: self.max_users,
            max_customers: self.max_customers,
            max_api_calls: self.max_api_calls,
        }
    }

    pub fn to_ref(&self) -> TenantRef {
        TenantRef {
            id: self.id,
            name: self.name.clone(),
            suspended: self.suspended(),
            policy: self.policy(),
        }
    }
}
