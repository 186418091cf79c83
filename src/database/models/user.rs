use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::tenancy::context::{Principal, Role};

/// User row. `tenant_id` is NULL only for super admins; every other role
/// is bound to exactly one tenant.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub email: String,
    pub name: String,
    pub role: String,
    #[serde(skip_serializing)]
    pub password_digest: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn parsed_role(&self) -> Result<Role, String> {
        self.role.parse()
    }

    pub fn to_principal(&self) -> Result<Principal, String> {
        Ok(Principal {
            id: self.id,
            role: self.parsed_role()?,
            tenant_id: self.tenant_id,
            is_active: self.is_active,
        })
    }
}
