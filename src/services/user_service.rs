use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::auth::password_digest;
use crate::database::models::User;
use crate::services::ServiceError;
use crate::state::AppState;
use crate::tenancy::context::{RequestContext, Role};
use crate::tenancy::error::TenancyError;
use crate::tenancy::ownership::EntityKind;
use crate::tenancy::quota::{CounterKind, QuotaWarning};
use crate::tenancy::sanitize::sanitize_payload;
use crate::tenancy::store::TenantRef;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub name: String,
    pub role: String,
    pub password: String,
}

pub struct UserService {
    state: AppState,
}

impl UserService {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    pub async fn list(&self, ctx: &RequestContext) -> Result<Vec<User>, ServiceError> {
        let tenant_id = ctx.tenant_id.ok_or(TenancyError::TenantRequired)?;
        let users = sqlx::query_as::<_, User>(
            "SELECT id, tenant_id, email, name, role, password_digest, is_active, \
             created_at, updated_at \
             FROM users WHERE tenant_id = $1 ORDER BY created_at DESC",
        )
        .bind(tenant_id)
        .fetch_all(&self.state.pool)
        .await?;
        Ok(users)
    }

    /// Creates a tenant-bound user. Consumes the `users` quota and is
    /// restricted to tenant admins.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        tenant: &TenantRef,
        payload: Value,
    ) -> Result<(User, Option<QuotaWarning>), ServiceError> {
        require_admin(ctx)?;

        let (payload, audit) = sanitize_payload(payload, ctx);
        if let Some(event) = audit {
            event.emit();
        }

        let request: CreateUserRequest = serde_json::from_value(payload)
            .map_err(|e| ServiceError::Validation(format!("Invalid user payload: {}", e)))?;
        if request.email.trim().is_empty() {
            return Err(ServiceError::Validation("User email is required".into()));
        }
        if request.name.trim().is_empty() {
            return Err(ServiceError::Validation("User name is required".into()));
        }
        if request.password.is_empty() {
            return Err(ServiceError::Validation("User password is required".into()));
        }
        let role: Role = request.role.parse().map_err(|e: String| {
            ServiceError::Validation(format!("Invalid role: {}", e))
        })?;
        if role == Role::SuperAdmin {
            return Err(ServiceError::Validation(
                "Cannot create a super admin through the tenant API".into(),
            ));
        }

        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM users WHERE tenant_id = $1 AND email = $2")
                .bind(tenant.id)
                .bind(request.email.trim())
                .fetch_one(&self.state.pool)
                .await?;
        if count > 0 {
            return Err(ServiceError::Conflict(format!(
                "User already exists: {}",
                request.email.trim()
            )));
        }

        let warning = self
            .state
            .quota
            .check_and_reserve(tenant, CounterKind::Users)
            .await?;

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, tenant_id, email, name, role, password_digest, is_active, \
             created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, TRUE, NOW(), NOW()) \
             RETURNING id, tenant_id, email, name, role, password_digest, is_active, \
             created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(tenant.id)
        .bind(request.email.trim())
        .bind(request.name.trim())
        .bind(role.as_str())
        .bind(password_digest(&request.password))
        .fetch_one(&self.state.pool)
        .await?;

        self.state
            .quota
            .record_created(tenant.id, CounterKind::Users)
            .await?;

        Ok((user, warning))
    }

    /// Deletes a tenant-bound user and releases its quota slot. Restricted
    /// to tenant admins.
    pub async fn delete(&self, ctx: &RequestContext, id: Uuid) -> Result<(), ServiceError> {
        require_admin(ctx)?;

        self.state
            .ownership
            .validate(EntityKind::User, Some(id), ctx)
            .await?;
        let tenant_id = ctx.tenant_id.ok_or(TenancyError::TenantRequired)?;

        let result = sqlx::query("DELETE FROM users WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(&self.state.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(TenancyError::Ownership {
                kind: EntityKind::User,
                id,
            }
            .into());
        }

        self.state
            .quota
            .record_deleted(tenant_id, CounterKind::Users)
            .await?;
        Ok(())
    }
}

fn require_admin(ctx: &RequestContext) -> Result<(), ServiceError> {
    if ctx.role == Role::TenantAdmin || ctx.cross_tenant_allowed {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(
            "Managing users requires a tenant admin role".into(),
        ))
    }
}
