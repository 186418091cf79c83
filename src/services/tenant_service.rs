use serde::Deserialize;
use uuid::Uuid;

use crate::auth::password_digest;
use crate::database::models::{Tenant, User};
use crate::error::ApiError;
use crate::state::AppState;
use crate::tenancy::error::TenancyError;
use crate::tenancy::quota::{CounterKind, CounterUsage, PlanTier};

#[derive(Debug, thiserror::Error)]
pub enum TenantError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Tenancy(#[from] TenancyError),
    #[error("Tenant already exists: {0}")]
    AlreadyExists(String),
    #[error("Invalid tenant name: {0}")]
    InvalidName(String),
    #[error("Unknown plan: {0}")]
    UnknownPlan(String),
    #[error("tenant not found")]
    NotFound(Uuid),
}

impl From<TenantError> for ApiError {
    fn from(err: TenantError) -> Self {
        match err {
            TenantError::Database(e) => e.into(),
            TenantError::Tenancy(e) => e.into(),
            TenantError::AlreadyExists(name) => {
                ApiError::conflict(format!("Tenant already exists: {}", name))
            }
            TenantError::InvalidName(msg) => ApiError::validation_error(msg, None),
            TenantError::UnknownPlan(plan) => {
                ApiError::validation_error(format!("Unknown plan: {}", plan), None)
            }
            TenantError::NotFound(_) => ApiError::not_found("tenant not found"),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProvisionTenantRequest {
    pub name: String,
    #[serde(default)]
    pub plan: Option<String>,
    pub admin_email: String,
    pub admin_name: String,
    pub admin_password: String,
}

pub struct TenantService {
    state: AppState,
}

impl TenantService {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    pub async fn list(&self) -> Result<Vec<Tenant>, TenantError> {
        let tenants = sqlx::query_as::<_, Tenant>(
            "SELECT id, name, status, plan, max_users, max_customers, max_api_calls, \
             created_at, updated_at \
             FROM tenants ORDER BY created_at DESC",
        )
        .fetch_all(&self.state.pool)
        .await?;
        Ok(tenants)
    }

    pub async fn get(&self, id: Uuid) -> Result<Tenant, TenantError> {
        let tenant = sqlx::query_as::<_, Tenant>(
            "SELECT id, name, status, plan, max_users, max_customers, max_api_calls, \
             created_at, updated_at \
             FROM tenants WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.state.pool)
        .await?;
        tenant.ok_or(TenantError::NotFound(id))
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<Tenant>, TenantError> {
        let tenant = sqlx::query_as::<_, Tenant>(
            "SELECT id, name, status, plan, max_users, max_customers, max_api_calls, \
             created_at, updated_at \
             FROM tenants WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.state.pool)
        .await?;
        Ok(tenant)
    }

    /// Provisions a tenant with limits copied from its plan tier and a
    /// bootstrap tenant admin, so the tenant is usable immediately.
    pub async fn provision(
        &self,
        request: &ProvisionTenantRequest,
    ) -> Result<(Tenant, User), TenantError> {
        validate_tenant_name(&request.name)?;
        if request.admin_email.trim().is_empty() {
            return Err(TenantError::InvalidName(
                "Admin email is required".to_string(),
            ));
        }

        let plan: PlanTier = match request.plan.as_deref() {
            None => PlanTier::Free,
            Some(raw) => raw
                .parse()
                .map_err(|_| TenantError::UnknownPlan(raw.to_string()))?,
        };
        let policy = plan.policy();

        if self.tenant_exists(&request.name).await? {
            return Err(TenantError::AlreadyExists(request.name.clone()));
        }

        let tenant = sqlx::query_as::<_, Tenant>(
            "INSERT INTO tenants (id, name, status, plan, max_users, max_customers, \
             max_api_calls, created_at, updated_at) \
             VALUES ($1, $2, 'active', $3, $4, $5, $6, NOW(), NOW()) \
             RETURNING id, name, status, plan, max_users, max_customers, max_api_calls, \
             created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(&request.name)
        .bind(plan.as_str())
        .bind(policy.max_users)
        .bind(policy.max_customers)
        .bind(policy.max_api_calls)
        .fetch_one(&self.state.pool)
        .await?;

        let admin = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, tenant_id, email, name, role, password_digest, is_active, \
             created_at, updated_at) \
             VALUES ($1, $2, $3, $4, 'tenant_admin', $5, TRUE, NOW(), NOW()) \
             RETURNING id, tenant_id, email, name, role, password_digest, is_active, \
             created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(tenant.id)
        .bind(request.admin_email.trim())
        .bind(request.admin_name.trim())
        .bind(password_digest(&request.admin_password))
        .fetch_one(&self.state.pool)
        .await?;

        self.state
            .quota
            .record_created(tenant.id, CounterKind::Users)
            .await?;

        tracing::info!(tenant_id = %tenant.id, name = %tenant.name, plan = %plan, "tenant provisioned");
        Ok((tenant, admin))
    }

    /// Usage snapshot alongside the tenant row, one line per counter.
    pub async fn show(&self, id: Uuid) -> Result<(Tenant, Vec<CounterUsage>), TenantError> {
        let tenant = self.get(id).await?;
        let usage = self.state.quota.usage_report(&tenant.to_ref()).await?;
        Ok((tenant, usage))
    }

    /// Moves the tenant to a new plan, rewriting its limits in the same
    /// statement.
    pub async fn change_plan(&self, id: Uuid, plan: &str) -> Result<Tenant, TenantError> {
        let tier: PlanTier = plan
            .parse()
            .map_err(|_| TenantError::UnknownPlan(plan.to_string()))?;
        let policy = tier.policy();

        let tenant = sqlx::query_as::<_, Tenant>(
            "UPDATE tenants SET plan = $2, max_users = $3, max_customers = $4, \
             max_api_calls = $5, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING id, name, status, plan, max_users, max_customers, max_api_calls, \
             created_at, updated_at",
        )
        .bind(id)
        .bind(tier.as_str())
        .bind(policy.max_users)
        .bind(policy.max_customers)
        .bind(policy.max_api_calls)
        .fetch_optional(&self.state.pool)
        .await?;

        tenant.ok_or(TenantError::NotFound(id))
    }

    pub async fn suspend(&self, id: Uuid) -> Result<Tenant, TenantError> {
        self.set_status(id, "suspended").await
    }

    pub async fn restore(&self, id: Uuid) -> Result<Tenant, TenantError> {
        self.set_status(id, "active").await
    }

    async fn set_status(&self, id: Uuid, status: &str) -> Result<Tenant, TenantError> {
        let tenant = sqlx::query_as::<_, Tenant>(
            "UPDATE tenants SET status = $2, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING id, name, status, plan, max_users, max_customers, max_api_calls, \
             created_at, updated_at",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.state.pool)
        .await?;

        tenant.ok_or(TenantError::NotFound(id))
    }

    async fn tenant_exists(&self, name: &str) -> Result<bool, TenantError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tenants WHERE name = $1")
            .bind(name)
            .fetch_one(&self.state.pool)
            .await?;
        Ok(count.0 > 0)
    }
}

/// Tenant names double as login identifiers, so the charset stays tight.
fn validate_tenant_name(name: &str) -> Result<(), TenantError> {
    if name.len() < 2 {
        return Err(TenantError::InvalidName(
            "Tenant name must be at least 2 characters".to_string(),
        ));
    }
    if name.len() > 100 {
        return Err(TenantError::InvalidName(
            "Tenant name must be less than 100 characters".to_string(),
        ));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(TenantError::InvalidName(
            "Tenant name can only contain letters, numbers, hyphens, and underscores".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_and_long_names() {
        assert!(validate_tenant_name("a").is_err());
        assert!(validate_tenant_name(&"x".repeat(101)).is_err());
        assert!(validate_tenant_name("ok").is_ok());
    }

    #[test]
    fn rejects_names_outside_charset() {
        assert!(validate_tenant_name("acme corp").is_err());
        assert!(validate_tenant_name("acme;drop").is_err());
        assert!(validate_tenant_name("acme-corp_2").is_ok());
    }
}
