use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::database::models::Customer;
use crate::services::ServiceError;
use crate::state::AppState;
use crate::tenancy::context::RequestContext;
use crate::tenancy::error::TenancyError;
use crate::tenancy::ownership::EntityKind;
use crate::tenancy::quota::{CounterKind, QuotaWarning};
use crate::tenancy::sanitize::sanitize_payload;
use crate::tenancy::store::TenantRef;

#[derive(Debug, Deserialize)]
pub struct CreateCustomerRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCustomerRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
}

pub struct CustomerService {
    state: AppState,
}

impl CustomerService {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    pub async fn list(&self, ctx: &RequestContext) -> Result<Vec<Customer>, ServiceError> {
        let tenant_id = ctx.tenant_id.ok_or(TenancyError::TenantRequired)?;
        let customers = sqlx::query_as::<_, Customer>(
            "SELECT id, tenant_id, name, email, phone, company, created_at, updated_at \
             FROM customers WHERE tenant_id = $1 ORDER BY created_at DESC",
        )
        .bind(tenant_id)
        .fetch_all(&self.state.pool)
        .await?;
        Ok(customers)
    }

    pub async fn get(&self, ctx: &RequestContext, id: Uuid) -> Result<Customer, ServiceError> {
        self.state
            .ownership
            .validate(EntityKind::Customer, Some(id), ctx)
            .await?;
        let tenant_id = ctx.tenant_id.ok_or(TenancyError::TenantRequired)?;

        let customer = sqlx::query_as::<_, Customer>(
            "SELECT id, tenant_id, name, email, phone, company, created_at, updated_at \
             FROM customers WHERE id = $1 AND tenant_id = $2",
        )
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&self.state.pool)
        .await?;

        customer.ok_or_else(|| {
            TenancyError::Ownership {
                kind: EntityKind::Customer,
                id,
            }
            .into()
        })
    }

    pub async fn create(
        &self,
        ctx: &RequestContext,
        tenant: &TenantRef,
        payload: Value,
    ) -> Result<(Customer, Option<QuotaWarning>), ServiceError> {
        let (payload, audit) = sanitize_payload(payload, ctx);
        if let Some(event) = audit {
            event.emit();
        }

        let request: CreateCustomerRequest = serde_json::from_value(payload)
            .map_err(|e| ServiceError::Validation(format!("Invalid customer payload: {}", e)))?;
        if request.name.trim().is_empty() {
            return Err(ServiceError::Validation("Customer name is required".into()));
        }
        if request.email.trim().is_empty() {
            return Err(ServiceError::Validation("Customer email is required".into()));
        }

        let warning = self
            .state
            .quota
            .check_and_reserve(tenant, CounterKind::Customers)
            .await?;

        let customer = sqlx::query_as::<_, Customer>(
            "INSERT INTO customers (id, tenant_id, name, email, phone, company, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW()) \
             RETURNING id, tenant_id, name, email, phone, company, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(tenant.id)
        .bind(request.name.trim())
        .bind(request.email.trim())
        .bind(&request.phone)
        .bind(&request.company)
        .fetch_one(&self.state.pool)
        .await?;

        self.state
            .quota
            .record_created(tenant.id, CounterKind::Customers)
            .await?;

        Ok((customer, warning))
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        payload: Value,
    ) -> Result<Customer, ServiceError> {
        let (payload, audit) = sanitize_payload(payload, ctx);
        if let Some(event) = audit {
            event.emit();
        }

        let request: UpdateCustomerRequest = serde_json::from_value(payload)
            .map_err(|e| ServiceError::Validation(format!("Invalid customer payload: {}", e)))?;

        self.state
            .ownership
            .validate(EntityKind::Customer, Some(id), ctx)
            .await?;
        let tenant_id = ctx.tenant_id.ok_or(TenancyError::TenantRequired)?;

        let customer = sqlx::query_as::<_, Customer>(
            "UPDATE customers SET \
             name = COALESCE($3, name), \
             email = COALESCE($4, email), \
             phone = COALESCE($5, phone), \
             company = COALESCE($6, company), \
             updated_at = NOW() \
             WHERE id = $1 AND tenant_id = $2 \
             RETURNING id, tenant_id, name, email, phone, company, created_at, updated_at",
        )
        .bind(id)
        .bind(tenant_id)
        .bind(&request.name)
        .bind(&request.email)
        .bind(&request.phone)
        .bind(&request.company)
        .fetch_optional(&self.state.pool)
        .await?;

        customer.ok_or_else(|| {
            TenancyError::Ownership {
                kind: EntityKind::Customer,
                id,
            }
            .into()
        })
    }

    pub async fn delete(&self, ctx: &RequestContext, id: Uuid) -> Result<(), ServiceError> {
        self.state
            .ownership
            .validate(EntityKind::Customer, Some(id), ctx)
            .await?;
        let tenant_id = ctx.tenant_id.ok_or(TenancyError::TenantRequired)?;

        let result = sqlx::query("DELETE FROM customers WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(&self.state.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(TenancyError::Ownership {
                kind: EntityKind::Customer,
                id,
            }
            .into());
        }

        self.state
            .quota
            .record_deleted(tenant_id, CounterKind::Customers)
            .await?;
        Ok(())
    }
}
