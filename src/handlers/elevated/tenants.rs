use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::require_elevated;
use crate::database::models::Tenant;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::TenantService;
use crate::services::tenant_service::ProvisionTenantRequest;
use crate::state::AppState;
use crate::tenancy::context::RequestContext;

#[derive(Debug, Deserialize)]
pub struct ChangePlanRequest {
    pub plan: String,
}

/// GET /api/root/tenants
pub async fn list(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> ApiResult<Vec<Tenant>> {
    require_elevated(&ctx)?;
    let tenants = TenantService::new(state).list().await?;
    Ok(ApiResponse::success(tenants))
}

/// POST /api/root/tenants
pub async fn create(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(request): Json<ProvisionTenantRequest>,
) -> ApiResult<Value> {
    require_elevated(&ctx)?;
    let (tenant, admin) = TenantService::new(state).provision(&request).await?;
    Ok(ApiResponse::created(json!({
        "tenant": tenant,
        "admin": admin,
    })))
}

/// GET /api/root/tenants/:id
pub async fn show(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Value> {
    require_elevated(&ctx)?;
    let (tenant, usage) = TenantService::new(state).show(id).await?;
    Ok(ApiResponse::success(json!({
        "tenant": tenant,
        "usage": usage,
    })))
}

/// PUT /api/root/tenants/:id/plan
pub async fn change_plan(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
    Json(request): Json<ChangePlanRequest>,
) -> ApiResult<Tenant> {
    require_elevated(&ctx)?;
    let tenant = TenantService::new(state).change_plan(id, &request.plan).await?;
    Ok(ApiResponse::success(tenant))
}

/// POST /api/root/tenants/:id/suspend
pub async fn suspend(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Tenant> {
    require_elevated(&ctx)?;
    let tenant = TenantService::new(state).suspend(id).await?;
    Ok(ApiResponse::success(tenant))
}

/// POST /api/root/tenants/:id/restore
pub async fn restore(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Tenant> {
    require_elevated(&ctx)?;
    let tenant = TenantService::new(state).restore(id).await?;
    Ok(ApiResponse::success(tenant))
}
