use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde_json::Value;
use uuid::Uuid;

use super::require_tenant;
use crate::database::models::Customer;
use crate::middleware::{ApiResponse, ApiResult, CurrentTenant};
use crate::services::CustomerService;
use crate::state::AppState;
use crate::tenancy::context::RequestContext;

/// GET /api/customers
pub async fn list(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> ApiResult<Vec<Customer>> {
    let customers = CustomerService::new(state).list(&ctx).await?;
    Ok(ApiResponse::success(customers))
}

/// POST /api/customers
pub async fn create(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Extension(current): Extension<CurrentTenant>,
    Json(payload): Json<Value>,
) -> ApiResult<Customer> {
    let tenant = require_tenant(current)?;
    let (customer, warning) = CustomerService::new(state)
        .create(&ctx, &tenant, payload)
        .await?;
    Ok(ApiResponse::created(customer).with_warning(warning))
}

/// GET /api/customers/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Customer> {
    let customer = CustomerService::new(state).get(&ctx, id).await?;
    Ok(ApiResponse::success(customer))
}

/// PUT /api/customers/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<Value>,
) -> ApiResult<Customer> {
    let customer = CustomerService::new(state).update(&ctx, id, payload).await?;
    Ok(ApiResponse::success(customer))
}

/// DELETE /api/customers/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    CustomerService::new(state).delete(&ctx, id).await?;
    Ok(ApiResponse::<()>::no_content())
}
