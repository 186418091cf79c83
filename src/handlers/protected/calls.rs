use axum::{extract::State, Extension, Json};
use serde_json::Value;

use super::require_tenant;
use crate::database::models::PhoneCall;
use crate::middleware::{ApiResponse, ApiResult, CurrentTenant};
use crate::services::CallService;
use crate::state::AppState;
use crate::tenancy::context::RequestContext;

/// GET /api/calls
pub async fn list(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> ApiResult<Vec<PhoneCall>> {
    let calls = CallService::new(state).list(&ctx).await?;
    Ok(ApiResponse::success(calls))
}

/// POST /api/calls
pub async fn create(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Extension(current): Extension<CurrentTenant>,
    Json(payload): Json<Value>,
) -> ApiResult<PhoneCall> {
    let tenant = require_tenant(current)?;
    let call = CallService::new(state).create(&ctx, &tenant, payload).await?;
    Ok(ApiResponse::created(call))
}
