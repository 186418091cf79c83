use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde_json::Value;
use uuid::Uuid;

use super::require_tenant;
use crate::database::models::User;
use crate::middleware::{ApiResponse, ApiResult, CurrentTenant};
use crate::services::UserService;
use crate::state::AppState;
use crate::tenancy::context::RequestContext;

/// GET /api/users
pub async fn list(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> ApiResult<Vec<User>> {
    let users = UserService::new(state).list(&ctx).await?;
    Ok(ApiResponse::success(users))
}

/// POST /api/users
pub async fn create(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Extension(current): Extension<CurrentTenant>,
    Json(payload): Json<Value>,
) -> ApiResult<User> {
    let tenant = require_tenant(current)?;
    let (user, warning) = UserService::new(state).create(&ctx, &tenant, payload).await?;
    Ok(ApiResponse::created(user).with_warning(warning))
}

/// DELETE /api/users/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    UserService::new(state).delete(&ctx, id).await?;
    Ok(ApiResponse::<()>::no_content())
}
