use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{generate_jwt, verify_password, Claims};
use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::TenantService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub tenant: String,
    pub email: String,
    pub password: String,
}

/// POST /auth/login
///
/// Credential failures all collapse into the same 401 so the response
/// does not reveal whether the tenant, the user, or the password was
/// wrong.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Value> {
    let tenant = TenantService::new(state.clone())
        .find_by_name(request.tenant.trim())
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    if tenant.suspended() {
        return Err(ApiError::forbidden("Tenant is suspended"));
    }

    let user: Option<User> = sqlx::query_as(
        "SELECT id, tenant_id, email, name, role, password_digest, is_active, \
         created_at, updated_at \
         FROM users WHERE tenant_id = $1 AND email = $2",
    )
    .bind(tenant.id)
    .bind(request.email.trim())
    .fetch_optional(&state.pool)
    .await
    .map_err(ApiError::from)?;

    let user = user.ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;
    if !user.is_active || !verify_password(&request.password, &user.password_digest) {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let token = generate_jwt(Claims::for_user(&user)).map_err(|e| {
        tracing::error!("JWT generation failed: {}", e);
        ApiError::internal_server_error("An error occurred while processing your request")
    })?;

    Ok(ApiResponse::success(json!({
        "token": token,
        "user": user,
    })))
}
