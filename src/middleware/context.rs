use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::Value;
use uuid::Uuid;

use super::auth::AuthUser;
use crate::database::models::User;
use crate::error::ApiError;
use crate::state::AppState;
use crate::tenancy::context::{resolve, Principal};
use crate::tenancy::store::TenantRef;

/// Tenant the request acts under, injected by the context middleware.
/// `None` only for super admins operating without a tenant scope.
#[derive(Clone)]
pub struct CurrentTenant(pub Option<TenantRef>);

fn reject(api_error: ApiError) -> (StatusCode, Json<Value>) {
    (
        StatusCode::from_u16(api_error.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(api_error.to_json()),
    )
}

/// Builds the per-request identity context and enforces tenant status and
/// API-call metering before any handler runs.
///
/// Runs after `jwt_auth_middleware`. The principal is re-read from storage
/// so deactivated users are cut off immediately, not at token expiry.
pub async fn request_context_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, impl IntoResponse> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| {
            reject(ApiError::unauthorized(
                "JWT authentication required before context resolution",
            ))
        })?;

    let principal = load_principal(&state, auth_user.user_id)
        .await
        .map_err(reject)?;

    let acting_tenant = parse_acting_tenant(&headers).map_err(reject)?;

    let ctx = resolve(principal.as_ref(), acting_tenant)
        .map_err(|e| reject(ApiError::from(e)))?;

    let current_tenant = match ctx.tenant_id {
        Some(tenant_id) => {
            let tenant = state
                .entities
                .get_tenant(tenant_id)
                .await
                .map_err(|e| reject(ApiError::from(e)))?
                .ok_or_else(|| reject(ApiError::not_found("tenant not found")))?;

            if tenant.suspended {
                tracing::warn!(%tenant_id, "request against suspended tenant denied");
                return Err(reject(ApiError::forbidden("Tenant is suspended")));
            }

            // Metered before the handler so blocked requests never reach
            // business logic, and regardless of handler outcome.
            state
                .quota
                .count_api_call(&tenant)
                .await
                .map_err(|e| reject(ApiError::from(e)))?;

            Some(tenant)
        }
        None => None,
    };

    request.extensions_mut().insert(ctx);
    request.extensions_mut().insert(CurrentTenant(current_tenant));

    Ok(next.run(request).await)
}

async fn load_principal(state: &AppState, user_id: Uuid) -> Result<Option<Principal>, ApiError> {
    let user: Option<User> = sqlx::query_as(
        "SELECT id, tenant_id, email, name, role, password_digest, is_active, \
         created_at, updated_at \
         FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(&state.pool)
    .await?;

    match user {
        None => Ok(None),
        Some(user) => {
            let principal = user.to_principal().map_err(|e| {
                tracing::error!(%user_id, "corrupt role column: {}", e);
                ApiError::internal_server_error("An error occurred while processing your request")
            })?;
            Ok(Some(principal))
        }
    }
}

fn parse_acting_tenant(headers: &HeaderMap) -> Result<Option<Uuid>, ApiError> {
    let Some(value) = headers.get("x-acting-tenant") else {
        return Ok(None);
    };
    let raw = value
        .to_str()
        .map_err(|_| ApiError::bad_request("Invalid x-acting-tenant header"))?;
    let tenant_id = Uuid::parse_str(raw.trim())
        .map_err(|_| ApiError::bad_request("Invalid x-acting-tenant header"))?;
    Ok(Some(tenant_id))
}
