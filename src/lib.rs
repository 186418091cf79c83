use axum::{
    routing::{delete, get, post, put},
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod state;
pub mod tenancy;

use crate::middleware::{jwt_auth_middleware, request_context_middleware, ApiResponse, ApiResult};
use crate::state::AppState;

/// Builds the full router. Protected and elevated routes share the JWT and
/// context middleware stack; elevated handlers additionally gate on the
/// cross-tenant capability.
pub fn app(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/auth/whoami", get(handlers::protected::auth::whoami))
        .route(
            "/api/customers",
            get(handlers::protected::customers::list).post(handlers::protected::customers::create),
        )
        .route(
            "/api/customers/:id",
            get(handlers::protected::customers::get)
                .put(handlers::protected::customers::update)
                .delete(handlers::protected::customers::delete),
        )
        .route(
            "/api/tickets",
            get(handlers::protected::tickets::list).post(handlers::protected::tickets::create),
        )
        .route(
            "/api/tickets/:id",
            get(handlers::protected::tickets::get)
                .put(handlers::protected::tickets::update)
                .delete(handlers::protected::tickets::delete),
        )
        .route(
            "/api/tickets/:id/messages",
            get(handlers::protected::tickets::list_messages)
                .post(handlers::protected::tickets::create_message),
        )
        .route(
            "/api/calls",
            get(handlers::protected::calls::list).post(handlers::protected::calls::create),
        )
        .route(
            "/api/users",
            get(handlers::protected::users::list).post(handlers::protected::users::create),
        )
        .route("/api/users/:id", delete(handlers::protected::users::delete))
        .route(
            "/api/root/tenants",
            get(handlers::elevated::tenants::list).post(handlers::elevated::tenants::create),
        )
        .route("/api/root/tenants/:id", get(handlers::elevated::tenants::show))
        .route(
            "/api/root/tenants/:id/plan",
            put(handlers::elevated::tenants::change_plan),
        )
        .route(
            "/api/root/tenants/:id/suspend",
            post(handlers::elevated::tenants::suspend),
        )
        .route(
            "/api/root/tenants/:id/restore",
            post(handlers::elevated::tenants::restore),
        )
        // Layers run bottom-up: JWT first, then context resolution.
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            request_context_middleware,
        ))
        .layer(axum::middleware::from_fn(jwt_auth_middleware));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/auth/login", post(handlers::public::auth::login))
        .merge(protected)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "name": "atrium-crm-api",
        "version": env!("CARGO_PKG_VERSION"),
    })))
}

async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> ApiResult<Value> {
    database::DatabaseManager::health_check(&state.pool)
        .await
        .map_err(|e| {
            tracing::error!("health check failed: {}", e);
            error::ApiError::service_unavailable("Database unavailable")
        })?;
    Ok(ApiResponse::success(json!({ "status": "ok" })))
}
