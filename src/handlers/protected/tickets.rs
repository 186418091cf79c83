use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde_json::Value;
use uuid::Uuid;

use super::require_tenant;
use crate::database::models::{Message, Ticket};
use crate::middleware::{ApiResponse, ApiResult, CurrentTenant};
use crate::services::TicketService;
use crate::state::AppState;
use crate::tenancy::context::RequestContext;

/// GET /api/tickets
pub async fn list(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> ApiResult<Vec<Ticket>> {
    let tickets = TicketService::new(state).list(&ctx).await?;
    Ok(ApiResponse::success(tickets))
}

/// POST /api/tickets
pub async fn create(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Extension(current): Extension<CurrentTenant>,
    Json(payload): Json<Value>,
) -> ApiResult<Ticket> {
    let tenant = require_tenant(current)?;
    let ticket = TicketService::new(state)
        .create(&ctx, &tenant, payload)
        .await?;
    Ok(ApiResponse::created(ticket))
}

/// GET /api/tickets/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Ticket> {
    let ticket = TicketService::new(state).get(&ctx, id).await?;
    Ok(ApiResponse::success(ticket))
}

/// PUT /api/tickets/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<Value>,
) -> ApiResult<Ticket> {
    let ticket = TicketService::new(state).update(&ctx, id, payload).await?;
    Ok(ApiResponse::success(ticket))
}

/// DELETE /api/tickets/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    TicketService::new(state).delete(&ctx, id).await?;
    Ok(ApiResponse::<()>::no_content())
}

/// GET /api/tickets/:id/messages
pub async fn list_messages(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<Message>> {
    let messages = TicketService::new(state).list_messages(&ctx, id).await?;
    Ok(ApiResponse::success(messages))
}

/// POST /api/tickets/:id/messages
pub async fn create_message(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Extension(current): Extension<CurrentTenant>,
    Path(id): Path<Uuid>,
    Json(payload): Json<Value>,
) -> ApiResult<Message> {
    let tenant = require_tenant(current)?;
    let message = TicketService::new(state)
        .create_message(&ctx, &tenant, id, payload)
        .await?;
    Ok(ApiResponse::created(message))
}
