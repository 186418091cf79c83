use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::database::models::{Message, Ticket};
use crate::services::ServiceError;
use crate::state::AppState;
use crate::tenancy::context::RequestContext;
use crate::tenancy::error::TenancyError;
use crate::tenancy::ownership::EntityKind;
use crate::tenancy::references::{Reference, ReferencedEntities};
use crate::tenancy::sanitize::sanitize_payload;
use crate::tenancy::store::TenantRef;

const STATUSES: [&str; 3] = ["open", "pending", "closed"];
const PRIORITIES: [&str; 4] = ["low", "normal", "high", "urgent"];

#[derive(Debug, Deserialize)]
pub struct CreateTicketRequest {
    pub customer_id: Uuid,
    #[serde(default)]
    pub assignee_id: Option<Uuid>,
    pub subject: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTicketRequest {
    #[serde(default)]
    pub assignee_id: Option<Uuid>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMessageRequest {
    pub body: String,
}

/// Fully resolved ticket mutation: the client payload plus the acting
/// principal as creator. Validated as one unit before any write.
struct NewTicket<'a> {
    request: &'a CreateTicketRequest,
    created_by: Uuid,
}

impl ReferencedEntities for NewTicket<'_> {
    fn references(&self) -> Vec<Reference> {
        vec![
            Reference::required("customer_id", EntityKind::Customer, self.request.customer_id),
            Reference::optional("assignee_id", EntityKind::User, self.request.assignee_id),
            Reference::required("created_by", EntityKind::User, self.created_by),
        ]
    }
}

struct NewMessage {
    ticket_id: Uuid,
    sender_id: Uuid,
}

impl ReferencedEntities for NewMessage {
    fn references(&self) -> Vec<Reference> {
        vec![
            Reference::required("ticket_id", EntityKind::Ticket, self.ticket_id),
            Reference::required("sender_id", EntityKind::User, self.sender_id),
        ]
    }
}

pub struct TicketService {
    state: AppState,
}

impl TicketService {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    pub async fn list(&self, ctx: &RequestContext) -> Result<Vec<Ticket>, ServiceError> {
        let tenant_id = ctx.tenant_id.ok_or(TenancyError::TenantRequired)?;
        let tickets = sqlx::query_as::<_, Ticket>(
            "SELECT id, tenant_id, customer_id, assignee_id, created_by, subject, status, \
             priority, created_at, updated_at \
             FROM tickets WHERE tenant_id = $1 ORDER BY created_at DESC",
        )
        .bind(tenant_id)
        .fetch_all(&self.state.pool)
        .await?;
        Ok(tickets)
    }

    pub async fn get(&self, ctx: &RequestContext, id: Uuid) -> Result<Ticket, ServiceError> {
        self.state
            .ownership
            .validate(EntityKind::Ticket, Some(id), ctx)
            .await?;
        let tenant_id = ctx.tenant_id.ok_or(TenancyError::TenantRequired)?;

        let ticket = sqlx::query_as::<_, Ticket>(
            "SELECT id, tenant_id, customer_id, assignee_id, created_by, subject, status, \
             priority, created_at, updated_at \
             FROM tickets WHERE id = $1 AND tenant_id = $2",
        )
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&self.state.pool)
        .await?;

        ticket.ok_or_else(|| {
            TenancyError::Ownership {
                kind: EntityKind::Ticket,
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
    ) -> Result<Ticket, ServiceError> {
        let (payload, audit) = sanitize_payload(payload, ctx);
        if let Some(event) = audit {
            event.emit();
        }

        let request: CreateTicketRequest = serde_json::from_value(payload)
            .map_err(|e| ServiceError::Validation(format!("Invalid ticket payload: {}", e)))?;
        if request.subject.trim().is_empty() {
            return Err(ServiceError::Validation("Ticket subject is required".into()));
        }
        let status = validate_choice("status", request.status.as_deref(), &STATUSES, "open")?;
        let priority =
            validate_choice("priority", request.priority.as_deref(), &PRIORITIES, "normal")?;

        // Every reference must pass before the insert; a ticket is never
        // written with a half-validated graph.
        let new_ticket = NewTicket {
            request: &request,
            created_by: ctx.principal_id,
        };
        self.state.refs.validate_all(&new_ticket, ctx).await?;

        let ticket = sqlx::query_as::<_, Ticket>(
            "INSERT INTO tickets (id, tenant_id, customer_id, assignee_id, created_by, subject, \
             status, priority, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW()) \
             RETURNING id, tenant_id, customer_id, assignee_id, created_by, subject, status, \
             priority, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(tenant.id)
        .bind(request.customer_id)
        .bind(request.assignee_id)
        .bind(ctx.principal_id)
        .bind(request.subject.trim())
        .bind(status)
        .bind(priority)
        .fetch_one(&self.state.pool)
        .await?;

        Ok(ticket)
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        payload: Value,
    ) -> Result<Ticket, ServiceError> {
        let (payload, audit) = sanitize_payload(payload, ctx);
        if let Some(event) = audit {
            event.emit();
        }

        let request: UpdateTicketRequest = serde_json::from_value(payload)
            .map_err(|e| ServiceError::Validation(format!("Invalid ticket payload: {}", e)))?;
        if let Some(status) = request.status.as_deref() {
            validate_choice("status", Some(status), &STATUSES, "open")?;
        }
        if let Some(priority) = request.priority.as_deref() {
            validate_choice("priority", Some(priority), &PRIORITIES, "normal")?;
        }

        self.state
            .ownership
            .validate(EntityKind::Ticket, Some(id), ctx)
            .await?;
        self.state
            .ownership
            .validate(EntityKind::User, request.assignee_id, ctx)
            .await?;
        let tenant_id = ctx.tenant_id.ok_or(TenancyError::TenantRequired)?;

        let ticket = sqlx::query_as::<_, Ticket>(
            "UPDATE tickets SET \
             assignee_id = COALESCE($3, assignee_id), \
             subject = COALESCE($4, subject), \
             status = COALESCE($5, status), \
             priority = COALESCE($6, priority), \
             updated_at = NOW() \
             WHERE id = $1 AND tenant_id = $2 \
             RETURNING id, tenant_id, customer_id, assignee_id, created_by, subject, status, \
             priority, created_at, updated_at",
        )
        .bind(id)
        .bind(tenant_id)
        .bind(request.assignee_id)
        .bind(&request.subject)
        .bind(&request.status)
        .bind(&request.priority)
        .fetch_optional(&self.state.pool)
        .await?;

        ticket.ok_or_else(|| {
            TenancyError::Ownership {
                kind: EntityKind::Ticket,
                id,
            }
            .into()
        })
    }

    pub async fn delete(&self, ctx: &RequestContext, id: Uuid) -> Result<(), ServiceError> {
        self.state
            .ownership
            .validate(EntityKind::Ticket, Some(id), ctx)
            .await?;
        let tenant_id = ctx.tenant_id.ok_or(TenancyError::TenantRequired)?;

        let result = sqlx::query("DELETE FROM tickets WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(&self.state.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(TenancyError::Ownership {
                kind: EntityKind::Ticket,
                id,
            }
            .into());
        }
        Ok(())
    }

    pub async fn list_messages(
        &self,
        ctx: &RequestContext,
        ticket_id: Uuid,
    ) -> Result<Vec<Message>, ServiceError> {
        self.state
            .ownership
            .validate(EntityKind::Ticket, Some(ticket_id), ctx)
            .await?;
        let tenant_id = ctx.tenant_id.ok_or(TenancyError::TenantRequired)?;

        let messages = sqlx::query_as::<_, Message>(
            "SELECT id, tenant_id, ticket_id, sender_id, body, created_at \
             FROM messages WHERE ticket_id = $1 AND tenant_id = $2 ORDER BY created_at ASC",
        )
        .bind(ticket_id)
        .bind(tenant_id)
        .fetch_all(&self.state.pool)
        .await?;
        Ok(messages)
    }

    pub async fn create_message(
        &self,
        ctx: &RequestContext,
        tenant: &TenantRef,
        ticket_id: Uuid,
        payload: Value,
    ) -> Result<Message, ServiceError> {
        let (payload, audit) = sanitize_payload(payload, ctx);
        if let Some(event) = audit {
            event.emit();
        }

        let request: CreateMessageRequest = serde_json::from_value(payload)
            .map_err(|e| ServiceError::Validation(format!("Invalid message payload: {}", e)))?;
        if request.body.trim().is_empty() {
            return Err(ServiceError::Validation("Message body is required".into()));
        }

        let new_message = NewMessage {
            ticket_id,
            sender_id: ctx.principal_id,
        };
        self.state.refs.validate_all(&new_message, ctx).await?;

        let message = sqlx::query_as::<_, Message>(
            "INSERT INTO messages (id, tenant_id, ticket_id, sender_id, body, created_at) \
             VALUES ($1, $2, $3, $4, $5, NOW()) \
             RETURNING id, tenant_id, ticket_id, sender_id, body, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(tenant.id)
        .bind(ticket_id)
        .bind(ctx.principal_id)
        .bind(request.body.trim())
        .fetch_one(&self.state.pool)
        .await?;

        Ok(message)
    }
}

fn validate_choice(
    field: &str,
    value: Option<&str>,
    allowed: &[&str],
    default: &'static str,
) -> Result<String, ServiceError> {
    match value {
        None => Ok(default.to_string()),
        Some(v) if allowed.contains(&v) => Ok(v.to_string()),
        Some(v) => Err(ServiceError::Validation(format!(
            "Invalid {}: {} (expected one of {})",
            field,
            v,
            allowed.join(", ")
        ))),
    }
}
