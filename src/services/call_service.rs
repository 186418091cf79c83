use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::database::models::PhoneCall;
use crate::services::ServiceError;
use crate::state::AppState;
use crate::tenancy::context::RequestContext;
use crate::tenancy::error::TenancyError;
use crate::tenancy::ownership::EntityKind;
use crate::tenancy::references::{Reference, ReferencedEntities};
use crate::tenancy::sanitize::sanitize_payload;
use crate::tenancy::store::TenantRef;

const DIRECTIONS: [&str; 2] = ["inbound", "outbound"];

#[derive(Debug, Deserialize)]
pub struct CreateCallRequest {
    pub customer_id: Uuid,
    /// Agent on the call. Defaults to the acting principal when omitted.
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub ticket_id: Option<Uuid>,
    pub direction: String,
    pub duration_secs: i32,
    #[serde(default)]
    pub notes: Option<String>,
}

struct NewCall<'a> {
    request: &'a CreateCallRequest,
    user_id: Uuid,
}

impl ReferencedEntities for NewCall<'_> {
    fn references(&self) -> Vec<Reference> {
        vec![
            Reference::required("customer_id", EntityKind::Customer, self.request.customer_id),
            Reference::required("user_id", EntityKind::User, self.user_id),
            Reference::optional("ticket_id", EntityKind::Ticket, self.request.ticket_id),
        ]
    }
}

pub struct CallService {
    state: AppState,
}

impl CallService {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    pub async fn list(&self, ctx: &RequestContext) -> Result<Vec<PhoneCall>, ServiceError> {
        let tenant_id = ctx.tenant_id.ok_or(TenancyError::TenantRequired)?;
        let calls = sqlx::query_as::<_, PhoneCall>(
            "SELECT id, tenant_id, customer_id, user_id, ticket_id, direction, duration_secs, \
             notes, created_at \
             FROM phone_calls WHERE tenant_id = $1 ORDER BY created_at DESC",
        )
        .bind(tenant_id)
        .fetch_all(&self.state.pool)
        .await?;
        Ok(calls)
    }

    pub async fn create(
        &self,
        ctx: &RequestContext,
        tenant: &TenantRef,
        payload: Value,
    ) -> Result<PhoneCall, ServiceError> {
        let (payload, audit) = sanitize_payload(payload, ctx);
        if let Some(event) = audit {
            event.emit();
        }

        let request: CreateCallRequest = serde_json::from_value(payload)
            .map_err(|e| ServiceError::Validation(format!("Invalid call payload: {}", e)))?;
        if !DIRECTIONS.contains(&request.direction.as_str()) {
            return Err(ServiceError::Validation(format!(
                "Invalid direction: {} (expected one of {})",
                request.direction,
                DIRECTIONS.join(", ")
            )));
        }
        if request.duration_secs < 0 {
            return Err(ServiceError::Validation(
                "Call duration cannot be negative".into(),
            ));
        }

        let user_id = request.user_id.unwrap_or(ctx.principal_id);
        let new_call = NewCall {
            request: &request,
            user_id,
        };
        self.state.refs.validate_all(&new_call, ctx).await?;

        let call = sqlx::query_as::<_, PhoneCall>(
            "INSERT INTO phone_calls (id, tenant_id, customer_id, user_id, ticket_id, direction, \
             duration_secs, notes, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW()) \
             RETURNING id, tenant_id, customer_id, user_id, ticket_id, direction, duration_secs, \
             notes, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(tenant.id)
        .bind(request.customer_id)
        .bind(user_id)
        .bind(request.ticket_id)
        .bind(&request.direction)
        .bind(request.duration_secs)
        .bind(&request.notes)
        .fetch_one(&self.state.pool)
        .await?;

        Ok(call)
    }
}
