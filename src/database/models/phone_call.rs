use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PhoneCall {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub customer_id: Uuid,
    pub user_id: Uuid,
    pub ticket_id: Option<Uuid>,
    pub direction: String,
    pub duration_secs: i32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}
