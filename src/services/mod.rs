pub mod call_service;
pub mod customer_service;
pub mod tenant_service;
pub mod ticket_service;
pub mod user_service;

pub use call_service::CallService;
pub use customer_service::CustomerService;
pub use tenant_service::{TenantService, TenantError};
pub use ticket_service::TicketService;
pub use user_service::UserService;

use crate::error::ApiError;
use crate::tenancy::error::TenancyError;

/// Shared failure alphabet of the entity services. Isolation and quota
/// failures pass through as `Tenancy`; the rest is request validation and
/// storage.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Tenancy(#[from] TenancyError),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Tenancy(e) => e.into(),
            ServiceError::Validation(msg) => ApiError::validation_error(msg, None),
            ServiceError::Forbidden(msg) => ApiError::forbidden(msg),
            ServiceError::Conflict(msg) => ApiError::conflict(msg),
            ServiceError::Database(e) => e.into(),
        }
    }
}
