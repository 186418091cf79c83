pub mod auth;
pub mod calls;
pub mod customers;
pub mod tickets;
pub mod users;

use crate::error::ApiError;
use crate::middleware::CurrentTenant;
use crate::tenancy::error::TenancyError;
use crate::tenancy::store::TenantRef;

/// Unwraps the tenant injected by the context middleware. Absent only for
/// super admins that did not pick an acting tenant, which tenant-scoped
/// endpoints reject.
fn require_tenant(current: CurrentTenant) -> Result<TenantRef, ApiError> {
    current.0.ok_or_else(|| TenancyError::TenantRequired.into())
}
