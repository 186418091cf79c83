pub mod tenants;

use crate::error::ApiError;
use crate::tenancy::context::RequestContext;

/// Gate for `/api/root/...` routes. The capability flag is set only for
/// super admins during context resolution.
fn require_elevated(ctx: &RequestContext) -> Result<(), ApiError> {
    if ctx.cross_tenant_allowed {
        Ok(())
    } else {
        Err(ApiError::forbidden("Super admin access required"))
    }
}
