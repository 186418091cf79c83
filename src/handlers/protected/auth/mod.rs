use axum::Extension;
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult, CurrentTenant};
use crate::tenancy::context::RequestContext;

/// GET /api/auth/whoami
pub async fn whoami(
    Extension(ctx): Extension<RequestContext>,
    Extension(CurrentTenant(tenant)): Extension<CurrentTenant>,
) -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "principal_id": ctx.principal_id,
        "role": ctx.role.as_str(),
        "cross_tenant_allowed": ctx.cross_tenant_allowed,
        "tenant": tenant.map(|t| json!({ "id": t.id, "name": t.name })),
    })))
}
