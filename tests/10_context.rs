use serde_json::json;
use uuid::Uuid;

use atrium_crm_api::tenancy::context::{resolve, Principal, Role};
use atrium_crm_api::tenancy::error::TenancyError;
use atrium_crm_api::tenancy::sanitize::sanitize_payload;

fn agent(tenant_id: Uuid) -> Principal {
    Principal {
        id: Uuid::new_v4(),
        role: Role::SupportAgent,
        tenant_id: Some(tenant_id),
        is_active: true,
    }
}

#[test]
fn missing_principal_is_unauthenticated() {
    let err = resolve(None, None).unwrap_err();
    assert!(matches!(err, TenancyError::Unauthenticated));
}

#[test]
fn inactive_principal_is_unauthenticated() {
    let principal = Principal {
        is_active: false,
        ..agent(Uuid::new_v4())
    };
    let err = resolve(Some(&principal), None).unwrap_err();
    assert!(matches!(err, TenancyError::Unauthenticated));
}

#[test]
fn acting_tenant_header_is_ignored_for_tenant_bound_roles() {
    let tenant = Uuid::new_v4();
    let other = Uuid::new_v4();
    let principal = agent(tenant);

    let ctx = resolve(Some(&principal), Some(other)).unwrap();
    assert_eq!(ctx.tenant_id, Some(tenant));
    assert!(!ctx.cross_tenant_allowed);
}

#[test]
fn super_admin_scopes_to_acting_tenant() {
    let acting = Uuid::new_v4();
    let principal = Principal {
        id: Uuid::new_v4(),
        role: Role::SuperAdmin,
        tenant_id: None,
        is_active: true,
    };

    let scoped = resolve(Some(&principal), Some(acting)).unwrap();
    assert_eq!(scoped.tenant_id, Some(acting));
    assert!(scoped.cross_tenant_allowed);

    let unscoped = resolve(Some(&principal), None).unwrap();
    assert_eq!(unscoped.tenant_id, None);
}

// A payload claiming another tenant, run through the resolved context,
// always ends up stamped with the authenticated tenant.
#[test]
fn resolved_context_overrides_claimed_tenant_in_payload() {
    let tenant = Uuid::new_v4();
    let foreign = Uuid::new_v4();
    let principal = agent(tenant);
    let ctx = resolve(Some(&principal), None).unwrap();

    let (sanitized, event) = sanitize_payload(
        json!({ "name": "Acme", "tenant_id": foreign.to_string() }),
        &ctx,
    );

    assert_eq!(sanitized["tenant_id"], json!(tenant));
    assert!(event.is_some(), "mismatch should produce an audit event");
}
