use serde_json::{json, Value};

use crate::tenancy::audit::AuditEvent;
use crate::tenancy::context::RequestContext;

/// Tenant-identifying field names clients have been observed to send.
/// All of them are stripped; the canonical `tenant_id` is rewritten from
/// the context.
const TENANT_FIELDS: [&str; 5] = [
    "tenant_id",
    "tenantId",
    "tenant",
    "org_id",
    "organization_id",
];

/// Scrub tenant-identifying fields from a mutation payload and stamp the
/// context tenant in their place.
///
/// Pure function: when a stripped value differs from the context tenant the
/// mismatch is returned as an audit event rather than emitted here, so the
/// caller decides how to surface it. The corrected payload is used either
/// way; a benign client bug is not a hard failure.
pub fn sanitize_payload(
    mut payload: Value,
    ctx: &RequestContext,
) -> (Value, Option<AuditEvent>) {
    let Some(obj) = payload.as_object_mut() else {
        return (payload, None);
    };

    let mut mismatch: Option<(String, String)> = None;

    for field in TENANT_FIELDS {
        let Some(value) = obj.remove(field) else {
            continue;
        };
        if value.is_null() {
            continue;
        }

        let claimed = match value.as_str() {
            Some(s) => s.to_string(),
            None => value.to_string(),
        };
        let differs = match ctx.tenant_id {
            Some(tenant_id) => claimed != tenant_id.to_string(),
            None => true,
        };
        if differs && mismatch.is_none() {
            mismatch = Some((field.to_string(), claimed));
        }
    }

    if let Some(tenant_id) = ctx.tenant_id {
        obj.insert("tenant_id".to_string(), json!(tenant_id));
    }

    let event = mismatch.map(|(field, claimed)| AuditEvent::TenantMismatchCorrected {
        principal_id: ctx.principal_id,
        field,
        claimed,
        actual: ctx.tenant_id,
    });

    (payload, event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenancy::context::Role;
    use uuid::Uuid;

    fn ctx(tenant_id: Uuid) -> RequestContext {
        RequestContext {
            principal_id: Uuid::new_v4(),
            role: Role::TenantAdmin,
            tenant_id: Some(tenant_id),
            cross_tenant_allowed: false,
        }
    }

    #[test]
    fn foreign_tenant_value_is_replaced_and_reported() {
        let tenant = Uuid::new_v4();
        let (sanitized, event) = sanitize_payload(
            json!({ "name": "Acme", "tenant_id": "tenant-b" }),
            &ctx(tenant),
        );

        assert_eq!(sanitized["tenant_id"], json!(tenant));
        assert_eq!(sanitized["name"], json!("Acme"));
        match event {
            Some(AuditEvent::TenantMismatchCorrected { claimed, .. }) => {
                assert_eq!(claimed, "tenant-b");
            }
            other => panic!("expected mismatch event, got {:?}", other),
        }
    }

    #[test]
    fn all_naming_variants_are_stripped() {
        let tenant = Uuid::new_v4();
        let (sanitized, _) = sanitize_payload(
            json!({
                "tenantId": "x",
                "tenant": "y",
                "org_id": "z",
                "organization_id": "w",
                "subject": "hi"
            }),
            &ctx(tenant),
        );

        let obj = sanitized.as_object().unwrap();
        assert_eq!(obj.get("tenant_id"), Some(&json!(tenant)));
        for field in ["tenantId", "tenant", "org_id", "organization_id"] {
            assert!(!obj.contains_key(field), "{} should be stripped", field);
        }
    }

    #[test]
    fn matching_tenant_value_is_silent() {
        let tenant = Uuid::new_v4();
        let (sanitized, event) =
            sanitize_payload(json!({ "tenant_id": tenant.to_string() }), &ctx(tenant));
        assert_eq!(sanitized["tenant_id"], json!(tenant));
        assert!(event.is_none());
    }

    #[test]
    fn absent_tenant_field_is_silent() {
        let tenant = Uuid::new_v4();
        let (sanitized, event) = sanitize_payload(json!({ "name": "Acme" }), &ctx(tenant));
        assert_eq!(sanitized["tenant_id"], json!(tenant));
        assert!(event.is_none());
    }

    #[test]
    fn non_object_payload_passes_through() {
        let tenant = Uuid::new_v4();
        let (sanitized, event) = sanitize_payload(json!([1, 2, 3]), &ctx(tenant));
        assert_eq!(sanitized, json!([1, 2, 3]));
        assert!(event.is_none());
    }
}
