use uuid::Uuid;

use crate::tenancy::ownership::EntityKind;

/// Security-audit events produced by the isolation core. Emission is a
/// structured `tracing` record under the `audit` target; delivery beyond
/// the log stream is the logging collaborator's concern.
///
/// The internal distinction between "absent" and "cross-tenant" lives only
/// here. It never reaches API responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditEvent {
    /// A mutation payload claimed a tenant other than the authenticated
    /// one; the value was corrected and the operation proceeded.
    TenantMismatchCorrected {
        principal_id: Uuid,
        field: String,
        claimed: String,
        actual: Option<Uuid>,
    },

    /// An ownership check found the entity under a different tenant.
    CrossTenantDenied {
        principal_id: Uuid,
        kind: EntityKind,
        entity_id: Uuid,
        tenant_id: Uuid,
    },

    /// A non-privileged caller attempted to act under another tenant via
    /// the override channel; the attempt was ignored.
    TenantOverrideIgnored {
        principal_id: Uuid,
        requested: Uuid,
        bound: Uuid,
    },
}

impl AuditEvent {
    pub fn emit(&self) {
        match self {
            AuditEvent::TenantMismatchCorrected {
                principal_id,
                field,
                claimed,
                actual,
            } => {
                tracing::warn!(
                    target: "audit",
                    event = "tenant_mismatch_corrected",
                    %principal_id,
                    field = %field,
                    claimed = %claimed,
                    actual = ?actual,
                    "payload tenant field corrected to context tenant"
                );
            }
            AuditEvent::CrossTenantDenied {
                principal_id,
                kind,
                entity_id,
                tenant_id,
            } => {
                tracing::warn!(
                    target: "audit",
                    event = "cross_tenant_denied",
                    %principal_id,
                    kind = %kind,
                    %entity_id,
                    %tenant_id,
                    "cross-tenant access denied"
                );
            }
            AuditEvent::TenantOverrideIgnored {
                principal_id,
                requested,
                bound,
            } => {
                tracing::warn!(
                    target: "audit",
                    event = "tenant_override_ignored",
                    %principal_id,
                    %requested,
                    %bound,
                    "tenant override from non-privileged principal ignored"
                );
            }
        }
    }
}
