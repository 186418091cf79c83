use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tenancy::audit::AuditEvent;
use crate::tenancy::error::TenancyError;

/// Fixed role set. `SuperAdmin` is the one cross-tenant role; everything
/// else is bound to a single tenant at authentication time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    TenantAdmin,
    SupportAgent,
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::TenantAdmin => "tenant_admin",
            Role::SupportAgent => "support_agent",
            Role::Customer => "customer",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super_admin" => Ok(Role::SuperAdmin),
            "tenant_admin" => Ok(Role::TenantAdmin),
            "support_agent" => Ok(Role::SupportAgent),
            "customer" => Ok(Role::Customer),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verified principal handed over by the authentication collaborator.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
    pub tenant_id: Option<Uuid>,
    pub is_active: bool,
}

/// Immutable per-request identity context. `tenant_id` comes from the
/// authenticated principal, never from client payload fields.
/// `cross_tenant_allowed` is the explicit capability flag consulted by the
/// validators instead of re-deriving it from the role.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub principal_id: Uuid,
    pub role: Role,
    pub tenant_id: Option<Uuid>,
    pub cross_tenant_allowed: bool,
}

/// Resolve the acting context from a verified principal.
///
/// `acting_tenant` is the operator-controlled override channel (the
/// `x-acting-tenant` header). Only the cross-tenant role may use it; for
/// every other role a differing value is ignored and logged as a security
/// event, and the tenant bound at authentication wins.
pub fn resolve(
    principal: Option<&Principal>,
    acting_tenant: Option<Uuid>,
) -> Result<RequestContext, TenancyError> {
    let principal = principal.ok_or(TenancyError::Unauthenticated)?;

    if !principal.is_active {
        return Err(TenancyError::Unauthenticated);
    }

    if principal.role == Role::SuperAdmin {
        return Ok(RequestContext {
            principal_id: principal.id,
            role: principal.role,
            tenant_id: acting_tenant,
            cross_tenant_allowed: true,
        });
    }

    let tenant_id = principal.tenant_id.ok_or(TenancyError::TenantRequired)?;

    if let Some(requested) = acting_tenant {
        if requested != tenant_id {
            AuditEvent::TenantOverrideIgnored {
                principal_id: principal.id,
                requested,
                bound: tenant_id,
            }
            .emit();
        }
    }

    Ok(RequestContext {
        principal_id: principal.id,
        role: principal.role,
        tenant_id: Some(tenant_id),
        cross_tenant_allowed: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(tenant: Option<Uuid>) -> Principal {
        Principal {
            id: Uuid::new_v4(),
            role: Role::SupportAgent,
            tenant_id: tenant,
            is_active: true,
        }
    }

    #[test]
    fn missing_principal_is_unauthenticated() {
        assert!(matches!(
            resolve(None, None),
            Err(TenancyError::Unauthenticated)
        ));
    }

    #[test]
    fn inactive_principal_is_unauthenticated() {
        let mut p = agent(Some(Uuid::new_v4()));
        p.is_active = false;
        assert!(matches!(
            resolve(Some(&p), None),
            Err(TenancyError::Unauthenticated)
        ));
    }

    #[test]
    fn bound_tenant_wins_over_override() {
        let bound = Uuid::new_v4();
        let p = agent(Some(bound));
        let ctx = resolve(Some(&p), Some(Uuid::new_v4())).unwrap();
        assert_eq!(ctx.tenant_id, Some(bound));
        assert!(!ctx.cross_tenant_allowed);
    }

    #[test]
    fn non_privileged_without_tenant_is_rejected() {
        let p = agent(None);
        assert!(matches!(
            resolve(Some(&p), None),
            Err(TenancyError::TenantRequired)
        ));
    }

    #[test]
    fn super_admin_takes_override_tenant() {
        let p = Principal {
            id: Uuid::new_v4(),
            role: Role::SuperAdmin,
            tenant_id: None,
            is_active: true,
        };
        let acting = Uuid::new_v4();
        let ctx = resolve(Some(&p), Some(acting)).unwrap();
        assert_eq!(ctx.tenant_id, Some(acting));
        assert!(ctx.cross_tenant_allowed);

        let unscoped = resolve(Some(&p), None).unwrap();
        assert_eq!(unscoped.tenant_id, None);
    }
}
