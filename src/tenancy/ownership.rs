use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tenancy::audit::AuditEvent;
use crate::tenancy::context::RequestContext;
use crate::tenancy::error::TenancyError;
use crate::tenancy::store::EntityStore;

/// Tenant-scoped entity kinds known to the ownership validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Customer,
    Ticket,
    Message,
    PhoneCall,
    Tag,
    Integration,
}

impl EntityKind {
    /// Backing table. Static strings only; these are interpolated into SQL.
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::User => "users",
            EntityKind::Customer => "customers",
            EntityKind::Ticket => "tickets",
            EntityKind::Message => "messages",
            EntityKind::PhoneCall => "phone_calls",
            EntityKind::Tag => "tags",
            EntityKind::Integration => "integrations",
        }
    }

    /// Label used in client-facing messages.
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Customer => "customer",
            EntityKind::Ticket => "ticket",
            EntityKind::Message => "message",
            EntityKind::PhoneCall => "phone call",
            EntityKind::Tag => "tag",
            EntityKind::Integration => "integration",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Confirms that a referenced entity exists and belongs to the acting
/// tenant before any read, update, delete, or cross-entity link proceeds.
#[derive(Clone)]
pub struct OwnershipValidator {
    store: Arc<dyn EntityStore>,
}

impl OwnershipValidator {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Validate one reference. `id == None` means an optional reference is
    /// absent and trivially validates.
    ///
    /// The absent and cross-tenant cases return the same `Ownership` error
    /// so callers cannot probe for existence across tenants; only the audit
    /// stream records the difference.
    pub async fn validate(
        &self,
        kind: EntityKind,
        id: Option<Uuid>,
        ctx: &RequestContext,
    ) -> Result<(), TenancyError> {
        let Some(id) = id else {
            return Ok(());
        };

        // The cross-tenant capability covers principal records only: a
        // super admin may act on any tenant's users, but business entities
        // still need an explicit tenant scope.
        if ctx.cross_tenant_allowed && kind == EntityKind::User {
            return match self.store.get_entity(kind, id).await? {
                Some(_) => Ok(()),
                None => Err(TenancyError::Ownership { kind, id }),
            };
        }

        let tenant_id = ctx.tenant_id.ok_or(TenancyError::TenantRequired)?;

        match self.store.get_entity(kind, id).await? {
            None => Err(TenancyError::Ownership { kind, id }),
            Some(entity) if entity.tenant_id != Some(tenant_id) => {
                AuditEvent::CrossTenantDenied {
                    principal_id: ctx.principal_id,
                    kind,
                    entity_id: id,
                    tenant_id,
                }
                .emit();
                Err(TenancyError::Ownership { kind, id })
            }
            Some(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryStore;
    use crate::tenancy::context::Role;

    fn ctx_for(tenant_id: Uuid) -> RequestContext {
        RequestContext {
            principal_id: Uuid::new_v4(),
            role: Role::SupportAgent,
            tenant_id: Some(tenant_id),
            cross_tenant_allowed: false,
        }
    }

    fn super_ctx(tenant_id: Option<Uuid>) -> RequestContext {
        RequestContext {
            principal_id: Uuid::new_v4(),
            role: Role::SuperAdmin,
            tenant_id,
            cross_tenant_allowed: true,
        }
    }

    #[tokio::test]
    async fn cross_tenant_lookup_matches_absence() {
        let store = Arc::new(MemoryStore::new());
        let tenant_a = Uuid::new_v4();
        let tenant_b = Uuid::new_v4();
        let customer = Uuid::new_v4();
        store.put_entity(EntityKind::Customer, customer, Some(tenant_b));

        let validator = OwnershipValidator::new(store);
        let ctx = ctx_for(tenant_a);

        let cross = validator
            .validate(EntityKind::Customer, Some(customer), &ctx)
            .await
            .unwrap_err();
        let absent = validator
            .validate(EntityKind::Customer, Some(Uuid::new_v4()), &ctx)
            .await
            .unwrap_err();

        // Same variant, same client-visible message shape.
        assert!(matches!(cross, TenancyError::Ownership { .. }));
        assert!(matches!(absent, TenancyError::Ownership { .. }));
        assert_eq!(cross.to_string(), "customer not found");
        assert_eq!(absent.to_string(), "customer not found");
    }

    #[tokio::test]
    async fn same_tenant_reference_validates() {
        let store = Arc::new(MemoryStore::new());
        let tenant = Uuid::new_v4();
        let ticket = Uuid::new_v4();
        store.put_entity(EntityKind::Ticket, ticket, Some(tenant));

        let validator = OwnershipValidator::new(store);
        validator
            .validate(EntityKind::Ticket, Some(ticket), &ctx_for(tenant))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn absent_optional_reference_validates() {
        let validator = OwnershipValidator::new(Arc::new(MemoryStore::new()));
        validator
            .validate(EntityKind::Ticket, None, &ctx_for(Uuid::new_v4()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn super_admin_sees_any_tenants_users_but_not_business_entities() {
        let store = Arc::new(MemoryStore::new());
        let tenant = Uuid::new_v4();
        let user = Uuid::new_v4();
        let customer = Uuid::new_v4();
        store.put_entity(EntityKind::User, user, Some(tenant));
        store.put_entity(EntityKind::Customer, customer, Some(tenant));

        let validator = OwnershipValidator::new(store);
        let unscoped = super_ctx(None);

        validator
            .validate(EntityKind::User, Some(user), &unscoped)
            .await
            .unwrap();

        // Visibility of principals is not a wildcard over business data.
        let err = validator
            .validate(EntityKind::Customer, Some(customer), &unscoped)
            .await
            .unwrap_err();
        assert!(matches!(err, TenancyError::TenantRequired));

        // With an explicit tenant scope the business check runs normally.
        validator
            .validate(EntityKind::Customer, Some(customer), &super_ctx(Some(tenant)))
            .await
            .unwrap();
    }
}
