use uuid::Uuid;

use crate::tenancy::context::RequestContext;
use crate::tenancy::error::TenancyError;
use crate::tenancy::ownership::{EntityKind, OwnershipValidator};

/// One foreign reference carried by an incoming mutation. `field` is the
/// request field name, kept for error context in logs.
#[derive(Debug, Clone, Copy)]
pub struct Reference {
    pub field: &'static str,
    pub kind: EntityKind,
    pub id: Option<Uuid>,
}

impl Reference {
    pub fn required(field: &'static str, kind: EntityKind, id: Uuid) -> Self {
        Self {
            field,
            kind,
            id: Some(id),
        }
    }

    pub fn optional(field: &'static str, kind: EntityKind, id: Option<Uuid>) -> Self {
        Self { field, kind, id }
    }
}

/// Implemented by request types that reference other entities. References
/// are returned in declaration order; validation preserves that order.
pub trait ReferencedEntities {
    fn references(&self) -> Vec<Reference>;
}

/// Validates every reference in a mutation before any write happens.
///
/// Checks run strictly in sequence and stop at the first failure, so the
/// reported entity is deterministic for a given request. All references
/// must pass before the caller is allowed to touch storage; a mutation is
/// never half-validated.
#[derive(Clone)]
pub struct ReferenceGraphValidator {
    ownership: OwnershipValidator,
}

impl ReferenceGraphValidator {
    pub fn new(ownership: OwnershipValidator) -> Self {
        Self { ownership }
    }

    pub async fn validate_all<R: ReferencedEntities>(
        &self,
        request: &R,
        ctx: &RequestContext,
    ) -> Result<(), TenancyError> {
        for reference in request.references() {
            self.ownership
                .validate(reference.kind, reference.id, ctx)
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::database::memory::MemoryStore;
    use crate::tenancy::context::Role;

    struct FakeRequest {
        customer_id: Uuid,
        assignee_id: Option<Uuid>,
    }

    impl ReferencedEntities for FakeRequest {
        fn references(&self) -> Vec<Reference> {
            vec![
                Reference::required("customer_id", EntityKind::Customer, self.customer_id),
                Reference::optional("assignee_id", EntityKind::User, self.assignee_id),
            ]
        }
    }

    fn ctx_for(tenant_id: Uuid) -> RequestContext {
        RequestContext {
            principal_id: Uuid::new_v4(),
            role: Role::SupportAgent,
            tenant_id: Some(tenant_id),
            cross_tenant_allowed: false,
        }
    }

    fn validator(store: Arc<MemoryStore>) -> ReferenceGraphValidator {
        ReferenceGraphValidator::new(OwnershipValidator::new(store))
    }

    #[tokio::test]
    async fn all_references_valid_passes() {
        let store = Arc::new(MemoryStore::new());
        let tenant = Uuid::new_v4();
        let customer = Uuid::new_v4();
        let user = Uuid::new_v4();
        store.put_entity(EntityKind::Customer, customer, Some(tenant));
        store.put_entity(EntityKind::User, user, Some(tenant));

        validator(store)
            .validate_all(
                &FakeRequest {
                    customer_id: customer,
                    assignee_id: Some(user),
                },
                &ctx_for(tenant),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn first_failure_wins() {
        let store = Arc::new(MemoryStore::new());
        let tenant = Uuid::new_v4();
        let other_tenant = Uuid::new_v4();
        let customer = Uuid::new_v4();
        store.put_entity(EntityKind::Customer, customer, Some(other_tenant));
        // The assignee reference is also invalid, but the customer check
        // runs first and short-circuits.
        let err = validator(store)
            .validate_all(
                &FakeRequest {
                    customer_id: customer,
                    assignee_id: Some(Uuid::new_v4()),
                },
                &ctx_for(tenant),
            )
            .await
            .unwrap_err();

        match err {
            TenancyError::Ownership { kind, id } => {
                assert_eq!(kind, EntityKind::Customer);
                assert_eq!(id, customer);
            }
            other => panic!("expected ownership error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn absent_optional_reference_is_skipped() {
        let store = Arc::new(MemoryStore::new());
        let tenant = Uuid::new_v4();
        let customer = Uuid::new_v4();
        store.put_entity(EntityKind::Customer, customer, Some(tenant));

        validator(store)
            .validate_all(
                &FakeRequest {
                    customer_id: customer,
                    assignee_id: None,
                },
                &ctx_for(tenant),
            )
            .await
            .unwrap();
    }
}
