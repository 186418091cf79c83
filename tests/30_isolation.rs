use std::sync::Arc;
use uuid::Uuid;

use atrium_crm_api::database::MemoryStore;
use atrium_crm_api::error::ApiError;
use atrium_crm_api::tenancy::context::{resolve, Principal, Role};
use atrium_crm_api::tenancy::error::TenancyError;
use atrium_crm_api::tenancy::ownership::{EntityKind, OwnershipValidator};
use atrium_crm_api::tenancy::references::{Reference, ReferenceGraphValidator, ReferencedEntities};
use atrium_crm_api::tenancy::RequestContext;

fn agent_ctx(tenant_id: Uuid) -> RequestContext {
    let principal = Principal {
        id: Uuid::new_v4(),
        role: Role::SupportAgent,
        tenant_id: Some(tenant_id),
        is_active: true,
    };
    resolve(Some(&principal), None).unwrap()
}

fn super_ctx(acting: Option<Uuid>) -> RequestContext {
    let principal = Principal {
        id: Uuid::new_v4(),
        role: Role::SuperAdmin,
        tenant_id: None,
        is_active: true,
    };
    resolve(Some(&principal), acting).unwrap()
}

/// Request shape with one required and one optional reference, matching
/// what a ticket create carries.
struct TicketRequest {
    customer_id: Uuid,
    assignee_id: Option<Uuid>,
}

impl ReferencedEntities for TicketRequest {
    fn references(&self) -> Vec<Reference> {
        vec![
            Reference::required("customer_id", EntityKind::Customer, self.customer_id),
            Reference::optional("assignee_id", EntityKind::User, self.assignee_id),
        ]
    }
}

#[tokio::test]
async fn cross_tenant_read_is_a_plain_not_found() {
    let store = Arc::new(MemoryStore::new());
    let tenant_a = Uuid::new_v4();
    let tenant_b = Uuid::new_v4();
    let customer = Uuid::new_v4();
    store.put_entity(EntityKind::Customer, customer, Some(tenant_b));

    let validator = OwnershipValidator::new(store);
    let ctx = agent_ctx(tenant_a);

    let cross = validator
        .validate(EntityKind::Customer, Some(customer), &ctx)
        .await
        .unwrap_err();
    let absent = validator
        .validate(EntityKind::Customer, Some(Uuid::new_v4()), &ctx)
        .await
        .unwrap_err();

    // Both failures surface as the same 404; a client cannot tell a foreign
    // entity from a missing one.
    let cross: ApiError = cross.into();
    let absent: ApiError = absent.into();
    assert_eq!(cross.status_code(), 404);
    assert_eq!(absent.status_code(), 404);
    assert_eq!(cross.message(), absent.message());
    assert_eq!(cross.to_json(), absent.to_json());
}

#[tokio::test]
async fn foreign_assignee_fails_the_whole_mutation() {
    let store = Arc::new(MemoryStore::new());
    let tenant = Uuid::new_v4();
    let other_tenant = Uuid::new_v4();
    let customer = Uuid::new_v4();
    let foreign_user = Uuid::new_v4();
    store.put_entity(EntityKind::Customer, customer, Some(tenant));
    store.put_entity(EntityKind::User, foreign_user, Some(other_tenant));

    let validator = ReferenceGraphValidator::new(OwnershipValidator::new(store));
    let err = validator
        .validate_all(
            &TicketRequest {
                customer_id: customer,
                assignee_id: Some(foreign_user),
            },
            &agent_ctx(tenant),
        )
        .await
        .unwrap_err();

    // The valid customer does not rescue the request; the failing
    // reference is reported by its own kind.
    match err {
        TenancyError::Ownership { kind, id } => {
            assert_eq!(kind, EntityKind::User);
            assert_eq!(id, foreign_user);
        }
        other => panic!("expected ownership error, got {:?}", other),
    }
}

#[tokio::test]
async fn fully_owned_reference_graph_passes() {
    let store = Arc::new(MemoryStore::new());
    let tenant = Uuid::new_v4();
    let customer = Uuid::new_v4();
    let user = Uuid::new_v4();
    store.put_entity(EntityKind::Customer, customer, Some(tenant));
    store.put_entity(EntityKind::User, user, Some(tenant));

    ReferenceGraphValidator::new(OwnershipValidator::new(store))
        .validate_all(
            &TicketRequest {
                customer_id: customer,
                assignee_id: Some(user),
            },
            &agent_ctx(tenant),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn unscoped_super_admin_reaches_users_but_not_business_entities() {
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

    let err = validator
        .validate(EntityKind::Customer, Some(customer), &unscoped)
        .await
        .unwrap_err();
    assert!(matches!(err, TenancyError::TenantRequired));

    // Scoping through the acting-tenant channel unlocks the same check.
    validator
        .validate(EntityKind::Customer, Some(customer), &super_ctx(Some(tenant)))
        .await
        .unwrap();
}
