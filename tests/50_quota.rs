use std::sync::Arc;

use futures::future::join_all;
use uuid::Uuid;

use atrium_crm_api::database::MemoryStore;
use atrium_crm_api::error::ApiError;
use atrium_crm_api::tenancy::quota::{CounterKind, QuotaPolicy, QuotaTracker, QuotaWarning};
use atrium_crm_api::tenancy::store::{CounterStore, TenantRef};
use atrium_crm_api::tenancy::TenancyError;

const DAY_SECS: i64 = 86_400;

fn tenant_with(policy: QuotaPolicy) -> TenantRef {
    TenantRef {
        id: Uuid::new_v4(),
        name: "acme".to_string(),
        suspended: false,
        policy,
    }
}

fn tracker(store: Arc<MemoryStore>) -> QuotaTracker {
    QuotaTracker::new(store, 80, DAY_SECS)
}

#[tokio::test]
async fn sixth_user_is_rejected_and_the_count_stays() {
    let store = Arc::new(MemoryStore::new());
    let tenant = tenant_with(QuotaPolicy {
        max_users: 5,
        max_customers: 100,
        max_api_calls: 1_000,
    });
    let tracker = tracker(store);

    for _ in 0..5 {
        tracker
            .check_and_reserve(&tenant, CounterKind::Users)
            .await
            .unwrap();
        tracker
            .record_created(tenant.id, CounterKind::Users)
            .await
            .unwrap();
    }

    let err = tracker
        .check_and_reserve(&tenant, CounterKind::Users)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TenancyError::QuotaExceeded {
            counter: CounterKind::Users,
            usage: 5,
            limit: 5,
        }
    ));

    // The failed attempt reserved nothing.
    assert_eq!(
        tracker.usage(tenant.id, CounterKind::Users).await.unwrap(),
        5
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_creates_settle_at_the_exact_count() {
    let store = Arc::new(MemoryStore::new());
    let tenant = tenant_with(QuotaPolicy {
        max_users: 3,
        max_customers: 1_000,
        max_api_calls: 10_000,
    });
    let tracker = tracker(store);

    let tasks: Vec<_> = (0..50)
        .map(|_| {
            let tracker = tracker.clone();
            let tenant_id = tenant.id;
            tokio::spawn(async move {
                tracker
                    .record_created(tenant_id, CounterKind::Customers)
                    .await
            })
        })
        .collect();

    for result in join_all(tasks).await {
        result.unwrap().unwrap();
    }

    assert_eq!(
        tracker
            .usage(tenant.id, CounterKind::Customers)
            .await
            .unwrap(),
        50
    );
}

#[tokio::test]
async fn warning_rides_alongside_a_successful_create() {
    let store = Arc::new(MemoryStore::new());
    let tenant = tenant_with(QuotaPolicy {
        max_users: 3,
        max_customers: 100,
        max_api_calls: 1_000,
    });
    store
        .increment(tenant.id, CounterKind::Customers, 85)
        .await
        .unwrap();

    let warning = tracker(store)
        .check_and_reserve(&tenant, CounterKind::Customers)
        .await
        .unwrap();

    assert_eq!(
        warning,
        Some(QuotaWarning {
            counter: CounterKind::Customers,
            usage: 85,
            limit: 100,
        })
    );
}

#[tokio::test]
async fn exhausted_quota_surfaces_as_too_many_requests() {
    let store = Arc::new(MemoryStore::new());
    let tenant = tenant_with(QuotaPolicy {
        max_users: 1,
        max_customers: 100,
        max_api_calls: 1_000,
    });
    let tracker = tracker(store);
    tracker
        .record_created(tenant.id, CounterKind::Users)
        .await
        .unwrap();

    let err: ApiError = tracker
        .check_and_reserve(&tenant, CounterKind::Users)
        .await
        .unwrap_err()
        .into();
    assert_eq!(err.status_code(), 429);
    assert_eq!(err.message(), "user quota exceeded (1 of 1)");
}
