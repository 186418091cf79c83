use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tenancy::error::TenancyError;
use crate::tenancy::store::{CounterStore, TenantRef};

/// Metered resource kinds. The string forms double as the `kind` column in
/// `usage_counters`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterKind {
    Users,
    Customers,
    ApiCalls,
}

impl CounterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CounterKind::Users => "users",
            CounterKind::Customers => "customers",
            CounterKind::ApiCalls => "api_calls",
        }
    }

    /// Label used in client-facing messages.
    pub fn label(&self) -> &'static str {
        match self {
            CounterKind::Users => "user",
            CounterKind::Customers => "customer",
            CounterKind::ApiCalls => "API call",
        }
    }
}

impl std::fmt::Display for CounterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Hard limits attached to a tenant. Derived from the plan tier at tenant
/// creation and rewritten on plan change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaPolicy {
    pub max_users: i64,
    pub max_customers: i64,
    pub max_api_calls: i64,
}

impl QuotaPolicy {
    pub fn limit(&self, kind: CounterKind) -> i64 {
        match kind {
            CounterKind::Users => self.max_users,
            CounterKind::Customers => self.max_customers,
            CounterKind::ApiCalls => self.max_api_calls,
        }
    }
}

/// Subscription tiers and the policies they carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanTier {
    Free,
    Team,
    Business,
    Enterprise,
}

impl PlanTier {
    pub fn policy(&self) -> QuotaPolicy {
        match self {
            PlanTier::Free => QuotaPolicy {
                max_users: 3,
                max_customers: 100,
                max_api_calls: 1_000,
            },
            PlanTier::Team => QuotaPolicy {
                max_users: 10,
                max_customers: 1_000,
                max_api_calls: 10_000,
            },
            PlanTier::Business => QuotaPolicy {
                max_users: 50,
                max_customers: 10_000,
                max_api_calls: 100_000,
            },
            PlanTier::Enterprise => QuotaPolicy {
                max_users: 500,
                max_customers: 100_000,
                max_api_calls: 1_000_000,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Team => "team",
            PlanTier::Business => "business",
            PlanTier::Enterprise => "enterprise",
        }
    }
}

impl std::str::FromStr for PlanTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(PlanTier::Free),
            "team" => Ok(PlanTier::Team),
            "business" => Ok(PlanTier::Business),
            "enterprise" => Ok(PlanTier::Enterprise),
            other => Err(format!("unknown plan tier: {}", other)),
        }
    }
}

impl std::fmt::Display for PlanTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-counter state derived from usage against the limit. Integer
/// arithmetic only; `usage * 100` stays far below i64 range for any
/// realistic counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaState {
    Normal,
    Warning,
    Blocked,
}

pub fn quota_state(usage: i64, limit: i64, warning_pct: i64) -> QuotaState {
    if usage >= limit {
        QuotaState::Blocked
    } else if usage * 100 >= limit * warning_pct {
        QuotaState::Warning
    } else {
        QuotaState::Normal
    }
}

/// Soft-threshold notice. Not an error: it rides alongside a successful
/// result in the response envelope.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct QuotaWarning {
    pub counter: CounterKind,
    pub usage: i64,
    pub limit: i64,
}

/// One counter's line in a tenant usage report.
#[derive(Debug, Clone, Serialize)]
pub struct CounterUsage {
    pub counter: CounterKind,
    pub usage: i64,
    pub limit: i64,
    pub state: QuotaState,
}

/// Enforces per-tenant resource quotas against the counter store.
///
/// Pre-checks reserve nothing: `check_and_reserve` only reads, and callers
/// record the increment after the storage mutation succeeds. The API-call
/// counter is the exception, incremented unconditionally per request. Its
/// window resets lazily on first access after the window elapses; there is
/// no background timer.
#[derive(Clone)]
pub struct QuotaTracker {
    counters: Arc<dyn CounterStore>,
    warning_pct: i64,
    window: Duration,
}

impl QuotaTracker {
    pub fn new(counters: Arc<dyn CounterStore>, warning_pct: i64, window_secs: i64) -> Self {
        Self {
            counters,
            warning_pct,
            window: Duration::seconds(window_secs),
        }
    }

    /// Current usage for one counter, rolling the API-call window over if
    /// it has elapsed.
    pub async fn usage(&self, tenant_id: Uuid, kind: CounterKind) -> Result<i64, TenancyError> {
        let counters = self.counters.get_counters(tenant_id).await?;
        let usage = match kind {
            CounterKind::Users => counters.users,
            CounterKind::Customers => counters.customers,
            CounterKind::ApiCalls => {
                let now = Utc::now();
                if now - counters.api_window_started_at >= self.window {
                    self.counters
                        .reset_window(tenant_id, CounterKind::ApiCalls, now)
                        .await?;
                    0
                } else {
                    counters.api_calls
                }
            }
        };
        Ok(usage)
    }

    /// Gate a create. Blocked usage fails the operation before any write;
    /// warning-band usage lets it proceed with a notice for the caller to
    /// surface.
    pub async fn check_and_reserve(
        &self,
        tenant: &TenantRef,
        kind: CounterKind,
    ) -> Result<Option<QuotaWarning>, TenancyError> {
        let usage = self.usage(tenant.id, kind).await?;
        let limit = tenant.policy.limit(kind);

        match quota_state(usage, limit, self.warning_pct) {
            QuotaState::Blocked => Err(TenancyError::QuotaExceeded {
                counter: kind,
                usage,
                limit,
            }),
            QuotaState::Warning => Ok(Some(QuotaWarning {
                counter: kind,
                usage,
                limit,
            })),
            QuotaState::Normal => Ok(None),
        }
    }

    /// Record a successful create.
    pub async fn record_created(
        &self,
        tenant_id: Uuid,
        kind: CounterKind,
    ) -> Result<(), TenancyError> {
        self.counters.increment(tenant_id, kind, 1).await?;
        Ok(())
    }

    /// Record a successful delete. The store clamps at zero, so a stray
    /// decrement cannot drive the counter negative.
    pub async fn record_deleted(
        &self,
        tenant_id: Uuid,
        kind: CounterKind,
    ) -> Result<(), TenancyError> {
        self.counters.increment(tenant_id, kind, -1).await?;
        Ok(())
    }

    /// Meter one authenticated tenant-scoped request. The counter moves
    /// even when the request is blocked, so sustained traffic against an
    /// exhausted window is still visible in usage.
    pub async fn count_api_call(&self, tenant: &TenantRef) -> Result<(), TenancyError> {
        let usage = self.usage(tenant.id, CounterKind::ApiCalls).await?;
        self.counters
            .increment(tenant.id, CounterKind::ApiCalls, 1)
            .await?;

        let limit = tenant.policy.limit(CounterKind::ApiCalls);
        if usage >= limit {
            return Err(TenancyError::QuotaExceeded {
                counter: CounterKind::ApiCalls,
                usage,
                limit,
            });
        }
        Ok(())
    }

    /// Full usage snapshot for one tenant, one line per counter.
    pub async fn usage_report(
        &self,
        tenant: &TenantRef,
    ) -> Result<Vec<CounterUsage>, TenancyError> {
        let mut report = Vec::with_capacity(3);
        for kind in [
            CounterKind::Users,
            CounterKind::Customers,
            CounterKind::ApiCalls,
        ] {
            let usage = self.usage(tenant.id, kind).await?;
            let limit = tenant.policy.limit(kind);
            report.push(CounterUsage {
                counter: kind,
                usage,
                limit,
                state: quota_state(usage, limit, self.warning_pct),
            });
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryStore;

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
    async fn create_blocked_at_limit() {
        let store = Arc::new(MemoryStore::new());
        let tenant = tenant_with(PlanTier::Free.policy());
        for _ in 0..3 {
            store
                .increment(tenant.id, CounterKind::Users, 1)
                .await
                .unwrap();
        }

        let err = tracker(store)
            .check_and_reserve(&tenant, CounterKind::Users)
            .await
            .unwrap_err();
        match err {
            TenancyError::QuotaExceeded {
                counter,
                usage,
                limit,
            } => {
                assert_eq!(counter, CounterKind::Users);
                assert_eq!(usage, 3);
                assert_eq!(limit, 3);
            }
            other => panic!("expected quota error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn warning_band_starts_at_eighty_percent() {
        let store = Arc::new(MemoryStore::new());
        let tenant = tenant_with(PlanTier::Free.policy());
        store
            .increment(tenant.id, CounterKind::Customers, 79)
            .await
            .unwrap();

        let tracker = tracker(store.clone());
        let none = tracker
            .check_and_reserve(&tenant, CounterKind::Customers)
            .await
            .unwrap();
        assert!(none.is_none());

        store
            .increment(tenant.id, CounterKind::Customers, 1)
            .await
            .unwrap();
        let warning = tracker
            .check_and_reserve(&tenant, CounterKind::Customers)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            warning,
            QuotaWarning {
                counter: CounterKind::Customers,
                usage: 80,
                limit: 100,
            }
        );
    }

    #[tokio::test]
    async fn delete_at_zero_stays_at_zero() {
        let store = Arc::new(MemoryStore::new());
        let tenant = tenant_with(PlanTier::Free.policy());
        let tracker = tracker(store.clone());

        tracker
            .record_deleted(tenant.id, CounterKind::Customers)
            .await
            .unwrap();
        assert_eq!(
            tracker.usage(tenant.id, CounterKind::Customers).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn api_calls_count_even_when_blocked() {
        let store = Arc::new(MemoryStore::new());
        let tenant = tenant_with(QuotaPolicy {
            max_users: 3,
            max_customers: 100,
            max_api_calls: 2,
        });
        let tracker = tracker(store.clone());

        tracker.count_api_call(&tenant).await.unwrap();
        tracker.count_api_call(&tenant).await.unwrap();
        let err = tracker.count_api_call(&tenant).await.unwrap_err();
        assert!(matches!(err, TenancyError::QuotaExceeded { .. }));

        // Blocked requests still move the counter.
        let counters = store.get_counters(tenant.id).await.unwrap();
        assert_eq!(counters.api_calls, 3);
    }

    #[tokio::test]
    async fn elapsed_window_resets_lazily() {
        let store = Arc::new(MemoryStore::new());
        let tenant = tenant_with(QuotaPolicy {
            max_users: 3,
            max_customers: 100,
            max_api_calls: 2,
        });
        let tracker = tracker(store.clone());

        tracker.count_api_call(&tenant).await.unwrap();
        tracker.count_api_call(&tenant).await.unwrap();
        assert!(tracker.count_api_call(&tenant).await.is_err());

        store.set_window_start(tenant.id, Utc::now() - Duration::days(2));

        assert_eq!(
            tracker.usage(tenant.id, CounterKind::ApiCalls).await.unwrap(),
            0
        );
        tracker.count_api_call(&tenant).await.unwrap();
    }

    #[tokio::test]
    async fn usage_report_covers_every_counter() {
        let store = Arc::new(MemoryStore::new());
        let tenant = tenant_with(PlanTier::Free.policy());
        store
            .increment(tenant.id, CounterKind::Users, 3)
            .await
            .unwrap();
        store
            .increment(tenant.id, CounterKind::Customers, 85)
            .await
            .unwrap();

        let report = tracker(store).usage_report(&tenant).await.unwrap();
        assert_eq!(report.len(), 3);
        assert!(matches!(report[0].state, QuotaState::Blocked));
        assert!(matches!(report[1].state, QuotaState::Warning));
        assert!(matches!(report[2].state, QuotaState::Normal));
    }
}
