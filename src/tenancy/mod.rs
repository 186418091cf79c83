pub mod audit;
pub mod context;
pub mod error;
pub mod ownership;
pub mod quota;
pub mod references;
pub mod sanitize;
pub mod store;

pub use audit::AuditEvent;
pub use context::{Principal, RequestContext, Role};
pub use error::TenancyError;
pub use ownership::{EntityKind, OwnershipValidator};
pub use quota::{CounterKind, PlanTier, QuotaPolicy, QuotaTracker, QuotaWarning};
pub use references::{Reference, ReferenceGraphValidator, ReferencedEntities};
pub use sanitize::sanitize_payload;
pub use store::{CounterStore, Counters, EntityRef, EntityStore, StoreError, TenantRef};
