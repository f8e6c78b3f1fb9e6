//! Services
//!
//! Business logic services for the application.
//! Services are synchronous, own no connections of their own and are called
//! by commands from blocking worker threads.

pub mod access_guard;
pub mod audit;
pub mod catalog;
pub mod membership;
pub mod project;
pub mod search_index;
pub mod task;
pub mod task_status;

pub use access_guard::{AccessGuard, Authorization};
pub use audit::{AuditEntry, AuditTrail, SqliteAuditSink};
pub use catalog::DomainCatalog;
pub use membership::MembershipService;
pub use project::ProjectService;
pub use search_index::{IndexReport, SearchIndexSynchronizer};
pub use task::TaskService;
pub use task_status::{resolve_status_key, TaskStatusLifecycleManager};
