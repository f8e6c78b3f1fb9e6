//! Taskdeck Core
//!
//! Foundational types and contracts for the Taskdeck Desktop workspace. This
//! crate has zero dependencies on application-level code (database, pooling,
//! configuration, etc.).
//!
//! ## Module Organization
//!
//! - `error` - Error taxonomy (`CoreError`, `CoreResult`, `ErrorCode`)
//! - `role` - Project membership roles and their weights
//! - `actor` - Authenticated actors and the `AuthGuard` capability
//! - `audit` - Audit records and the `AuditSink` contract

pub mod actor;
pub mod audit;
pub mod error;
pub mod role;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult, ErrorCode};

// ── Roles & Actors ─────────────────────────────────────────────────────
pub use actor::{Actor, AuthGuard, StaticTokenGuard, SystemRole};
pub use role::Role;

// ── Audit ──────────────────────────────────────────────────────────────
pub use audit::{AuditAction, AuditRecord, AuditSink, EntityType, MemoryAuditSink, NoopAuditSink};
