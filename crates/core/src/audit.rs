//! Audit Contracts
//!
//! Append-only trail of successful mutations. Sinks are notified after the
//! business transaction commits; a failing sink never undoes the mutation.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CoreError, CoreResult};

/// Kind of entity an audit record refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Project,
    Membership,
    TaskStatus,
    Task,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Project => "project",
            EntityType::Membership => "membership",
            EntityType::TaskStatus => "task_status",
            EntityType::Task => "task",
        }
    }

    pub fn from_str(s: &str) -> CoreResult<Self> {
        match s {
            "project" => Ok(EntityType::Project),
            "membership" => Ok(EntityType::Membership),
            "task_status" => Ok(EntityType::TaskStatus),
            "task" => Ok(EntityType::Task),
            _ => Err(CoreError::validation(format!("Invalid entity type: {}", s))),
        }
    }
}

/// Mutation recorded in the trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Created,
    Updated,
    Reordered,
    Deleted,
    Restored,
    Purged,
    Upserted,
    Removed,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Created => "created",
            AuditAction::Updated => "updated",
            AuditAction::Reordered => "reordered",
            AuditAction::Deleted => "deleted",
            AuditAction::Restored => "restored",
            AuditAction::Purged => "purged",
            AuditAction::Upserted => "upserted",
            AuditAction::Removed => "removed",
        }
    }

    pub fn from_str(s: &str) -> CoreResult<Self> {
        match s {
            "created" => Ok(AuditAction::Created),
            "updated" => Ok(AuditAction::Updated),
            "reordered" => Ok(AuditAction::Reordered),
            "deleted" => Ok(AuditAction::Deleted),
            "restored" => Ok(AuditAction::Restored),
            "purged" => Ok(AuditAction::Purged),
            "upserted" => Ok(AuditAction::Upserted),
            "removed" => Ok(AuditAction::Removed),
            _ => Err(CoreError::validation(format!("Invalid audit action: {}", s))),
        }
    }
}

/// One immutable audit entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub actor_id: String,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub action: AuditAction,
    pub detail: Value,
    /// RFC 3339 timestamp
    pub timestamp: String,
}

impl AuditRecord {
    /// Build a record stamped with the current time
    pub fn new(
        actor_id: impl Into<String>,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        action: AuditAction,
        detail: Value,
    ) -> Self {
        Self {
            actor_id: actor_id.into(),
            entity_type,
            entity_id: entity_id.into(),
            action,
            detail,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Destination for audit records.
pub trait AuditSink: Send + Sync {
    fn record(&self, record: &AuditRecord) -> CoreResult<()>;
}

/// Sink that discards everything (audit disabled)
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _record: &AuditRecord) -> CoreResult<()> {
        Ok(())
    }
}

/// Sink that keeps records in memory; used by tests.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
    fail: bool,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every `record` call fails
    pub fn failing() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, record: &AuditRecord) -> CoreResult<()> {
        if self.fail {
            return Err(CoreError::internal("audit sink unavailable"));
        }
        self.records
            .lock()
            .map_err(|_| CoreError::internal("audit sink lock poisoned"))?
            .push(record.clone());
        Ok(())
    }
}
