//! Audit Trail
//!
//! `SqliteAuditSink` appends records to the `audit_log` table on its own
//! pooled connection. `AuditTrail` is the post-commit glue used by every
//! manager: a failing sink is logged and otherwise ignored, so auditing never
//! undoes a committed business transaction.

use std::sync::Arc;

use rusqlite::params;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use taskdeck_core::{
    AuditAction, AuditRecord, AuditSink, CoreError, CoreResult, EntityType, NoopAuditSink,
};

use crate::storage::database::Database;
use crate::utils::error::AppResult;

/// Stored audit entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub actor_id: String,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub action: AuditAction,
    pub detail: Value,
    pub created_at: String,
}

/// Append-only sink backed by the `audit_log` table
#[derive(Debug, Clone)]
pub struct SqliteAuditSink {
    db: Database,
}

impl SqliteAuditSink {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// All entries for one entity, oldest first
    pub fn list_for_entity(
        &self,
        entity_type: EntityType,
        entity_id: &str,
    ) -> AppResult<Vec<AuditEntry>> {
        let conn = self.db.get_connection()?;
        let mut stmt = conn.prepare(
            "SELECT id, actor_id, entity_type, entity_id, action, detail, created_at
             FROM audit_log
             WHERE entity_type = ?1 AND entity_id = ?2
             ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![entity_type.as_str(), entity_id], Self::raw_row)?;
        let entries = rows
            .map(|row| Self::to_entry(row?))
            .collect::<AppResult<Vec<_>>>()?;
        Ok(entries)
    }

    /// Most recent entries, newest first
    pub fn recent(&self, limit: u32) -> AppResult<Vec<AuditEntry>> {
        let conn = self.db.get_connection()?;
        let mut stmt = conn.prepare(
            "SELECT id, actor_id, entity_type, entity_id, action, detail, created_at
             FROM audit_log
             ORDER BY id DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], Self::raw_row)?;
        let entries = rows
            .map(|row| Self::to_entry(row?))
            .collect::<AppResult<Vec<_>>>()?;
        Ok(entries)
    }

    /// Entries about a project and everything inside it, newest first.
    ///
    /// Child entities carry `project_id` in their detail payload.
    pub fn list_for_project(&self, project_id: &str, limit: u32) -> AppResult<Vec<AuditEntry>> {
        let conn = self.db.get_connection()?;
        let mut stmt = conn.prepare(
            "SELECT id, actor_id, entity_type, entity_id, action, detail, created_at
             FROM audit_log
             WHERE (entity_type = 'project' AND entity_id = ?1)
                OR json_extract(detail, '$.project_id') = ?1
             ORDER BY id DESC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![project_id, limit], Self::raw_row)?;
        let entries = rows
            .map(|row| Self::to_entry(row?))
            .collect::<AppResult<Vec<_>>>()?;
        Ok(entries)
    }

    fn raw_row(row: &rusqlite::Row) -> rusqlite::Result<RawAuditRow> {
        Ok(RawAuditRow {
            id: row.get(0)?,
            actor_id: row.get(1)?,
            entity_type: row.get(2)?,
            entity_id: row.get(3)?,
            action: row.get(4)?,
            detail: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    fn to_entry(raw: RawAuditRow) -> AppResult<AuditEntry> {
        Ok(AuditEntry {
            id: raw.id,
            actor_id: raw.actor_id,
            entity_type: EntityType::from_str(&raw.entity_type)?,
            entity_id: raw.entity_id,
            action: AuditAction::from_str(&raw.action)?,
            detail: serde_json::from_str(&raw.detail)?,
            created_at: raw.created_at,
        })
    }
}

struct RawAuditRow {
    id: i64,
    actor_id: String,
    entity_type: String,
    entity_id: String,
    action: String,
    detail: String,
    created_at: String,
}

impl AuditSink for SqliteAuditSink {
    fn record(&self, record: &AuditRecord) -> CoreResult<()> {
        let conn = self
            .db
            .get_connection()
            .map_err(|e| CoreError::internal(e.to_string()))?;
        let detail = serde_json::to_string(&record.detail)?;
        conn.execute(
            "INSERT INTO audit_log (actor_id, entity_type, entity_id, action, detail, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.actor_id,
                record.entity_type.as_str(),
                record.entity_id,
                record.action.as_str(),
                detail,
                record.timestamp,
            ],
        )
        .map_err(|e| CoreError::internal(format!("audit append failed: {}", e)))?;
        Ok(())
    }
}

/// Post-commit, best-effort audit notification
#[derive(Clone)]
pub struct AuditTrail {
    sink: Arc<dyn AuditSink>,
}

impl AuditTrail {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    /// Trail that records nothing
    pub fn disabled() -> Self {
        Self::new(Arc::new(NoopAuditSink))
    }

    /// Record a committed mutation. Never fails the caller.
    pub fn record(
        &self,
        actor_id: &str,
        entity_type: EntityType,
        entity_id: &str,
        action: AuditAction,
        detail: Value,
    ) {
        let record = AuditRecord::new(actor_id, entity_type, entity_id, action, detail);
        if let Err(e) = self.sink.record(&record) {
            tracing::warn!(
                "[Audit] failed to record {} {} {}: {}",
                entity_type.as_str(),
                action.as_str(),
                entity_id,
                e
            );
        }
    }
}

impl std::fmt::Debug for AuditTrail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditTrail").finish_non_exhaustive()
    }
}
