//! Task Status Lifecycle
//!
//! Create, relabel, reorder and delete the board columns of a project.
//!
//! Every mutation follows the same pipeline: validate the input, authorize
//! against the owning project, run the change in one unit of work, then
//! record an audit entry once the transaction has committed.
//!
//! Positions are dense (`1..=n`) after every committed operation. The
//! `(project_id, position)` pair is unique in the store, so positions are
//! rewritten in two phases: first every position of the project is negated,
//! then each status receives its final value.

use std::collections::HashSet;
use std::sync::Arc;

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use taskdeck_core::{Actor, AuditAction, EntityType, Role};

use crate::models::task_status::{
    CreateStatusInput, DeleteStatusInput, DeleteStatusOutcome, ReorderStatusesInput, TaskStatus,
    UpdateStatusInput,
};
use crate::services::access_guard::AccessGuard;
use crate::services::audit::AuditTrail;
use crate::services::catalog::DomainCatalog;
use crate::storage::unit_of_work::UnitOfWork;
use crate::utils::error::{AppError, AppResult};
use crate::utils::slug::{slugify, truncate_slug, DERIVED_BASE_LEN, EMPTY_SLUG_BASE};

const STATUS_COLUMNS: &str = "id, project_id, key, label, position";

fn row_to_status(row: &rusqlite::Row) -> rusqlite::Result<TaskStatus> {
    Ok(TaskStatus {
        id: row.get(0)?,
        project_id: row.get(1)?,
        key: row.get(2)?,
        label: row.get(3)?,
        position: row.get(4)?,
    })
}

/// All statuses of a project ordered by position
pub(crate) fn load_statuses(conn: &Connection, project_id: &str) -> AppResult<Vec<TaskStatus>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM task_status WHERE project_id = ?1 ORDER BY position",
        STATUS_COLUMNS
    ))?;
    let rows = stmt.query_map([project_id], row_to_status)?;
    let statuses = rows.collect::<Result<Vec<_>, _>>()?;
    Ok(statuses)
}

pub(crate) fn load_status(conn: &Connection, status_id: &str) -> AppResult<Option<TaskStatus>> {
    let status = conn
        .query_row(
            &format!("SELECT {} FROM task_status WHERE id = ?1", STATUS_COLUMNS),
            [status_id],
            row_to_status,
        )
        .optional()?;
    Ok(status)
}

/// Pick the key for a new status.
///
/// A requested key is kept when no status of the project uses it. Otherwise
/// a key is derived from the label and suffixed with `_1`, `_2`, ... until it
/// is neither taken nor reserved by the catalog.
pub fn resolve_status_key(
    catalog: &DomainCatalog,
    taken: &HashSet<String>,
    label: &str,
    requested: Option<&str>,
) -> String {
    if let Some(key) = requested {
        if !taken.contains(key) {
            return key.to_string();
        }
    }

    let mut base = truncate_slug(&slugify(label), DERIVED_BASE_LEN);
    if base.is_empty() {
        base = EMPTY_SLUG_BASE.to_string();
    }

    let is_free = |candidate: &str| !taken.contains(candidate) && !catalog.is_reserved(candidate);
    if is_free(&base) {
        return base;
    }

    let mut suffix = 1u32;
    loop {
        let candidate = format!("{}_{}", base, suffix);
        if is_free(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

/// Assign positions `1..=n` following `ordered_ids`.
///
/// `ordered_ids` must name every status of the project exactly once.
fn rewrite_positions(conn: &Connection, project_id: &str, ordered_ids: &[String]) -> AppResult<()> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "UPDATE task_status SET position = -position WHERE project_id = ?1",
        [project_id],
    )?;
    let mut stmt = conn.prepare(
        "UPDATE task_status SET position = ?1, updated_at = ?2
         WHERE id = ?3 AND project_id = ?4",
    )?;
    for (index, id) in ordered_ids.iter().enumerate() {
        stmt.execute(params![index as i64 + 1, now, id, project_id])?;
    }
    Ok(())
}

/// Manager for the lifecycle of a project's statuses
#[derive(Debug, Clone)]
pub struct TaskStatusLifecycleManager {
    uow: UnitOfWork,
    audit: AuditTrail,
    catalog: Arc<DomainCatalog>,
}

impl TaskStatusLifecycleManager {
    pub fn new(uow: UnitOfWork, audit: AuditTrail, catalog: Arc<DomainCatalog>) -> Self {
        Self {
            uow,
            audit,
            catalog,
        }
    }

    fn guard(&self) -> AccessGuard {
        AccessGuard::new(self.uow.database().clone())
    }

    /// Statuses of a project ordered by position. Requires `view`.
    pub fn list(&self, actor: &Actor, project_id: &str) -> AppResult<Vec<TaskStatus>> {
        crate::models::project::require_id("project_id", project_id)?;
        self.uow.read(|tx| {
            AccessGuard::authorize_in(tx, actor, project_id, Role::View)?;
            load_statuses(tx, project_id)
        })
    }

    /// Append a new status at the end of the board. Requires `edit`.
    pub fn create(&self, actor: &Actor, input: &CreateStatusInput) -> AppResult<TaskStatus> {
        let label = input.validate()?;
        let auth = self.guard().authorize(actor, &input.project_id, Role::Edit)?;

        let status = self.uow.run(|tx| {
            let existing = load_statuses(tx, &input.project_id)?;
            let taken: HashSet<String> = existing.iter().map(|s| s.key.clone()).collect();
            let key = resolve_status_key(&self.catalog, &taken, &label, input.key.as_deref());
            let position = existing.iter().map(|s| s.position).max().unwrap_or(0) + 1;

            let now = chrono::Utc::now().to_rfc3339();
            let status = TaskStatus {
                id: uuid::Uuid::new_v4().to_string(),
                project_id: input.project_id.clone(),
                key,
                label,
                position,
            };
            tx.execute(
                "INSERT INTO task_status (id, project_id, key, label, position, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                params![
                    status.id,
                    status.project_id,
                    status.key,
                    status.label,
                    status.position,
                    now
                ],
            )?;
            Ok(status)
        })?;

        tracing::info!(
            "[TaskStatus] {} created '{}' on {} at position {}",
            actor.user_id,
            status.key,
            auth.project.key,
            status.position
        );
        self.audit.record(
            &actor.user_id,
            EntityType::TaskStatus,
            &status.id,
            AuditAction::Created,
            json!({
                "project_id": status.project_id,
                "key": status.key,
                "label": status.label,
                "position": status.position,
            }),
        );
        Ok(status)
    }

    /// Change the label of a status. Key and position are untouched.
    pub fn relabel(&self, actor: &Actor, input: &UpdateStatusInput) -> AppResult<TaskStatus> {
        let label = input.validate()?;
        let target = self.find_status(&input.status_id)?;
        self.guard().authorize_entity(
            actor,
            &target.project_id,
            Role::Edit,
            &format!("Status {}", input.status_id),
        )?;

        let (previous, updated) = self.uow.run(|tx| {
            let previous = load_status(tx, &input.status_id)?
                .ok_or_else(|| AppError::not_found(format!("Status {}", input.status_id)))?;
            tx.execute(
                "UPDATE task_status SET label = ?1, updated_at = ?2 WHERE id = ?3",
                params![label, chrono::Utc::now().to_rfc3339(), input.status_id],
            )?;
            let updated = TaskStatus {
                label: label.clone(),
                ..previous.clone()
            };
            Ok((previous, updated))
        })?;

        tracing::info!(
            "[TaskStatus] {} relabeled '{}' to '{}'",
            actor.user_id,
            updated.key,
            updated.label
        );
        self.audit.record(
            &actor.user_id,
            EntityType::TaskStatus,
            &updated.id,
            AuditAction::Updated,
            json!({ "label": updated.label, "previous_label": previous.label }),
        );
        Ok(updated)
    }

    /// Rewrite the board order. `ordered_status_ids` must be a permutation of
    /// the project's statuses. Returns the statuses in their new order.
    pub fn reorder(&self, actor: &Actor, input: &ReorderStatusesInput) -> AppResult<Vec<TaskStatus>> {
        input.validate()?;
        let auth = self.guard().authorize(actor, &input.project_id, Role::Edit)?;

        let statuses = self.uow.run(|tx| {
            let existing = load_statuses(tx, &input.project_id)?;
            if existing.len() != input.ordered_status_ids.len() {
                return Err(AppError::validation(format!(
                    "Expected {} status ids, got {}",
                    existing.len(),
                    input.ordered_status_ids.len()
                )));
            }
            let known: HashSet<&str> = existing.iter().map(|s| s.id.as_str()).collect();
            if let Some(unknown) = input
                .ordered_status_ids
                .iter()
                .find(|id| !known.contains(id.as_str()))
            {
                return Err(AppError::validation(format!(
                    "Status {} does not belong to project {}",
                    unknown, input.project_id
                )));
            }

            rewrite_positions(tx, &input.project_id, &input.ordered_status_ids)?;
            load_statuses(tx, &input.project_id)
        })?;

        let order: Vec<&str> = statuses.iter().map(|s| s.key.as_str()).collect();
        tracing::info!(
            "[TaskStatus] {} reordered {}: {:?}",
            actor.user_id,
            auth.project.key,
            order
        );
        self.audit.record(
            &actor.user_id,
            EntityType::Project,
            &input.project_id,
            AuditAction::Reordered,
            json!({ "order": order }),
        );
        Ok(statuses)
    }

    /// Delete a status, moving all of its tasks (soft-deleted ones included)
    /// to the fallback status of the same project. Remaining positions are
    /// compacted back to `1..=n`.
    pub fn delete(&self, actor: &Actor, input: &DeleteStatusInput) -> AppResult<DeleteStatusOutcome> {
        input.validate()?;
        let target = self.find_status(&input.status_id)?;
        let auth = self.guard().authorize_entity(
            actor,
            &target.project_id,
            Role::Edit,
            &format!("Status {}", input.status_id),
        )?;

        let (target, fallback, reassigned) = self.uow.run(|tx| {
            let target = load_status(tx, &input.status_id)?
                .ok_or_else(|| AppError::not_found(format!("Status {}", input.status_id)))?;
            let fallback = load_status(tx, &input.fallback_status_id)?
                .filter(|f| f.project_id == target.project_id)
                .ok_or_else(|| {
                    AppError::validation(format!(
                        "Fallback status {} does not exist in the same project",
                        input.fallback_status_id
                    ))
                })?;

            let statuses = load_statuses(tx, &target.project_id)?;
            if statuses.len() <= 1 {
                return Err(AppError::validation(
                    "A project must keep at least one status",
                ));
            }

            let reassigned = tx.execute(
                "UPDATE task SET status = ?1, updated_at = ?2
                 WHERE project_id = ?3 AND status = ?4",
                params![
                    fallback.key,
                    chrono::Utc::now().to_rfc3339(),
                    target.project_id,
                    target.key
                ],
            )?;
            tx.execute("DELETE FROM task_status WHERE id = ?1", [&target.id])?;

            let remaining: Vec<String> = statuses
                .into_iter()
                .filter(|s| s.id != target.id)
                .map(|s| s.id)
                .collect();
            rewrite_positions(tx, &target.project_id, &remaining)?;
            Ok((target, fallback, reassigned))
        })?;

        tracing::info!(
            "[TaskStatus] {} deleted '{}' on {}, moved {} task(s) to '{}'",
            actor.user_id,
            target.key,
            auth.project.key,
            reassigned,
            fallback.key
        );
        self.audit.record(
            &actor.user_id,
            EntityType::TaskStatus,
            &target.id,
            AuditAction::Deleted,
            json!({
                "project_id": target.project_id,
                "key": target.key,
                "fallback_key": fallback.key,
                "reassigned_tasks": reassigned,
            }),
        );
        Ok(DeleteStatusOutcome {
            deleted_status_id: target.id,
            fallback_status_id: fallback.id,
            reassigned_tasks: reassigned,
        })
    }

    fn find_status(&self, status_id: &str) -> AppResult<TaskStatus> {
        let conn = self.uow.database().get_connection()?;
        load_status(&conn, status_id)?
            .ok_or_else(|| AppError::not_found(format!("Status {}", status_id)))
    }
}
