//! Task Service
//!
//! Task CRUD with soft delete. The search index follows every write through
//! the store triggers installed by `SearchIndexSynchronizer`.

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use taskdeck_core::{Actor, AuditAction, EntityType, Role};

use crate::models::project::require_id;
use crate::models::task::{
    CreateTaskInput, SearchTasksInput, Task, TaskSearchHit, UpdateTaskInput,
};
use crate::services::access_guard::AccessGuard;
use crate::services::audit::AuditTrail;
use crate::services::search_index::SearchIndexSynchronizer;
use crate::services::task_status::load_statuses;
use crate::storage::unit_of_work::UnitOfWork;
use crate::utils::error::{AppError, AppResult};

/// Hard cap on search results
pub const MAX_SEARCH_LIMIT: u32 = 500;

pub(crate) const TASK_COLUMNS: &str =
    "id, project_id, status, title, description, created_at, updated_at, deleted_at";

pub(crate) fn row_to_task(row: &rusqlite::Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        project_id: row.get(1)?,
        status: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
        deleted_at: row.get(7)?,
    })
}

fn load_task(conn: &Connection, task_id: &str) -> AppResult<Option<Task>> {
    let task = conn
        .query_row(
            &format!("SELECT {} FROM task WHERE id = ?1", TASK_COLUMNS),
            [task_id],
            row_to_task,
        )
        .optional()?;
    Ok(task)
}

fn status_exists(conn: &Connection, project_id: &str, key: &str) -> AppResult<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM task_status WHERE project_id = ?1 AND key = ?2)",
        params![project_id, key],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Service for tasks on a project board
#[derive(Debug, Clone)]
pub struct TaskService {
    uow: UnitOfWork,
    audit: AuditTrail,
    default_search_limit: u32,
}

impl TaskService {
    pub fn new(uow: UnitOfWork, audit: AuditTrail, default_search_limit: u32) -> Self {
        Self {
            uow,
            audit,
            default_search_limit,
        }
    }

    fn guard(&self) -> AccessGuard {
        AccessGuard::new(self.uow.database().clone())
    }

    /// Load a task or fail with `NotFound`
    fn find(&self, task_id: &str) -> AppResult<Task> {
        let conn = self.uow.database().get_connection()?;
        load_task(&conn, task_id)?.ok_or_else(|| AppError::not_found(format!("Task {}", task_id)))
    }

    /// Create a task. Without an explicit status it lands in the first
    /// column of the board.
    pub fn create_task(&self, actor: &Actor, input: &CreateTaskInput) -> AppResult<Task> {
        let input = input.validate()?;
        self.guard().authorize(actor, &input.project_id, Role::Edit)?;

        let task = self.uow.run(|tx| {
            let status = match &input.status {
                Some(key) => {
                    if !status_exists(tx, &input.project_id, key)? {
                        return Err(AppError::validation(format!(
                            "Unknown status '{}' for project {}",
                            key, input.project_id
                        )));
                    }
                    key.clone()
                }
                None => load_statuses(tx, &input.project_id)?
                    .into_iter()
                    .next()
                    .map(|s| s.key)
                    .ok_or_else(|| AppError::validation("Project has no statuses"))?,
            };

            let now = chrono::Utc::now().to_rfc3339();
            let task = Task {
                id: uuid::Uuid::new_v4().to_string(),
                project_id: input.project_id.clone(),
                status,
                title: input.title.clone(),
                description: input.description.clone(),
                created_at: now.clone(),
                updated_at: now,
                deleted_at: None,
            };
            tx.execute(
                "INSERT INTO task (id, project_id, status, title, description, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    task.id,
                    task.project_id,
                    task.status,
                    task.title,
                    task.description,
                    task.created_at,
                    task.updated_at
                ],
            )?;
            Ok(task)
        })?;

        tracing::debug!("[Task] {} created {} in '{}'", actor.user_id, task.id, task.status);
        self.audit.record(
            &actor.user_id,
            EntityType::Task,
            &task.id,
            AuditAction::Created,
            json!({ "project_id": task.project_id, "status": task.status, "title": task.title }),
        );
        Ok(task)
    }

    /// Apply a partial update to a live task
    pub fn update_task(&self, actor: &Actor, input: &UpdateTaskInput) -> AppResult<Task> {
        let input = input.validate()?;
        let current = self.find(&input.task_id)?;
        self.guard().authorize_entity(
            actor,
            &current.project_id,
            Role::Edit,
            &format!("Task {}", current.id),
        )?;

        let task = self.uow.run(|tx| {
            let current = load_task(tx, &input.task_id)?
                .filter(|t| t.deleted_at.is_none())
                .ok_or_else(|| AppError::not_found(format!("Task {}", input.task_id)))?;

            if let Some(key) = &input.status {
                if !status_exists(tx, &current.project_id, key)? {
                    return Err(AppError::validation(format!(
                        "Unknown status '{}' for project {}",
                        key, current.project_id
                    )));
                }
            }

            let title = input.title.clone().unwrap_or(current.title.clone());
            let description = match &input.description {
                Some(description) => description.clone(),
                None => current.description.clone(),
            };
            let status = input.status.clone().unwrap_or(current.status.clone());
            let updated = Task {
                title,
                description,
                status,
                updated_at: chrono::Utc::now().to_rfc3339(),
                ..current
            };
            tx.execute(
                "UPDATE task SET title = ?1, description = ?2, status = ?3, updated_at = ?4
                 WHERE id = ?5",
                params![
                    updated.title,
                    updated.description,
                    updated.status,
                    updated.updated_at,
                    updated.id
                ],
            )?;
            Ok(updated)
        })?;

        let mut changed = Vec::new();
        if input.title.is_some() {
            changed.push("title");
        }
        if input.description.is_some() {
            changed.push("description");
        }
        if input.status.is_some() {
            changed.push("status");
        }
        self.audit.record(
            &actor.user_id,
            EntityType::Task,
            &task.id,
            AuditAction::Updated,
            json!({ "fields": changed, "status": task.status }),
        );
        Ok(task)
    }

    /// Mark a task deleted. It leaves lists and search but keeps its status.
    pub fn soft_delete_task(&self, actor: &Actor, task_id: &str) -> AppResult<Task> {
        self.set_deleted(actor, task_id, true)
    }

    /// Bring a soft-deleted task back
    pub fn restore_task(&self, actor: &Actor, task_id: &str) -> AppResult<Task> {
        self.set_deleted(actor, task_id, false)
    }

    fn set_deleted(&self, actor: &Actor, task_id: &str, deleted: bool) -> AppResult<Task> {
        require_id("task_id", task_id)?;
        let current = self.find(task_id)?;
        self.guard().authorize_entity(
            actor,
            &current.project_id,
            Role::Edit,
            &format!("Task {}", current.id),
        )?;

        let task = self.uow.run(|tx| {
            let current = load_task(tx, task_id)?
                .ok_or_else(|| AppError::not_found(format!("Task {}", task_id)))?;
            match (deleted, current.deleted_at.is_some()) {
                (true, true) => return Err(AppError::not_found(format!("Task {}", task_id))),
                (false, false) => {
                    return Err(AppError::validation(format!("Task {} is not deleted", task_id)))
                }
                _ => {}
            }

            let now = chrono::Utc::now().to_rfc3339();
            let deleted_at = deleted.then(|| now.clone());
            tx.execute(
                "UPDATE task SET deleted_at = ?1, updated_at = ?2 WHERE id = ?3",
                params![deleted_at, now, task_id],
            )?;
            Ok(Task {
                deleted_at,
                updated_at: now,
                ..current
            })
        })?;

        let action = if deleted {
            AuditAction::Deleted
        } else {
            AuditAction::Restored
        };
        tracing::debug!("[Task] {} {} {}", actor.user_id, action.as_str(), task_id);
        self.audit.record(
            &actor.user_id,
            EntityType::Task,
            task_id,
            action,
            json!({ "project_id": task.project_id }),
        );
        Ok(task)
    }

    /// Remove a task permanently. Requires `admin`.
    pub fn purge_task(&self, actor: &Actor, task_id: &str) -> AppResult<()> {
        require_id("task_id", task_id)?;
        let current = self.find(task_id)?;
        self.guard().authorize_entity(
            actor,
            &current.project_id,
            Role::Admin,
            &format!("Task {}", current.id),
        )?;

        self.uow.run(|tx| {
            let removed = tx.execute("DELETE FROM task WHERE id = ?1", [task_id])?;
            if removed == 0 {
                return Err(AppError::not_found(format!("Task {}", task_id)));
            }
            Ok(())
        })?;

        tracing::info!("[Task] {} purged {}", actor.user_id, task_id);
        self.audit.record(
            &actor.user_id,
            EntityType::Task,
            task_id,
            AuditAction::Purged,
            json!({ "project_id": current.project_id, "title": current.title }),
        );
        Ok(())
    }

    /// A single task, soft-deleted ones included. Requires `view`.
    pub fn get_task(&self, actor: &Actor, task_id: &str) -> AppResult<Task> {
        require_id("task_id", task_id)?;
        let task = self.find(task_id)?;
        self.guard().authorize_entity(
            actor,
            &task.project_id,
            Role::View,
            &format!("Task {}", task.id),
        )?;
        Ok(task)
    }

    /// Tasks of a project in creation order
    pub fn list_tasks(
        &self,
        actor: &Actor,
        project_id: &str,
        include_deleted: bool,
    ) -> AppResult<Vec<Task>> {
        require_id("project_id", project_id)?;
        self.uow.read(|tx| {
            AccessGuard::authorize_in(tx, actor, project_id, Role::View)?;
            let mut stmt = tx.prepare(&format!(
                "SELECT {} FROM task
                 WHERE project_id = ?1 AND (?2 OR deleted_at IS NULL)
                 ORDER BY created_at, id",
                TASK_COLUMNS
            ))?;
            let rows = stmt.query_map(params![project_id, include_deleted], row_to_task)?;
            let tasks = rows.collect::<Result<Vec<_>, _>>()?;
            Ok(tasks)
        })
    }

    /// Full-text search over live tasks of a project. Requires `view`.
    pub fn search_tasks(&self, actor: &Actor, input: &SearchTasksInput) -> AppResult<Vec<TaskSearchHit>> {
        input.validate()?;
        let limit = input
            .limit
            .unwrap_or(self.default_search_limit)
            .min(MAX_SEARCH_LIMIT);
        self.uow.read(|tx| {
            AccessGuard::authorize_in(tx, actor, &input.project_id, Role::View)?;
            SearchIndexSynchronizer::search(tx, &input.project_id, &input.query, limit)
        })
    }
}
