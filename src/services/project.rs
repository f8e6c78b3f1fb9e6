//! Project Service
//!
//! Creates project boards and lists the ones an actor can see. A new project
//! is seeded with the catalog's default statuses and its creator as admin.

use std::sync::Arc;

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use taskdeck_core::{Actor, AuditAction, EntityType, Role};

use crate::models::project::{CreateProjectInput, Project};
use crate::services::access_guard::AccessGuard;
use crate::services::audit::AuditTrail;
use crate::services::catalog::DomainCatalog;
use crate::storage::unit_of_work::UnitOfWork;
use crate::utils::error::{AppError, AppResult};

/// Load a project by id
pub(crate) fn load_project(conn: &Connection, project_id: &str) -> AppResult<Option<Project>> {
    let project = conn
        .query_row(
            "SELECT id, key, name, created_at FROM project WHERE id = ?1",
            [project_id],
            row_to_project,
        )
        .optional()?;
    Ok(project)
}

fn row_to_project(row: &rusqlite::Row) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        key: row.get(1)?,
        name: row.get(2)?,
        created_at: row.get(3)?,
    })
}

/// Service for project boards
#[derive(Debug, Clone)]
pub struct ProjectService {
    uow: UnitOfWork,
    audit: AuditTrail,
    catalog: Arc<DomainCatalog>,
}

impl ProjectService {
    pub fn new(uow: UnitOfWork, audit: AuditTrail, catalog: Arc<DomainCatalog>) -> Self {
        Self {
            uow,
            audit,
            catalog,
        }
    }

    /// Create a project with the default board and the creator as admin.
    ///
    /// Only system administrators may create projects. A duplicate key is a
    /// `Conflict`.
    pub fn create_project(&self, actor: &Actor, input: &CreateProjectInput) -> AppResult<Project> {
        let input = input.validate()?;
        if !actor.is_system_admin() {
            return Err(AppError::permission_denied(
                "Only administrators can create projects",
            ));
        }

        let now = chrono::Utc::now().to_rfc3339();
        let project = Project {
            id: uuid::Uuid::new_v4().to_string(),
            key: input.key,
            name: input.name,
            created_at: now.clone(),
        };

        self.uow.run(|tx| {
            let taken: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM project WHERE key = ?1)",
                [&project.key],
                |row| row.get(0),
            )?;
            if taken {
                return Err(AppError::conflict(format!(
                    "Project key {} is already in use",
                    project.key
                )));
            }

            tx.execute(
                "INSERT INTO project (id, key, name, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![project.id, project.key, project.name, project.created_at],
            )?;

            for (index, status) in self.catalog.default_statuses().iter().enumerate() {
                tx.execute(
                    "INSERT INTO task_status (id, project_id, key, label, position, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                    params![
                        uuid::Uuid::new_v4().to_string(),
                        project.id,
                        status.key,
                        status.label,
                        index as i64 + 1,
                        now,
                    ],
                )?;
            }

            tx.execute(
                "INSERT INTO membership (project_id, user_id, role, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![project.id, actor.user_id, Role::Admin.as_str(), now],
            )?;
            Ok(())
        })?;

        tracing::info!(
            "[Project] {} created {} with {} default statuses",
            actor.user_id,
            project.key,
            self.catalog.default_statuses().len()
        );
        self.audit.record(
            &actor.user_id,
            EntityType::Project,
            &project.id,
            AuditAction::Created,
            json!({ "key": project.key, "name": project.name }),
        );
        Ok(project)
    }

    pub fn get_project(&self, actor: &Actor, project_id: &str) -> AppResult<Project> {
        let auth = AccessGuard::new(self.uow.database().clone()).authorize(
            actor,
            project_id,
            Role::View,
        )?;
        Ok(auth.project)
    }

    /// Projects the actor is a member of (all of them for system admins),
    /// ordered by key
    pub fn list_projects(&self, actor: &Actor) -> AppResult<Vec<Project>> {
        let conn = self.uow.database().get_connection()?;
        let projects = if actor.is_system_admin() {
            let mut stmt =
                conn.prepare("SELECT id, key, name, created_at FROM project ORDER BY key")?;
            let rows = stmt.query_map([], row_to_project)?;
            rows.collect::<Result<Vec<_>, _>>()?
        } else {
            let mut stmt = conn.prepare(
                "SELECT p.id, p.key, p.name, p.created_at
                 FROM project p
                 JOIN membership m ON m.project_id = p.id
                 WHERE m.user_id = ?1
                 ORDER BY p.key",
            )?;
            let rows = stmt.query_map([&actor.user_id], row_to_project)?;
            rows.collect::<Result<Vec<_>, _>>()?
        };
        Ok(projects)
    }
}
