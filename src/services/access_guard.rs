//! Access Guard
//!
//! Resolves whether an actor may operate on a project at a required role
//! level. Callers receive the resolved project and effective role and never
//! re-derive role logic themselves.

use rusqlite::Connection;
use taskdeck_core::{Actor, Role};

use crate::models::project::Project;
use crate::services::membership::load_role;
use crate::services::project::load_project;
use crate::storage::database::Database;
use crate::utils::error::{AppError, AppResult};

/// Outcome of a successful authorization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorization {
    pub project: Project,
    pub effective_role: Role,
}

/// Project-scoped role check. Pure read.
#[derive(Debug, Clone)]
pub struct AccessGuard {
    db: Database,
}

impl AccessGuard {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Authorize on a freshly checked-out connection
    pub fn authorize(
        &self,
        actor: &Actor,
        project_id: &str,
        minimum: Role,
    ) -> AppResult<Authorization> {
        let conn = self.db.get_connection()?;
        Self::authorize_in(&conn, actor, project_id, minimum)
    }

    /// Authorize access to an entity addressed by its own id. Actors with no
    /// membership in the owning project get the same `NotFound` as for an
    /// id that does not exist.
    pub fn authorize_entity(
        &self,
        actor: &Actor,
        project_id: &str,
        minimum: Role,
        entity: &str,
    ) -> AppResult<Authorization> {
        let conn = self.db.get_connection()?;
        if !actor.is_system_admin() && load_role(&conn, project_id, &actor.user_id)?.is_none() {
            tracing::debug!(
                "[AccessGuard] hiding {} from non-member {}",
                entity,
                actor.user_id
            );
            return Err(AppError::not_found(entity.to_string()));
        }
        Self::authorize_in(&conn, actor, project_id, minimum)
    }

    /// Authorize on the caller's connection or open transaction, so the check
    /// runs inside an existing unit of work without a second connection.
    pub fn authorize_in(
        conn: &Connection,
        actor: &Actor,
        project_id: &str,
        minimum: Role,
    ) -> AppResult<Authorization> {
        let project = load_project(conn, project_id)?
            .ok_or_else(|| AppError::not_found(format!("Project {}", project_id)))?;

        if actor.is_system_admin() {
            return Ok(Authorization {
                project,
                effective_role: Role::Admin,
            });
        }

        let role = match load_role(conn, project_id, &actor.user_id)? {
            Some(role) => role,
            None => {
                tracing::debug!(
                    "[AccessGuard] {} is not a member of {}",
                    actor.user_id,
                    project.key
                );
                return Err(AppError::permission_denied(format!(
                    "Not a member of project {}",
                    project.key
                )));
            }
        };

        if !role.satisfies(minimum) {
            tracing::debug!(
                "[AccessGuard] {} has {} on {}, needs {}",
                actor.user_id,
                role,
                project.key,
                minimum
            );
            return Err(AppError::permission_denied(format!(
                "Requires {} role on project {}",
                minimum, project.key
            )));
        }

        Ok(Authorization {
            project,
            effective_role: role,
        })
    }
}
