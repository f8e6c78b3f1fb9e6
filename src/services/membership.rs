//! Membership Service
//!
//! Project-scoped roles. Every project keeps at least one admin member.

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use taskdeck_core::{Actor, AuditAction, EntityType, Role};

use crate::models::project::{require_id, validate_user_id, Membership, UpsertMemberInput};
use crate::services::access_guard::AccessGuard;
use crate::services::audit::AuditTrail;
use crate::storage::unit_of_work::UnitOfWork;
use crate::utils::error::{AppError, AppResult};

/// Role of `user_id` in a project, if they are a member
pub(crate) fn load_role(
    conn: &Connection,
    project_id: &str,
    user_id: &str,
) -> AppResult<Option<Role>> {
    let role: Option<String> = conn
        .query_row(
            "SELECT role FROM membership WHERE project_id = ?1 AND user_id = ?2",
            params![project_id, user_id],
            |row| row.get(0),
        )
        .optional()?;
    match role {
        Some(role) => Ok(Some(Role::from_str(&role)?)),
        None => Ok(None),
    }
}

fn load_membership(
    conn: &Connection,
    project_id: &str,
    user_id: &str,
) -> AppResult<Option<Membership>> {
    let raw = conn
        .query_row(
            "SELECT project_id, user_id, role, created_at, updated_at
             FROM membership WHERE project_id = ?1 AND user_id = ?2",
            params![project_id, user_id],
            raw_membership,
        )
        .optional()?;
    raw.map(RawMembership::into_membership).transpose()
}

fn count_admins(conn: &Connection, project_id: &str) -> AppResult<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM membership WHERE project_id = ?1 AND role = 'admin'",
        [project_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

struct RawMembership {
    project_id: String,
    user_id: String,
    role: String,
    created_at: String,
    updated_at: String,
}

impl RawMembership {
    fn into_membership(self) -> AppResult<Membership> {
        Ok(Membership {
            project_id: self.project_id,
            user_id: self.user_id,
            role: Role::from_str(&self.role)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn raw_membership(row: &rusqlite::Row) -> rusqlite::Result<RawMembership> {
    Ok(RawMembership {
        project_id: row.get(0)?,
        user_id: row.get(1)?,
        role: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

/// Service for project memberships
#[derive(Debug, Clone)]
pub struct MembershipService {
    uow: UnitOfWork,
    audit: AuditTrail,
}

impl MembershipService {
    pub fn new(uow: UnitOfWork, audit: AuditTrail) -> Self {
        Self { uow, audit }
    }

    /// Add a member or change an existing member's role. Requires `admin`.
    pub fn upsert_member(&self, actor: &Actor, input: &UpsertMemberInput) -> AppResult<Membership> {
        input.validate()?;
        let guard = AccessGuard::new(self.uow.database().clone());
        let auth = guard.authorize(actor, &input.project_id, Role::Admin)?;

        let membership = self.uow.run(|tx| {
            let now = chrono::Utc::now().to_rfc3339();

            if let Some(existing) = load_membership(tx, &input.project_id, &input.user_id)? {
                if existing.role == Role::Admin
                    && input.role != Role::Admin
                    && count_admins(tx, &input.project_id)? <= 1
                {
                    return Err(AppError::validation(
                        "A project must keep at least one admin",
                    ));
                }
            }

            tx.execute(
                "INSERT INTO membership (project_id, user_id, role, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)
                 ON CONFLICT (project_id, user_id)
                 DO UPDATE SET role = excluded.role, updated_at = excluded.updated_at",
                params![input.project_id, input.user_id, input.role.as_str(), now],
            )?;

            load_membership(tx, &input.project_id, &input.user_id)?
                .ok_or_else(|| AppError::internal("membership vanished after upsert"))
        })?;

        tracing::info!(
            "[Membership] {} set {} to {} on {}",
            actor.user_id,
            membership.user_id,
            membership.role,
            auth.project.key
        );
        self.audit.record(
            &actor.user_id,
            EntityType::Membership,
            &format!("{}:{}", membership.project_id, membership.user_id),
            AuditAction::Upserted,
            json!({ "project_id": membership.project_id, "user_id": membership.user_id, "role": membership.role }),
        );
        Ok(membership)
    }

    /// Remove a member. Requires `admin`; the last admin cannot be removed.
    pub fn remove_member(&self, actor: &Actor, project_id: &str, user_id: &str) -> AppResult<()> {
        require_id("project_id", project_id)?;
        validate_user_id(user_id)?;
        let guard = AccessGuard::new(self.uow.database().clone());
        guard.authorize(actor, project_id, Role::Admin)?;

        let removed = self.uow.run(|tx| {
            let existing = load_membership(tx, project_id, user_id)?.ok_or_else(|| {
                AppError::not_found(format!("Member {} of project {}", user_id, project_id))
            })?;
            if existing.role == Role::Admin && count_admins(tx, project_id)? <= 1 {
                return Err(AppError::validation(
                    "A project must keep at least one admin",
                ));
            }
            tx.execute(
                "DELETE FROM membership WHERE project_id = ?1 AND user_id = ?2",
                params![project_id, user_id],
            )?;
            Ok(existing)
        })?;

        tracing::info!(
            "[Membership] {} removed {} from {}",
            actor.user_id,
            user_id,
            project_id
        );
        self.audit.record(
            &actor.user_id,
            EntityType::Membership,
            &format!("{}:{}", project_id, user_id),
            AuditAction::Removed,
            json!({ "project_id": project_id, "user_id": user_id, "role": removed.role }),
        );
        Ok(())
    }

    /// Members of a project ordered by user id. Requires `view`.
    pub fn list_members(&self, actor: &Actor, project_id: &str) -> AppResult<Vec<Membership>> {
        require_id("project_id", project_id)?;
        self.uow.read(|tx| {
            AccessGuard::authorize_in(tx, actor, project_id, Role::View)?;
            let mut stmt = tx.prepare(
                "SELECT project_id, user_id, role, created_at, updated_at
                 FROM membership WHERE project_id = ?1
                 ORDER BY user_id",
            )?;
            let rows = stmt.query_map([project_id], raw_membership)?;
            let members = rows
                .map(|raw| raw?.into_membership())
                .collect::<AppResult<Vec<_>>>()?;
            Ok(members)
        })
    }
}
