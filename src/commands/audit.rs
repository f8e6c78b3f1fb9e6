//! Audit Commands
//!
//! Read access to the audit trail for project administrators.

use serde::{Deserialize, Serialize};
use taskdeck_core::Role;

use crate::commands::dispatch;
use crate::models::response::CommandResponse;
use crate::services::access_guard::AccessGuard;
use crate::services::audit::AuditEntry;
use crate::state::AppState;

const DEFAULT_AUDIT_LIMIT: u32 = 100;

/// Request for reading a project's audit trail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListAuditRequest {
    pub project_id: String,
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Recent audit entries of a project, newest first. Requires `admin`.
pub async fn list_audit(
    state: &AppState,
    token: &str,
    request: ListAuditRequest,
) -> CommandResponse<Vec<AuditEntry>> {
    dispatch(state, token, move |services, actor| {
        AccessGuard::new(services.database.clone()).authorize(
            actor,
            &request.project_id,
            Role::Admin,
        )?;
        match &services.audit_log {
            Some(log) => log.list_for_project(
                &request.project_id,
                request.limit.unwrap_or(DEFAULT_AUDIT_LIMIT),
            ),
            None => Ok(Vec::new()),
        }
    })
    .await
}
