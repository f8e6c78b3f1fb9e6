//! Status Commands
//!
//! Board column lifecycle: list, create, relabel, reorder and delete.

use serde::{Deserialize, Serialize};

use crate::commands::dispatch;
use crate::models::response::CommandResponse;
use crate::models::task_status::{
    CreateStatusInput, DeleteStatusInput, DeleteStatusOutcome, ReorderStatusesInput, TaskStatus,
    UpdateStatusInput,
};
use crate::state::AppState;

/// Request naming a single project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRequest {
    pub project_id: String,
}

/// List the statuses of a project in board order
pub async fn list_statuses(
    state: &AppState,
    token: &str,
    request: ProjectRequest,
) -> CommandResponse<Vec<TaskStatus>> {
    dispatch(state, token, move |services, actor| {
        services.statuses.list(actor, &request.project_id)
    })
    .await
}

/// Create a status at the end of the board
pub async fn create_status(
    state: &AppState,
    token: &str,
    request: CreateStatusInput,
) -> CommandResponse<TaskStatus> {
    dispatch(state, token, move |services, actor| {
        services.statuses.create(actor, &request)
    })
    .await
}

/// Relabel a status
pub async fn update_status(
    state: &AppState,
    token: &str,
    request: UpdateStatusInput,
) -> CommandResponse<TaskStatus> {
    dispatch(state, token, move |services, actor| {
        services.statuses.relabel(actor, &request)
    })
    .await
}

/// Rewrite the board order
pub async fn reorder_statuses(
    state: &AppState,
    token: &str,
    request: ReorderStatusesInput,
) -> CommandResponse<Vec<TaskStatus>> {
    dispatch(state, token, move |services, actor| {
        services.statuses.reorder(actor, &request)
    })
    .await
}

/// Delete a status, moving its tasks to the fallback
pub async fn delete_status(
    state: &AppState,
    token: &str,
    request: DeleteStatusInput,
) -> CommandResponse<DeleteStatusOutcome> {
    dispatch(state, token, move |services, actor| {
        services.statuses.delete(actor, &request)
    })
    .await
}
