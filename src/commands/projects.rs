//! Project Commands

use crate::commands::dispatch;
use crate::commands::statuses::ProjectRequest;
use crate::models::project::{CreateProjectInput, Project};
use crate::models::response::CommandResponse;
use crate::state::AppState;

/// Create a project with the default board. System administrators only.
pub async fn create_project(
    state: &AppState,
    token: &str,
    request: CreateProjectInput,
) -> CommandResponse<Project> {
    dispatch(state, token, move |services, actor| {
        services.projects.create_project(actor, &request)
    })
    .await
}

/// Get a single project by ID
pub async fn get_project(
    state: &AppState,
    token: &str,
    request: ProjectRequest,
) -> CommandResponse<Project> {
    dispatch(state, token, move |services, actor| {
        services.projects.get_project(actor, &request.project_id)
    })
    .await
}

/// List the projects visible to the caller
pub async fn list_projects(state: &AppState, token: &str) -> CommandResponse<Vec<Project>> {
    dispatch(state, token, |services, actor| {
        services.projects.list_projects(actor)
    })
    .await
}
