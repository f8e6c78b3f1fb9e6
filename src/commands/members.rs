//! Membership Commands

use serde::{Deserialize, Serialize};

use crate::commands::dispatch;
use crate::commands::statuses::ProjectRequest;
use crate::models::project::{Membership, UpsertMemberInput};
use crate::models::response::CommandResponse;
use crate::state::AppState;

/// Request for removing a member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveMemberRequest {
    pub project_id: String,
    pub user_id: String,
}

/// Add a member or change a member's role
pub async fn upsert_member(
    state: &AppState,
    token: &str,
    request: UpsertMemberInput,
) -> CommandResponse<Membership> {
    dispatch(state, token, move |services, actor| {
        services.members.upsert_member(actor, &request)
    })
    .await
}

/// Remove a member from a project
pub async fn remove_member(
    state: &AppState,
    token: &str,
    request: RemoveMemberRequest,
) -> CommandResponse<()> {
    dispatch(state, token, move |services, actor| {
        services
            .members
            .remove_member(actor, &request.project_id, &request.user_id)
    })
    .await
}

/// List the members of a project
pub async fn list_members(
    state: &AppState,
    token: &str,
    request: ProjectRequest,
) -> CommandResponse<Vec<Membership>> {
    dispatch(state, token, move |services, actor| {
        services.members.list_members(actor, &request.project_id)
    })
    .await
}
