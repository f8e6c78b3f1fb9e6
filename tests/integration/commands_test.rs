//! Command Surface Integration Tests
//!
//! Drives the async commands the way a host would: with session tokens,
//! request structs and the `{ code, message }` error envelope.

use std::sync::Arc;

use taskdeck_core::{Actor, ErrorCode, Role, StaticTokenGuard};

use taskdeck_desktop::commands::{
    self, ListAuditRequest, ListTasksRequest, ProjectRequest, RemoveMemberRequest, TaskRequest,
};
use taskdeck_desktop::models::project::{CreateProjectInput, UpsertMemberInput};
use taskdeck_desktop::models::task::{CreateTaskInput, SearchTasksInput};
use taskdeck_desktop::models::task_status::{CreateStatusInput, ReorderStatusesInput};
use taskdeck_desktop::state::AppState;
use taskdeck_desktop::storage::config::ConfigService;
use taskdeck_desktop::storage::database::Database;

struct Harness {
    state: AppState,
    _dir: tempfile::TempDir,
}

async fn harness() -> Harness {
    let guard = StaticTokenGuard::new();
    guard.insert("tok-root", Actor::system_admin("root"));
    guard.insert("tok-editor", Actor::user("editor"));
    guard.insert("tok-viewer", Actor::user("viewer"));

    let dir = tempfile::tempdir().unwrap();
    let config = ConfigService::at_path(dir.path().join("config.json")).unwrap();
    let state = AppState::new(Arc::new(guard));
    state
        .initialize_with(config, Database::new_in_memory().unwrap())
        .await
        .unwrap();
    Harness { state, _dir: dir }
}

async fn create_board(state: &AppState) -> String {
    let project = commands::create_project(
        state,
        "tok-root",
        CreateProjectInput {
            key: "WEB".to_string(),
            name: "Website".to_string(),
        },
    )
    .await
    .data
    .unwrap();

    for (user, role) in [("editor", Role::Edit), ("viewer", Role::View)] {
        let response = commands::upsert_member(
            state,
            "tok-root",
            UpsertMemberInput {
                project_id: project.id.clone(),
                user_id: user.to_string(),
                role,
            },
        )
        .await;
        assert!(response.success);
    }
    project.id
}

#[tokio::test]
async fn test_unknown_token_is_unauthenticated() {
    let h = harness().await;
    let response = commands::list_projects(&h.state, "tok-bogus").await;
    assert!(!response.success);
    assert_eq!(response.error_code(), Some(ErrorCode::Unauthenticated));
}

#[tokio::test]
async fn test_board_workflow_through_commands() {
    let h = harness().await;
    let project_id = create_board(&h.state).await;

    let created = commands::create_status(
        &h.state,
        "tok-editor",
        CreateStatusInput {
            project_id: project_id.clone(),
            label: "In Review".to_string(),
            key: None,
        },
    )
    .await;
    assert!(created.success);
    assert_eq!(created.data.as_ref().unwrap().position, 4);

    let statuses = commands::list_statuses(
        &h.state,
        "tok-viewer",
        ProjectRequest {
            project_id: project_id.clone(),
        },
    )
    .await
    .data
    .unwrap();
    let keys: Vec<&str> = statuses.iter().map(|s| s.key.as_str()).collect();
    assert_eq!(keys, vec!["todo", "in_progress", "done", "in_review"]);

    let reordered = commands::reorder_statuses(
        &h.state,
        "tok-editor",
        ReorderStatusesInput {
            project_id: project_id.clone(),
            ordered_status_ids: statuses.iter().rev().map(|s| s.id.clone()).collect(),
        },
    )
    .await;
    assert!(reordered.success);
    assert_eq!(reordered.data.unwrap()[0].key, "in_review");

    let task = commands::create_task(
        &h.state,
        "tok-editor",
        CreateTaskInput {
            project_id: project_id.clone(),
            title: "Audit checkout flow".to_string(),
            description: None,
            status: None,
        },
    )
    .await
    .data
    .unwrap();
    // First column after the reorder
    assert_eq!(task.status, "in_review");

    let hits = commands::search_tasks(
        &h.state,
        "tok-viewer",
        SearchTasksInput {
            project_id: project_id.clone(),
            query: "checkout".to_string(),
            limit: None,
        },
    )
    .await
    .data
    .unwrap();
    assert_eq!(hits.len(), 1);

    let deleted = commands::delete_task(
        &h.state,
        "tok-editor",
        TaskRequest {
            task_id: task.id.clone(),
        },
    )
    .await;
    assert!(deleted.data.unwrap().deleted_at.is_some());

    let all = commands::list_tasks(
        &h.state,
        "tok-viewer",
        ListTasksRequest {
            project_id: project_id.clone(),
            include_deleted: true,
        },
    )
    .await
    .data
    .unwrap();
    assert_eq!(all.len(), 1);

    let health = commands::get_health(&h.state).await.data.unwrap();
    assert!(health.database);
    assert!(health.search_index);
    assert_eq!(health.status, "healthy");
}

#[tokio::test]
async fn test_error_codes_are_stable() {
    let h = harness().await;
    let project_id = create_board(&h.state).await;

    let denied = commands::create_status(
        &h.state,
        "tok-viewer",
        CreateStatusInput {
            project_id: project_id.clone(),
            label: "QA".to_string(),
            key: None,
        },
    )
    .await;
    assert_eq!(denied.error_code(), Some(ErrorCode::PermissionDenied));

    let invalid = commands::create_status(
        &h.state,
        "tok-editor",
        CreateStatusInput {
            project_id: project_id.clone(),
            label: "   ".to_string(),
            key: None,
        },
    )
    .await;
    assert_eq!(invalid.error_code(), Some(ErrorCode::Validation));

    let missing = commands::get_project(
        &h.state,
        "tok-editor",
        ProjectRequest {
            project_id: "no-such-project".to_string(),
        },
    )
    .await;
    assert_eq!(missing.error_code(), Some(ErrorCode::NotFound));

    let duplicate = commands::create_project(
        &h.state,
        "tok-root",
        CreateProjectInput {
            key: "web".to_string(),
            name: "Again".to_string(),
        },
    )
    .await;
    assert_eq!(duplicate.error_code(), Some(ErrorCode::Conflict));
    assert!(ErrorCode::Conflict.is_retryable());

    let purge = commands::purge_task(
        &h.state,
        "tok-editor",
        TaskRequest {
            task_id: "nope".to_string(),
        },
    )
    .await;
    assert_eq!(purge.error_code(), Some(ErrorCode::NotFound));
}

#[tokio::test]
async fn test_membership_and_audit_commands() {
    let h = harness().await;
    let project_id = create_board(&h.state).await;

    let members = commands::list_members(
        &h.state,
        "tok-viewer",
        ProjectRequest {
            project_id: project_id.clone(),
        },
    )
    .await
    .data
    .unwrap();
    assert_eq!(members.len(), 3);

    // Only admins read the audit trail
    let denied = commands::list_audit(
        &h.state,
        "tok-editor",
        ListAuditRequest {
            project_id: project_id.clone(),
            limit: None,
        },
    )
    .await;
    assert_eq!(denied.error_code(), Some(ErrorCode::PermissionDenied));

    let removed = commands::remove_member(
        &h.state,
        "tok-root",
        RemoveMemberRequest {
            project_id: project_id.clone(),
            user_id: "viewer".to_string(),
        },
    )
    .await;
    assert!(removed.success);

    let lost_access = commands::list_statuses(
        &h.state,
        "tok-viewer",
        ProjectRequest {
            project_id: project_id.clone(),
        },
    )
    .await;
    assert_eq!(lost_access.error_code(), Some(ErrorCode::PermissionDenied));

    let entries = commands::list_audit(
        &h.state,
        "tok-root",
        ListAuditRequest {
            project_id: project_id.clone(),
            limit: Some(10),
        },
    )
    .await
    .data
    .unwrap();
    // project created, two members upserted, one removed
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[0].entity_id, format!("{}:viewer", project_id));
}

#[tokio::test]
async fn test_version_matches_package() {
    let response = commands::get_version();
    assert_eq!(response.data.as_deref(), Some(env!("CARGO_PKG_VERSION")));
}
