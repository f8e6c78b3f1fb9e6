//! Status Lifecycle Integration Tests
//!
//! Board scenarios driven through the managers with audit enabled:
//! - reorder of a three-column board
//! - delete with task reassignment to a fallback
//! - key derivation when the derived key is taken
//! - view-only members cannot change the board

use taskdeck_core::{Actor, AuditAction, EntityType, Role};

use taskdeck_desktop::models::settings::{AppConfig, DefaultStatus};
use taskdeck_desktop::models::task::CreateTaskInput;
use taskdeck_desktop::models::task_status::{
    CreateStatusInput, DeleteStatusInput, ReorderStatusesInput, TaskStatus, UpdateStatusInput,
};
use taskdeck_desktop::state::Services;
use taskdeck_desktop::storage::database::Database;
use taskdeck_desktop::utils::error::AppError;

use crate::common::{assert_dense, project_with_members, status_by_key};

fn board_services() -> Services {
    let config = AppConfig {
        default_statuses: vec![
            DefaultStatus::new("todo", "To Do"),
            DefaultStatus::new("doing", "Doing"),
            DefaultStatus::new("done", "Done"),
        ],
        ..AppConfig::default()
    };
    Services::build(Database::new_in_memory().unwrap(), &config)
}

fn editor() -> Actor {
    Actor::user("editor")
}

fn ordered_keys(statuses: &[TaskStatus]) -> Vec<(&str, i64)> {
    statuses.iter().map(|s| (s.key.as_str(), s.position)).collect()
}

#[test]
fn test_reorder_three_columns() {
    let services = board_services();
    let project = project_with_members(&services, "WEB", &[("editor", Role::Edit)]);
    let statuses = services.statuses.list(&editor(), &project.id).unwrap();
    assert_eq!(
        ordered_keys(&statuses),
        vec![("todo", 1), ("doing", 2), ("done", 3)]
    );

    let ids = ["doing", "done", "todo"]
        .iter()
        .map(|key| status_by_key(&statuses, key).id.clone())
        .collect();
    let reordered = services
        .statuses
        .reorder(
            &editor(),
            &ReorderStatusesInput {
                project_id: project.id.clone(),
                ordered_status_ids: ids,
            },
        )
        .unwrap();

    assert_eq!(
        ordered_keys(&reordered),
        vec![("doing", 1), ("done", 2), ("todo", 3)]
    );
    assert_eq!(
        services.statuses.list(&editor(), &project.id).unwrap(),
        reordered
    );
}

#[test]
fn test_delete_moves_tasks_to_fallback() {
    let services = board_services();
    let project = project_with_members(&services, "WEB", &[("editor", Role::Edit)]);
    let statuses = services.statuses.list(&editor(), &project.id).unwrap();

    let mut task_ids = Vec::new();
    for title in ["Wire login", "Style header"] {
        let task = services
            .tasks
            .create_task(
                &editor(),
                &CreateTaskInput {
                    project_id: project.id.clone(),
                    title: title.to_string(),
                    description: None,
                    status: Some("doing".to_string()),
                },
            )
            .unwrap();
        task_ids.push(task.id);
    }

    let outcome = services
        .statuses
        .delete(
            &editor(),
            &DeleteStatusInput {
                status_id: status_by_key(&statuses, "doing").id.clone(),
                fallback_status_id: status_by_key(&statuses, "todo").id.clone(),
            },
        )
        .unwrap();
    assert_eq!(outcome.reassigned_tasks, 2);

    for id in &task_ids {
        let task = services.tasks.get_task(&editor(), id).unwrap();
        assert_eq!(task.status, "todo");
    }

    let remaining = services.statuses.list(&editor(), &project.id).unwrap();
    assert!(remaining.iter().all(|s| s.key != "doing"));
    assert_eq!(ordered_keys(&remaining), vec![("todo", 1), ("done", 2)]);
}

#[test]
fn test_create_with_taken_derived_key() {
    let services = board_services();
    let project = project_with_members(&services, "WEB", &[("editor", Role::Edit)]);

    let first = services
        .statuses
        .create(
            &editor(),
            &CreateStatusInput {
                project_id: project.id.clone(),
                label: "Review".to_string(),
                key: Some("in_review".to_string()),
            },
        )
        .unwrap();
    assert_eq!(first.key, "in_review");

    let second = services
        .statuses
        .create(
            &editor(),
            &CreateStatusInput {
                project_id: project.id.clone(),
                label: "In Review 🚧".to_string(),
                key: None,
            },
        )
        .unwrap();
    assert_eq!(second.key, "in_review_1");
    assert_ne!(second.key, first.key);

    let statuses = services.statuses.list(&editor(), &project.id).unwrap();
    assert_dense(&statuses);
    assert_eq!(statuses.last().map(|s| s.id.as_str()), Some(second.id.as_str()));
}

#[test]
fn test_view_member_cannot_change_board() {
    let services = board_services();
    let project = project_with_members(&services, "WEB", &[("viewer", Role::View)]);
    let viewer = Actor::user("viewer");
    let before = services.statuses.list(&viewer, &project.id).unwrap();

    let create = services.statuses.create(
        &viewer,
        &CreateStatusInput {
            project_id: project.id.clone(),
            label: "QA".to_string(),
            key: None,
        },
    );
    assert!(matches!(create, Err(AppError::PermissionDenied(_))));

    let relabel = services.statuses.relabel(
        &viewer,
        &UpdateStatusInput {
            status_id: before[0].id.clone(),
            label: "Backlog".to_string(),
        },
    );
    assert!(matches!(relabel, Err(AppError::PermissionDenied(_))));

    let reorder = services.statuses.reorder(
        &viewer,
        &ReorderStatusesInput {
            project_id: project.id.clone(),
            ordered_status_ids: before.iter().rev().map(|s| s.id.clone()).collect(),
        },
    );
    assert!(matches!(reorder, Err(AppError::PermissionDenied(_))));

    let delete = services.statuses.delete(
        &viewer,
        &DeleteStatusInput {
            status_id: before[1].id.clone(),
            fallback_status_id: before[0].id.clone(),
        },
    );
    assert!(matches!(delete, Err(AppError::PermissionDenied(_))));

    assert_eq!(services.statuses.list(&viewer, &project.id).unwrap(), before);
}

#[test]
fn test_outsider_is_denied_and_missing_project_not_found() {
    let services = board_services();
    let project = project_with_members(&services, "WEB", &[]);

    assert!(matches!(
        services.statuses.list(&Actor::user("stranger"), &project.id),
        Err(AppError::PermissionDenied(_))
    ));
    assert!(matches!(
        services.statuses.list(&Actor::user("stranger"), "no-such-project"),
        Err(AppError::NotFound(_))
    ));
}

#[test]
fn test_delete_until_one_status_remains() {
    let services = board_services();
    let project = project_with_members(&services, "WEB", &[("editor", Role::Edit)]);
    let statuses = services.statuses.list(&editor(), &project.id).unwrap();
    let todo = status_by_key(&statuses, "todo").id.clone();

    for key in ["doing", "done"] {
        services
            .statuses
            .delete(
                &editor(),
                &DeleteStatusInput {
                    status_id: status_by_key(&statuses, key).id.clone(),
                    fallback_status_id: todo.clone(),
                },
            )
            .unwrap();
    }

    let remaining = services.statuses.list(&editor(), &project.id).unwrap();
    assert_eq!(ordered_keys(&remaining), vec![("todo", 1)]);

    // The last status has no possible fallback
    let err = services
        .statuses
        .delete(
            &editor(),
            &DeleteStatusInput {
                status_id: todo.clone(),
                fallback_status_id: status_by_key(&statuses, "done").id.clone(),
            },
        )
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(services.statuses.list(&editor(), &project.id).unwrap().len(), 1);
}

#[test]
fn test_mutations_are_audited_after_commit() {
    let services = board_services();
    let project = project_with_members(&services, "WEB", &[("editor", Role::Edit)]);

    let created = services
        .statuses
        .create(
            &editor(),
            &CreateStatusInput {
                project_id: project.id.clone(),
                label: "QA".to_string(),
                key: None,
            },
        )
        .unwrap();

    let log = services.audit_log.as_ref().unwrap();
    let entries = log.list_for_entity(EntityType::TaskStatus, &created.id).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, AuditAction::Created);
    assert_eq!(entries[0].actor_id, "editor");
    assert_eq!(entries[0].detail["key"], "qa");

    // A rejected mutation leaves no trace
    let _ = services.statuses.reorder(
        &editor(),
        &ReorderStatusesInput {
            project_id: project.id.clone(),
            ordered_status_ids: vec![created.id.clone()],
        },
    );
    let project_entries = log.list_for_entity(EntityType::Project, &project.id).unwrap();
    assert!(project_entries
        .iter()
        .all(|e| e.action != AuditAction::Reordered));
}
