//! Search Index Integration Tests
//!
//! After any committed sequence of task creates, edits, soft deletes,
//! restores, purges and status deletions the index holds exactly one entry
//! per live task, with that task's current text.

use taskdeck_core::{Actor, Role};

use taskdeck_desktop::models::task::{CreateTaskInput, SearchTasksInput, UpdateTaskInput};
use taskdeck_desktop::models::task_status::DeleteStatusInput;
use taskdeck_desktop::services::search_index::SearchIndexSynchronizer;
use taskdeck_desktop::state::Services;
use taskdeck_desktop::storage::unit_of_work::UnitOfWork;

use crate::common::{in_memory_services, project_with_members, status_by_key};

fn assert_index_consistent(services: &Services) {
    let conn = services.database.get_connection().unwrap();
    let report = SearchIndexSynchronizer::verify(&conn).unwrap();
    assert!(report.is_consistent(), "index drift: {:?}", report);
}

fn search(services: &Services, project_id: &str, query: &str) -> Vec<String> {
    services
        .tasks
        .search_tasks(
            &Actor::user("owner"),
            &SearchTasksInput {
                project_id: project_id.to_string(),
                query: query.to_string(),
                limit: None,
            },
        )
        .unwrap()
        .into_iter()
        .map(|hit| hit.task.title)
        .collect()
}

#[test]
fn test_index_follows_every_task_mutation() {
    let services = in_memory_services();
    let project = project_with_members(&services, "WEB", &[("owner", Role::Admin)]);
    let owner = Actor::user("owner");

    let mut ids = Vec::new();
    for (title, description) in [
        ("Fix login redirect", Some("OAuth callback loses state")),
        ("Cache avatars", None),
        ("Document deploy", Some("Runbook for the release train")),
    ] {
        let task = services
            .tasks
            .create_task(
                &owner,
                &CreateTaskInput {
                    project_id: project.id.clone(),
                    title: title.to_string(),
                    description: description.map(str::to_string),
                    status: None,
                },
            )
            .unwrap();
        ids.push(task.id);
    }
    assert_index_consistent(&services);
    assert_eq!(search(&services, &project.id, "oauth"), vec!["Fix login redirect"]);

    services
        .tasks
        .update_task(
            &owner,
            &UpdateTaskInput {
                task_id: ids[1].clone(),
                title: Some("Cache user avatars".to_string()),
                description: Some(Some("CDN backed".to_string())),
                status: Some("done".to_string()),
            },
        )
        .unwrap();
    assert_index_consistent(&services);
    assert_eq!(search(&services, &project.id, "cdn"), vec!["Cache user avatars"]);

    services.tasks.soft_delete_task(&owner, &ids[0]).unwrap();
    assert_index_consistent(&services);
    assert!(search(&services, &project.id, "oauth").is_empty());

    services.tasks.restore_task(&owner, &ids[0]).unwrap();
    assert_index_consistent(&services);
    assert_eq!(search(&services, &project.id, "login"), vec!["Fix login redirect"]);

    services.tasks.purge_task(&owner, &ids[2]).unwrap();
    assert_index_consistent(&services);
    assert!(search(&services, &project.id, "runbook").is_empty());

    // Status reassignment does not touch indexed text
    let statuses = services.statuses.list(&owner, &project.id).unwrap();
    services
        .statuses
        .delete(
            &owner,
            &DeleteStatusInput {
                status_id: status_by_key(&statuses, "done").id.clone(),
                fallback_status_id: status_by_key(&statuses, "todo").id.clone(),
            },
        )
        .unwrap();
    assert_index_consistent(&services);
    assert_eq!(search(&services, &project.id, "avatars"), vec!["Cache user avatars"]);
}

#[test]
fn test_rolled_back_write_leaves_index_untouched() {
    let services = in_memory_services();
    let project = project_with_members(&services, "WEB", &[("owner", Role::Admin)]);

    let uow = UnitOfWork::new(services.database.clone());
    let result: Result<(), _> = uow.run(|tx| {
        tx.execute(
            "INSERT INTO task (id, project_id, status, title, created_at, updated_at)
             VALUES ('t-ghost', ?1, 'todo', 'Ghost task', 'now', 'now')",
            [&project.id],
        )?;
        Err(taskdeck_desktop::AppError::validation("abort"))
    });
    assert!(result.is_err());

    assert!(search(&services, &project.id, "ghost").is_empty());
    assert_index_consistent(&services);
}

#[test]
fn test_search_is_scoped_to_project() {
    let services = in_memory_services();
    let web = project_with_members(&services, "WEB", &[("owner", Role::Admin)]);
    let ops = project_with_members(&services, "OPS", &[("owner", Role::Admin)]);

    for project_id in [&web.id, &ops.id] {
        services
            .tasks
            .create_task(
                &Actor::user("owner"),
                &CreateTaskInput {
                    project_id: project_id.clone(),
                    title: "Rotate certificates".to_string(),
                    description: None,
                    status: None,
                },
            )
            .unwrap();
    }

    let hits = services
        .tasks
        .search_tasks(
            &Actor::user("owner"),
            &SearchTasksInput {
                project_id: web.id.clone(),
                query: "certif".to_string(),
                limit: None,
            },
        )
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].task.project_id, web.id);

    // Non-members cannot search
    assert!(services
        .tasks
        .search_tasks(
            &Actor::user("stranger"),
            &SearchTasksInput {
                project_id: web.id.clone(),
                query: "certif".to_string(),
                limit: None,
            },
        )
        .is_err());
}
