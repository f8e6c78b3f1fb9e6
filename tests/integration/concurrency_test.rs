//! Concurrency Integration Tests
//!
//! Several threads drive the managers against one file-backed database
//! through a shared connection pool. Writers are serialized by the store
//! lock, so committed state keeps dense positions and unique keys. A wait
//! past the busy timeout fails with a retryable conflict.

use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

use rusqlite::TransactionBehavior;
use taskdeck_core::{Actor, Role};

use taskdeck_desktop::models::settings::DatabaseConfig;
use taskdeck_desktop::models::task::CreateTaskInput;
use taskdeck_desktop::models::task_status::{
    CreateStatusInput, DeleteStatusInput, ReorderStatusesInput,
};
use taskdeck_desktop::services::search_index::SearchIndexSynchronizer;
use taskdeck_desktop::state::Services;
use taskdeck_desktop::storage::database::Database;
use taskdeck_desktop::utils::error::AppError;

use crate::common::{assert_dense, project_with_members, services_over, status_by_key};

const WRITERS: usize = 6;

fn file_services(dir: &tempfile::TempDir) -> Services {
    file_services_with_timeout(dir, 10_000)
}

fn file_services_with_timeout(dir: &tempfile::TempDir, busy_timeout_ms: u64) -> Services {
    let config = DatabaseConfig {
        path: None,
        pool_size: 8,
        busy_timeout_ms,
    };
    let db = Database::open(&dir.path().join("taskdeck.db"), &config).unwrap();
    services_over(db)
}

#[test]
fn test_concurrent_creates_get_unique_keys_and_dense_positions() {
    let dir = tempfile::tempdir().unwrap();
    let services = Arc::new(file_services(&dir));
    let project = project_with_members(&services, "WEB", &[("editor", Role::Edit)]);
    let barrier = Arc::new(Barrier::new(WRITERS));

    let handles: Vec<_> = (0..WRITERS)
        .map(|_| {
            let services = Arc::clone(&services);
            let barrier = Arc::clone(&barrier);
            let project_id = project.id.clone();
            thread::spawn(move || {
                barrier.wait();
                services.statuses.create(
                    &Actor::user("editor"),
                    &CreateStatusInput {
                        project_id,
                        label: "Review".to_string(),
                        key: None,
                    },
                )
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    let statuses = services
        .statuses
        .list(&Actor::user("editor"), &project.id)
        .unwrap();
    assert_eq!(statuses.len(), 3 + WRITERS);
    assert_dense(&statuses);

    let keys: HashSet<&str> = statuses.iter().map(|s| s.key.as_str()).collect();
    assert_eq!(keys.len(), statuses.len());
    assert!(keys.contains("review"));
    for n in 1..WRITERS {
        assert!(keys.contains(format!("review_{}", n).as_str()));
    }
}

#[test]
fn test_reorder_and_delete_race_keeps_board_consistent() {
    let dir = tempfile::tempdir().unwrap();
    let services = Arc::new(file_services(&dir));
    let project = project_with_members(&services, "WEB", &[("editor", Role::Edit)]);
    let editor = Actor::user("editor");
    let statuses = services.statuses.list(&editor, &project.id).unwrap();

    for i in 0..4 {
        services
            .tasks
            .create_task(
                &editor,
                &CreateTaskInput {
                    project_id: project.id.clone(),
                    title: format!("Task {}", i),
                    description: None,
                    status: Some("in_progress".to_string()),
                },
            )
            .unwrap();
    }

    let reversed: Vec<String> = statuses.iter().rev().map(|s| s.id.clone()).collect();
    let barrier = Arc::new(Barrier::new(2));

    let reorder = {
        let services = Arc::clone(&services);
        let barrier = Arc::clone(&barrier);
        let project_id = project.id.clone();
        thread::spawn(move || {
            barrier.wait();
            services.statuses.reorder(
                &Actor::user("editor"),
                &ReorderStatusesInput {
                    project_id,
                    ordered_status_ids: reversed,
                },
            )
        })
    };
    let delete = {
        let services = Arc::clone(&services);
        let barrier = Arc::clone(&barrier);
        let input = DeleteStatusInput {
            status_id: status_by_key(&statuses, "in_progress").id.clone(),
            fallback_status_id: status_by_key(&statuses, "todo").id.clone(),
        };
        thread::spawn(move || {
            barrier.wait();
            services.statuses.delete(&Actor::user("editor"), &input)
        })
    };

    // Whichever commits second sees the first's result: a reorder after the
    // delete no longer names every status and is rejected
    let reorder_result = reorder.join().unwrap();
    let delete_result = delete.join().unwrap();
    assert_eq!(delete_result.unwrap().reassigned_tasks, 4);

    let final_statuses = services.statuses.list(&editor, &project.id).unwrap();
    assert_eq!(final_statuses.len(), 2);
    assert_dense(&final_statuses);
    if reorder_result.is_ok() {
        // Reorder won: done, todo remain in reversed relative order
        assert_eq!(final_statuses[0].key, "done");
    }

    let tasks = services.tasks.list_tasks(&editor, &project.id, true).unwrap();
    assert!(tasks.iter().all(|t| t.status == "todo"));

    let conn = services.database.get_connection().unwrap();
    assert!(SearchIndexSynchronizer::verify(&conn).unwrap().is_consistent());
}

#[test]
fn test_concurrent_task_writes_keep_index_consistent() {
    let dir = tempfile::tempdir().unwrap();
    let services = Arc::new(file_services(&dir));
    let project = project_with_members(&services, "WEB", &[("editor", Role::Edit)]);
    let barrier = Arc::new(Barrier::new(WRITERS));

    let handles: Vec<_> = (0..WRITERS)
        .map(|i| {
            let services = Arc::clone(&services);
            let barrier = Arc::clone(&barrier);
            let project_id = project.id.clone();
            thread::spawn(move || {
                let editor = Actor::user("editor");
                barrier.wait();
                let task = services.tasks.create_task(
                    &editor,
                    &CreateTaskInput {
                        project_id,
                        title: format!("Parallel task {}", i),
                        description: Some("written concurrently".to_string()),
                        status: None,
                    },
                )?;
                if i % 2 == 0 {
                    services.tasks.soft_delete_task(&editor, &task.id)?;
                }
                Ok::<_, taskdeck_desktop::AppError>(())
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    let live = services
        .tasks
        .list_tasks(&Actor::user("editor"), &project.id, false)
        .unwrap();
    assert_eq!(live.len(), WRITERS / 2);

    let conn = services.database.get_connection().unwrap();
    let report = SearchIndexSynchronizer::verify(&conn).unwrap();
    assert!(report.is_consistent(), "index drift: {:?}", report);
}

#[test]
fn test_lock_timeout_surfaces_conflict() {
    let dir = tempfile::tempdir().unwrap();
    let services = file_services_with_timeout(&dir, 150);
    let project = project_with_members(&services, "WEB", &[("editor", Role::Edit)]);
    let editor = Actor::user("editor");
    let before = services.statuses.list(&editor, &project.id).unwrap();

    let mut holder = services.database.get_connection().unwrap();
    let writer_lock = holder
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .unwrap();

    let err = services
        .statuses
        .create(
            &editor,
            &CreateStatusInput {
                project_id: project.id.clone(),
                label: "QA".to_string(),
                key: None,
            },
        )
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "got {:?}", err);
    assert!(err.code().is_retryable());

    writer_lock.rollback().unwrap();
    drop(holder);

    let after = services.statuses.list(&editor, &project.id).unwrap();
    assert_eq!(after, before);
    let entries = services
        .audit_log
        .as_ref()
        .unwrap()
        .list_for_project(&project.id, 100)
        .unwrap();
    assert!(entries.iter().all(|e| e.detail["key"] != "qa"));
}
