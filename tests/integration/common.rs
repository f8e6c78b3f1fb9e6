//! Shared fixtures for the integration tests

use taskdeck_core::{Actor, Role};

use taskdeck_desktop::models::project::{CreateProjectInput, Project, UpsertMemberInput};
use taskdeck_desktop::models::settings::AppConfig;
use taskdeck_desktop::models::task_status::TaskStatus;
use taskdeck_desktop::state::Services;
use taskdeck_desktop::storage::database::Database;

pub fn root() -> Actor {
    Actor::system_admin("root")
}

pub fn services_over(db: Database) -> Services {
    Services::build(db, &AppConfig::default())
}

pub fn in_memory_services() -> Services {
    services_over(Database::new_in_memory().expect("Failed to create in-memory test database"))
}

/// Create a project with the default board and the given members
pub fn project_with_members(services: &Services, key: &str, members: &[(&str, Role)]) -> Project {
    let project = services
        .projects
        .create_project(
            &root(),
            &CreateProjectInput {
                key: key.to_string(),
                name: format!("{} project", key),
            },
        )
        .unwrap();
    for (user, role) in members {
        services
            .members
            .upsert_member(
                &root(),
                &UpsertMemberInput {
                    project_id: project.id.clone(),
                    user_id: user.to_string(),
                    role: *role,
                },
            )
            .unwrap();
    }
    project
}

pub fn status_by_key<'a>(statuses: &'a [TaskStatus], key: &str) -> &'a TaskStatus {
    statuses
        .iter()
        .find(|s| s.key == key)
        .unwrap_or_else(|| panic!("status {} missing", key))
}

/// Positions form exactly `1..=n`
pub fn assert_dense(statuses: &[TaskStatus]) {
    let mut positions: Vec<i64> = statuses.iter().map(|s| s.position).collect();
    positions.sort_unstable();
    let expected: Vec<i64> = (1..=statuses.len() as i64).collect();
    assert_eq!(positions, expected, "positions are not dense");
}
