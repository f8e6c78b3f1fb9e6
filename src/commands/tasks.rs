//! Task Commands
//!
//! Task CRUD, soft delete and full-text search.

use serde::{Deserialize, Serialize};

use crate::commands::dispatch;
use crate::models::response::CommandResponse;
use crate::models::task::{CreateTaskInput, SearchTasksInput, Task, TaskSearchHit, UpdateTaskInput};
use crate::state::AppState;

/// Request naming a single task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRequest {
    pub task_id: String,
}

/// Request for listing the tasks of a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListTasksRequest {
    pub project_id: String,
    #[serde(default)]
    pub include_deleted: bool,
}

pub async fn create_task(
    state: &AppState,
    token: &str,
    request: CreateTaskInput,
) -> CommandResponse<Task> {
    dispatch(state, token, move |services, actor| {
        services.tasks.create_task(actor, &request)
    })
    .await
}

pub async fn update_task(
    state: &AppState,
    token: &str,
    request: UpdateTaskInput,
) -> CommandResponse<Task> {
    dispatch(state, token, move |services, actor| {
        services.tasks.update_task(actor, &request)
    })
    .await
}

/// Soft-delete a task
pub async fn delete_task(
    state: &AppState,
    token: &str,
    request: TaskRequest,
) -> CommandResponse<Task> {
    dispatch(state, token, move |services, actor| {
        services.tasks.soft_delete_task(actor, &request.task_id)
    })
    .await
}

pub async fn restore_task(
    state: &AppState,
    token: &str,
    request: TaskRequest,
) -> CommandResponse<Task> {
    dispatch(state, token, move |services, actor| {
        services.tasks.restore_task(actor, &request.task_id)
    })
    .await
}

/// Permanently remove a task
pub async fn purge_task(
    state: &AppState,
    token: &str,
    request: TaskRequest,
) -> CommandResponse<()> {
    dispatch(state, token, move |services, actor| {
        services.tasks.purge_task(actor, &request.task_id)
    })
    .await
}

pub async fn list_tasks(
    state: &AppState,
    token: &str,
    request: ListTasksRequest,
) -> CommandResponse<Vec<Task>> {
    dispatch(state, token, move |services, actor| {
        services
            .tasks
            .list_tasks(actor, &request.project_id, request.include_deleted)
    })
    .await
}

/// Full-text search within a project
pub async fn search_tasks(
    state: &AppState,
    token: &str,
    request: SearchTasksInput,
) -> CommandResponse<Vec<TaskSearchHit>> {
    dispatch(state, token, move |services, actor| {
        services.tasks.search_tasks(actor, &request)
    })
    .await
}
