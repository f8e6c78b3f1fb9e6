//! Task Models
//!
//! Tasks are owned by projects and reference a status by key.

use serde::{Deserialize, Deserializer, Serialize};

use crate::models::project::require_id;
use crate::utils::error::{AppError, AppResult};
use crate::utils::slug::is_valid_slug;

pub const MAX_TASK_TITLE_LEN: usize = 200;
pub const MAX_TASK_DESCRIPTION_LEN: usize = 20_000;
pub const MAX_SEARCH_QUERY_LEN: usize = 256;

/// A task on a project board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub project_id: String,
    /// Key of the task's status within the project
    pub status: String,
    pub title: String,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    /// Set when the task is soft-deleted
    pub deleted_at: Option<String>,
}

/// Request for creating a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskInput {
    pub project_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Status key; defaults to the first column of the board
    #[serde(default)]
    pub status: Option<String>,
}

impl CreateTaskInput {
    /// Validate and normalize the input
    pub fn validate(&self) -> AppResult<CreateTaskInput> {
        require_id("project_id", &self.project_id)?;
        if let Some(status) = &self.status {
            validate_status_key(status)?;
        }
        Ok(CreateTaskInput {
            project_id: self.project_id.clone(),
            title: validate_title(&self.title)?,
            description: normalize_description(self.description.as_deref())?,
            status: self.status.clone(),
        })
    }
}

/// Partial task update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTaskInput {
    pub task_id: String,
    #[serde(default)]
    pub title: Option<String>,
    /// Absent leaves the description alone; `null` (`Some(None)`) clears it
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Keeps an explicit `null` apart from an absent field: any present value,
/// `null` included, lands in the outer `Some`.
fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl UpdateTaskInput {
    pub fn validate(&self) -> AppResult<UpdateTaskInput> {
        require_id("task_id", &self.task_id)?;
        if self.title.is_none() && self.description.is_none() && self.status.is_none() {
            return Err(AppError::validation("Nothing to update"));
        }
        if let Some(status) = &self.status {
            validate_status_key(status)?;
        }
        let title = self.title.as_deref().map(validate_title).transpose()?;
        let description = match &self.description {
            Some(value) => Some(normalize_description(value.as_deref())?),
            None => None,
        };
        Ok(UpdateTaskInput {
            task_id: self.task_id.clone(),
            title,
            description,
            status: self.status.clone(),
        })
    }
}

/// Request for a full-text search within a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchTasksInput {
    pub project_id: String,
    pub query: String,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl SearchTasksInput {
    pub fn validate(&self) -> AppResult<()> {
        require_id("project_id", &self.project_id)?;
        if self.query.len() > MAX_SEARCH_QUERY_LEN {
            return Err(AppError::validation(format!(
                "Search query cannot exceed {} bytes",
                MAX_SEARCH_QUERY_LEN
            )));
        }
        if self.limit == Some(0) {
            return Err(AppError::validation("limit must be positive"));
        }
        Ok(())
    }
}

/// A search result with its relevance (lower is better, bm25)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSearchHit {
    pub task: Task,
    pub rank: f64,
}

fn validate_title(title: &str) -> AppResult<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("Task title is required"));
    }
    if trimmed.chars().count() > MAX_TASK_TITLE_LEN {
        return Err(AppError::validation(format!(
            "Task title cannot exceed {} characters",
            MAX_TASK_TITLE_LEN
        )));
    }
    Ok(trimmed.to_string())
}

/// Blank descriptions are stored as NULL
fn normalize_description(description: Option<&str>) -> AppResult<Option<String>> {
    match description {
        Some(text) if text.chars().count() > MAX_TASK_DESCRIPTION_LEN => Err(
            AppError::validation(format!(
                "Task description cannot exceed {} characters",
                MAX_TASK_DESCRIPTION_LEN
            )),
        ),
        Some(text) if !text.trim().is_empty() => Ok(Some(text.to_string())),
        _ => Ok(None),
    }
}

fn validate_status_key(key: &str) -> AppResult<()> {
    if !is_valid_slug(key) {
        return Err(AppError::validation(format!("Invalid status key '{}'", key)));
    }
    Ok(())
}
