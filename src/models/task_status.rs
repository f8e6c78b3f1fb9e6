//! Task Status Models
//!
//! Board columns of a project and the validated inputs of their lifecycle.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::project::require_id;
use crate::utils::error::{AppError, AppResult};
use crate::utils::slug::{is_valid_slug, MAX_KEY_LEN};

pub const MAX_STATUS_LABEL_LEN: usize = 100;

/// A board column. `position` is dense and 1-based within the project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub id: String,
    pub project_id: String,
    pub key: String,
    pub label: String,
    pub position: i64,
}

/// Request for creating a status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStatusInput {
    pub project_id: String,
    pub label: String,
    /// Preferred key; replaced by a derived one when it is already taken
    #[serde(default)]
    pub key: Option<String>,
}

impl CreateStatusInput {
    /// Validate and return the trimmed label
    pub fn validate(&self) -> AppResult<String> {
        require_id("project_id", &self.project_id)?;
        if let Some(key) = &self.key {
            if !is_valid_slug(key) {
                return Err(AppError::validation(format!(
                    "Invalid status key '{}': use lowercase letters, digits and '_' (max {})",
                    key, MAX_KEY_LEN
                )));
            }
        }
        validate_label(&self.label)
    }
}

/// Request for relabeling a status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusInput {
    pub status_id: String,
    pub label: String,
}

impl UpdateStatusInput {
    pub fn validate(&self) -> AppResult<String> {
        require_id("status_id", &self.status_id)?;
        validate_label(&self.label)
    }
}

/// Request for rewriting the board order of a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderStatusesInput {
    pub project_id: String,
    pub ordered_status_ids: Vec<String>,
}

impl ReorderStatusesInput {
    pub fn validate(&self) -> AppResult<()> {
        require_id("project_id", &self.project_id)?;
        if self.ordered_status_ids.is_empty() {
            return Err(AppError::validation("ordered_status_ids must not be empty"));
        }
        let mut seen = HashSet::with_capacity(self.ordered_status_ids.len());
        for id in &self.ordered_status_ids {
            if !seen.insert(id.as_str()) {
                return Err(AppError::validation(format!(
                    "Status {} appears more than once",
                    id
                )));
            }
        }
        Ok(())
    }
}

/// Request for deleting a status and moving its tasks to a fallback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteStatusInput {
    pub status_id: String,
    pub fallback_status_id: String,
}

impl DeleteStatusInput {
    pub fn validate(&self) -> AppResult<()> {
        require_id("status_id", &self.status_id)?;
        require_id("fallback_status_id", &self.fallback_status_id)?;
        if self.status_id == self.fallback_status_id {
            return Err(AppError::validation(
                "Fallback status must differ from the status being deleted",
            ));
        }
        Ok(())
    }
}

/// Result of a status deletion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteStatusOutcome {
    pub deleted_status_id: String,
    pub fallback_status_id: String,
    /// Number of tasks moved to the fallback
    pub reassigned_tasks: usize,
}

/// Trim and bound a status label
pub fn validate_label(label: &str) -> AppResult<String> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("Status label is required"));
    }
    if trimmed.chars().count() > MAX_STATUS_LABEL_LEN {
        return Err(AppError::validation(format!(
            "Status label cannot exceed {} characters",
            MAX_STATUS_LABEL_LEN
        )));
    }
    if trimmed.chars().any(char::is_control) {
        return Err(AppError::validation(
            "Status label cannot contain control characters",
        ));
    }
    Ok(trimmed.to_string())
}
