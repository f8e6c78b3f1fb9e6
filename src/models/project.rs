//! Project Models
//!
//! Projects, their memberships and the typed inputs that create or change them.

use serde::{Deserialize, Serialize};
use taskdeck_core::Role;

use crate::utils::error::{AppError, AppResult};

pub const MAX_PROJECT_KEY_LEN: usize = 10;
pub const MAX_PROJECT_NAME_LEN: usize = 120;
pub const MAX_USER_ID_LEN: usize = 128;

/// A project board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    /// Short unique code, immutable after creation
    pub key: String,
    pub name: String,
    pub created_at: String,
}

/// A user's role within a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub project_id: String,
    pub user_id: String,
    pub role: Role,
    pub created_at: String,
    pub updated_at: String,
}

/// Request for creating a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectInput {
    pub key: String,
    pub name: String,
}

impl CreateProjectInput {
    /// Validate and normalize (trimmed name, upper-cased key)
    pub fn validate(&self) -> AppResult<CreateProjectInput> {
        let key = self.key.trim().to_uppercase();
        let valid_key = key.len() >= 2
            && key.len() <= MAX_PROJECT_KEY_LEN
            && key.starts_with(|c: char| c.is_ascii_uppercase())
            && key.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
        if !valid_key {
            return Err(AppError::validation(format!(
                "Invalid project key '{}': use 2-{} letters or digits, starting with a letter",
                self.key, MAX_PROJECT_KEY_LEN
            )));
        }

        let name = self.name.trim();
        if name.is_empty() || name.chars().count() > MAX_PROJECT_NAME_LEN {
            return Err(AppError::validation(format!(
                "Project name must be 1-{} characters",
                MAX_PROJECT_NAME_LEN
            )));
        }

        Ok(CreateProjectInput {
            key,
            name: name.to_string(),
        })
    }
}

/// Request for adding a member or changing a member's role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertMemberInput {
    pub project_id: String,
    pub user_id: String,
    pub role: Role,
}

impl UpsertMemberInput {
    pub fn validate(&self) -> AppResult<()> {
        require_id("project_id", &self.project_id)?;
        validate_user_id(&self.user_id)
    }
}

/// Reject empty identifiers before any store access
pub fn require_id(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{} is required", field)));
    }
    Ok(())
}

pub fn validate_user_id(user_id: &str) -> AppResult<()> {
    require_id("user_id", user_id)?;
    if user_id.len() > MAX_USER_ID_LEN {
        return Err(AppError::validation("user_id is too long"));
    }
    Ok(())
}
