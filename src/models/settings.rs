//! Settings Models
//!
//! Application configuration and settings data structures.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::utils::slug::is_valid_slug;

/// Application configuration stored in config.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Entity store settings
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Statuses seeded into every new project, in board order.
    /// Their keys are reserved and never produced by key derivation.
    #[serde(default = "default_statuses")]
    pub default_statuses: Vec<DefaultStatus>,
    /// Record an audit trail of mutations
    #[serde(default = "default_true")]
    pub audit_enabled: bool,
    /// Search index settings
    #[serde(default)]
    pub search: SearchConfig,
}

/// Entity store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Override for the database file (defaults to ~/.taskdeck/data.db)
    #[serde(default)]
    pub path: Option<String>,
    /// Maximum pooled connections
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    /// How long a transaction waits for the writer lock before failing
    /// with a retryable conflict
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

/// Search index settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Rebuild the task search index from the task table on startup
    #[serde(default)]
    pub rebuild_on_start: bool,
    /// Result limit used when a search request omits one
    #[serde(default = "default_search_limit")]
    pub default_limit: u32,
}

/// A status seeded into new projects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultStatus {
    pub key: String,
    pub label: String,
}

impl DefaultStatus {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_pool_size() -> u32 {
    8
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

fn default_search_limit() -> u32 {
    50
}

fn default_statuses() -> Vec<DefaultStatus> {
    vec![
        DefaultStatus::new("todo", "To Do"),
        DefaultStatus::new("in_progress", "In Progress"),
        DefaultStatus::new("done", "Done"),
    ]
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            pool_size: default_pool_size(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            rebuild_on_start: false,
            default_limit: default_search_limit(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            default_statuses: default_statuses(),
            audit_enabled: true,
            search: SearchConfig::default(),
        }
    }
}

/// Settings update request (partial update)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SettingsUpdate {
    pub pool_size: Option<u32>,
    pub busy_timeout_ms: Option<u64>,
    pub default_statuses: Option<Vec<DefaultStatus>>,
    pub audit_enabled: Option<bool>,
    pub rebuild_search_on_start: Option<bool>,
    pub search_default_limit: Option<u32>,
}

impl AppConfig {
    /// Apply a partial update to the configuration
    pub fn apply_update(&mut self, update: SettingsUpdate) {
        if let Some(pool_size) = update.pool_size {
            self.database.pool_size = pool_size;
        }
        if let Some(timeout) = update.busy_timeout_ms {
            self.database.busy_timeout_ms = timeout;
        }
        if let Some(statuses) = update.default_statuses {
            self.default_statuses = statuses;
        }
        if let Some(enabled) = update.audit_enabled {
            self.audit_enabled = enabled;
        }
        if let Some(rebuild) = update.rebuild_search_on_start {
            self.search.rebuild_on_start = rebuild;
        }
        if let Some(limit) = update.search_default_limit {
            self.search.default_limit = limit;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.database.pool_size == 0 || self.database.pool_size > 64 {
            return Err(format!(
                "Invalid pool_size: {}. Must be between 1 and 64",
                self.database.pool_size
            ));
        }

        if self.database.busy_timeout_ms < 100 {
            return Err("busy_timeout_ms must be at least 100 milliseconds".to_string());
        }

        if self.default_statuses.is_empty() {
            return Err("default_statuses must contain at least one status".to_string());
        }

        let mut seen = HashSet::new();
        for status in &self.default_statuses {
            if !is_valid_slug(&status.key) {
                return Err(format!("Invalid default status key: {}", status.key));
            }
            if status.label.trim().is_empty() {
                return Err(format!("Default status '{}' has an empty label", status.key));
            }
            if !seen.insert(status.key.as_str()) {
                return Err(format!("Duplicate default status key: {}", status.key));
            }
        }

        if self.search.default_limit == 0 || self.search.default_limit > 500 {
            return Err("search.default_limit must be between 1 and 500".to_string());
        }

        Ok(())
    }
}
