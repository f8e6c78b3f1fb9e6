//! Taskdeck Desktop - Rust Backend Library
//!
//! Domain-service core of the Taskdeck project board.
//! It includes:
//! - Async command handlers for the host application
//! - Status lifecycle, project, membership and task managers
//! - Storage layer (SQLite with a full-text index, JSON config)
//! - Data models and utilities

pub mod commands;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod utils;

// Re-export commonly used items from commands
pub use commands::{
    // Init commands
    init_app, get_version,
    // Health commands
    get_health,
    // Status commands
    list_statuses, create_status, update_status, reorder_statuses, delete_status,
    // Project and membership commands
    create_project, get_project, list_projects, upsert_member, remove_member, list_members,
    // Task commands
    create_task, update_task, delete_task, restore_task, purge_task, list_tasks, search_tasks,
    // Audit commands
    list_audit,
};
pub use models::response::*;
pub use models::settings::{AppConfig, SettingsUpdate};
pub use state::{AppState, Services};
pub use utils::error::{AppError, AppResult};
