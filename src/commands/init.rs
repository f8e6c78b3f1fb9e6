//! Initialization Commands
//!
//! Commands for application initialization and setup.

use serde::{Deserialize, Serialize};

use crate::models::response::CommandResponse;
use crate::state::AppState;

/// Result of application initialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitResult {
    /// Success message
    pub message: String,
    /// Number of projects in the store
    pub project_count: usize,
}

/// Initialize the application on startup
pub async fn init_app(state: &AppState) -> CommandResponse<InitResult> {
    if let Err(e) = state.initialize().await {
        return CommandResponse::err(e.code(), e.to_string());
    }

    let project_count = match state.services().await {
        Ok(services) => tokio::task::spawn_blocking(move || {
            services
                .database
                .get_connection()
                .ok()
                .and_then(|conn| {
                    conn.query_row("SELECT COUNT(*) FROM project", [], |row| row.get::<_, i64>(0))
                        .ok()
                })
                .unwrap_or(0) as usize
        })
        .await
        .unwrap_or(0),
        Err(e) => return CommandResponse::err(e.code(), e.to_string()),
    };

    CommandResponse::ok(InitResult {
        message: "Application initialized successfully".to_string(),
        project_count,
    })
}

/// Get the application version
pub fn get_version() -> CommandResponse<String> {
    CommandResponse::ok(env!("CARGO_PKG_VERSION").to_string())
}
