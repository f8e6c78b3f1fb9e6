//! Health Check Commands
//!
//! Commands for checking the health status of backend services.

use crate::models::response::{CommandResponse, HealthResponse};
use crate::services::search_index::SearchIndexSynchronizer;
use crate::state::AppState;

/// Get the health status of all backend services
pub async fn get_health(state: &AppState) -> CommandResponse<HealthResponse> {
    let mut health = HealthResponse::default();

    // Check database health
    health.database = state.is_database_healthy();

    // Check config health
    health.config = state.is_config_healthy();

    // Compare the search index with the task table
    if let Ok(services) = state.services().await {
        let database = services.database.clone();
        health.search_index = tokio::task::spawn_blocking(move || {
            database
                .get_connection()
                .ok()
                .and_then(|conn| SearchIndexSynchronizer::verify(&conn).ok())
                .map(|report| {
                    if !report.is_consistent() {
                        tracing::warn!("[Health] search index drift: {:?}", report);
                    }
                    report.is_consistent()
                })
                .unwrap_or(false)
        })
        .await
        .unwrap_or(false);
    }

    // Overall status
    health.status = if health.database && health.config && health.search_index {
        "healthy".to_string()
    } else {
        "degraded".to_string()
    };

    CommandResponse::ok(health)
}
