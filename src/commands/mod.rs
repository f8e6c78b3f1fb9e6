//! Commands
//!
//! Entry points for the host application. Every command resolves the
//! session token, runs the synchronous manager call on the blocking pool and
//! wraps the outcome in a `CommandResponse`.

pub mod audit;
pub mod health;
pub mod init;
pub mod members;
pub mod projects;
pub mod statuses;
pub mod tasks;

pub use audit::*;
pub use health::*;
pub use init::*;
pub use members::*;
pub use projects::*;
pub use statuses::*;
pub use tasks::*;

use taskdeck_core::Actor;

use crate::models::response::CommandResponse;
use crate::state::{AppState, Services};
use crate::utils::error::{AppError, AppResult};

/// Resolve `token`, then run `f` with the actor on a blocking worker
pub(crate) async fn dispatch<T, F>(state: &AppState, token: &str, f: F) -> CommandResponse<T>
where
    T: Send + 'static,
    F: FnOnce(&Services, &Actor) -> AppResult<T> + Send + 'static,
{
    execute(state, token, f).await.into()
}

async fn execute<T, F>(state: &AppState, token: &str, f: F) -> AppResult<T>
where
    T: Send + 'static,
    F: FnOnce(&Services, &Actor) -> AppResult<T> + Send + 'static,
{
    let actor = state.resolve_actor(token).await?;
    let services = state.services().await?;
    tokio::task::spawn_blocking(move || f(&services, &actor))
        .await
        .map_err(|e| AppError::internal(format!("Worker task failed: {}", e)))?
}
