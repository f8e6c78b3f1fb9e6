//! Data Models
//!
//! Contains all data structures used throughout the application. Models are
//! plain DTOs and validated inputs; they never hold store handles.

pub mod project;
pub mod response;
pub mod settings;
pub mod task;
pub mod task_status;

pub use project::*;
pub use response::*;
pub use settings::*;
pub use task::*;
pub use task_status::*;
