//! Storage Layer
//!
//! Handles all data persistence: SQLite entity store, unit of work, and JSON config.

pub mod config;
pub mod database;
pub mod unit_of_work;

pub use config::*;
pub use database::*;
pub use unit_of_work::*;
