//! Integration Tests Module
//!
//! End-to-end tests of the Taskdeck domain services against real SQLite
//! stores: status lifecycle scenarios, search index consistency, concurrent
//! writers on a file-backed database and the async command surface.

// Shared fixtures
mod common;

// Status lifecycle scenarios through the managers
mod status_lifecycle_test;

// Search index consistency across task mutations
mod search_index_test;

// Concurrent writers on a pooled, file-backed database
mod concurrency_test;

// Command surface with session tokens and error codes
mod commands_test;
