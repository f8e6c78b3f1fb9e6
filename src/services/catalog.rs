//! Domain Catalog
//!
//! Immutable lookup table built once at startup from configuration and
//! shared by `Arc`: the statuses seeded into new projects and the keys that
//! key derivation must never produce.

use std::collections::HashSet;

use crate::models::settings::{AppConfig, DefaultStatus};

#[derive(Debug, Clone)]
pub struct DomainCatalog {
    default_statuses: Vec<DefaultStatus>,
    reserved_keys: HashSet<String>,
}

impl DomainCatalog {
    pub fn new(default_statuses: Vec<DefaultStatus>) -> Self {
        let reserved_keys = default_statuses.iter().map(|s| s.key.clone()).collect();
        Self {
            default_statuses,
            reserved_keys,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.default_statuses.clone())
    }

    /// Statuses seeded into a new project, in board order
    pub fn default_statuses(&self) -> &[DefaultStatus] {
        &self.default_statuses
    }

    /// Whether `key` belongs to a default status
    pub fn is_reserved(&self, key: &str) -> bool {
        self.reserved_keys.contains(key)
    }
}

impl Default for DomainCatalog {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}
