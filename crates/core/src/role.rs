//! Project Roles
//!
//! Membership roles are totally ordered by weight: view < edit < admin.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Role an actor holds within a single project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    View,
    Edit,
    Admin,
}

impl Role {
    /// All roles, lowest weight first
    pub const ALL: [Role; 3] = [Role::View, Role::Edit, Role::Admin];

    /// Numeric weight used for minimum-role checks
    pub const fn weight(self) -> u8 {
        match self {
            Role::View => 1,
            Role::Edit => 2,
            Role::Admin => 3,
        }
    }

    /// True when this role is at least as strong as `minimum`
    pub fn satisfies(self, minimum: Role) -> bool {
        self.weight() >= minimum.weight()
    }

    /// Convert to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::View => "view",
            Role::Edit => "edit",
            Role::Admin => "admin",
        }
    }

    /// Parse from database string representation
    pub fn from_str(s: &str) -> CoreResult<Self> {
        match s {
            "view" => Ok(Role::View),
            "edit" => Ok(Role::Edit),
            "admin" => Ok(Role::Admin),
            _ => Err(CoreError::validation(format!("Invalid role: {}", s))),
        }
    }
}

impl PartialOrd for Role {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Role {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.weight().cmp(&other.weight())
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
