//! Actors and Session Resolution
//!
//! An `Actor` is the authenticated identity behind an inbound call. Tokens are
//! resolved by an external collaborator reached only through `AuthGuard`; this
//! crate never inspects token contents.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Global (not project-scoped) capability of an actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemRole {
    /// Bypasses project membership checks and may create projects
    Admin,
    User,
}

/// Authenticated identity performing an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: String,
    #[serde(default)]
    pub roles: Vec<SystemRole>,
}

impl Actor {
    /// A regular user without global capabilities
    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            roles: vec![SystemRole::User],
        }
    }

    /// A system administrator
    pub fn system_admin(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            roles: vec![SystemRole::Admin],
        }
    }

    pub fn is_system_admin(&self) -> bool {
        self.roles.contains(&SystemRole::Admin)
    }
}

/// Capability that turns an opaque session token into an actor.
#[async_trait]
pub trait AuthGuard: Send + Sync {
    /// Resolve `token`, failing with `CoreError::Unauthenticated` when it is
    /// unknown or expired.
    async fn resolve(&self, token: &str) -> CoreResult<Actor>;
}

/// In-process guard backed by a fixed token table.
#[derive(Debug, Default)]
pub struct StaticTokenGuard {
    sessions: RwLock<HashMap<String, Actor>>,
}

impl StaticTokenGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the actor behind `token`
    pub fn insert(&self, token: impl Into<String>, actor: Actor) {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.into(), actor);
    }

    /// Revoke a token; returns whether it was present
    pub fn revoke(&self, token: &str) -> bool {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token)
            .is_some()
    }

    /// Builder-style variant of `insert`
    pub fn with_session(self, token: impl Into<String>, actor: Actor) -> Self {
        self.insert(token, actor);
        self
    }
}

#[async_trait]
impl AuthGuard for StaticTokenGuard {
    async fn resolve(&self, token: &str) -> CoreResult<Actor> {
        if token.trim().is_empty() {
            return Err(CoreError::unauthenticated("missing session token"));
        }
        // A panicking writer cannot leave the map half-updated
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        sessions
            .get(token)
            .cloned()
            .ok_or_else(|| CoreError::unauthenticated("unknown or expired session token"))
    }
}
