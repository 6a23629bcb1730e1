//! Acting user and role

use crate::ids::UserId;
use serde::{Deserialize, Serialize};

/// Role of an acting user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// A user performing an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
}

impl Actor {
    /// Regular user
    #[inline]
    #[must_use]
    pub fn user(id: UserId) -> Self {
        Self { id, role: Role::User }
    }

    /// Administrator
    #[inline]
    #[must_use]
    pub fn admin(id: UserId) -> Self {
        Self { id, role: Role::Admin }
    }

    /// Whether the actor is an administrator
    #[inline]
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
