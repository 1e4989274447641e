//! User and chef identity types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique customer identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Create a new random user ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a user ID from a string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for UserId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Unique chef identifier
///
/// Chefs are a distinct actor role: a chef is associated with the
/// subscriptions they cook for, but never owns them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChefId(pub Uuid);

impl ChefId {
    /// Create a new random chef ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a chef ID from a string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for ChefId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ChefId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ChefId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}
