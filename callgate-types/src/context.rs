//! Call context: who is calling, and which call caused this one.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a call context.
/// Uses UUID v7 so contexts sort by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextId(Uuid);

impl ContextId {
    /// Creates a new context ID with the current timestamp.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a context ID from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ContextId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Identifies the principal behind a call and correlates related calls.
///
/// A context without a `user_id` belongs to a trusted internal caller and
/// is exempt from entity authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    pub id: ContextId,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub parent_id: Option<ContextId>,
}

impl Context {
    /// Creates a trusted context (no user).
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: ContextId::new(),
            user_id: None,
            parent_id: None,
        }
    }

    /// Creates a context acting on behalf of `user_id`.
    #[must_use]
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Self::new()
        }
    }

    /// Creates a fresh context caused by this one, keeping the same user.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            id: ContextId::new(),
            user_id: self.user_id.clone(),
            parent_id: Some(self.id),
        }
    }

    /// Returns true if no user is attached.
    pub fn is_trusted(&self) -> bool {
        self.user_id.is_none()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
