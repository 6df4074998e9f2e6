use serde::{Deserialize, Serialize};
use std::fmt;

/// What a principal wants to do with an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionCategory {
    Read,
    Control,
    Edit,
}

impl fmt::Display for PermissionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Read => "read",
            Self::Control => "control",
            Self::Edit => "edit",
        };
        f.write_str(s)
    }
}

/// Outcome of a permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Self::Allow
    }
}

impl From<bool> for Decision {
    fn from(allowed: bool) -> Self {
        if allowed { Self::Allow } else { Self::Deny }
    }
}

/// Per-entity permission check for one principal.
pub trait EntityPermissions: Send + Sync {
    fn check_entity(&self, entity_id: &str, category: PermissionCategory) -> Decision;
}

/// Allows everything. Used for owners and internal principals.
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnerPermissions;

impl EntityPermissions for OwnerPermissions {
    fn check_entity(&self, _entity_id: &str, _category: PermissionCategory) -> Decision {
        Decision::Allow
    }
}
