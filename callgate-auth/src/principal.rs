use crate::permissions::{EntityPermissions, OwnerPermissions};
use std::fmt;
use std::sync::Arc;

/// The authenticated actor a call is authorized for.
#[derive(Clone)]
pub struct Principal {
    pub id: String,
    pub name: String,
    pub is_owner: bool,
    permissions: Arc<dyn EntityPermissions>,
}

impl Principal {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        permissions: Arc<dyn EntityPermissions>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_owner: false,
            permissions,
        }
    }

    /// An owner is allowed everything regardless of policy.
    pub fn owner(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            is_owner: true,
            ..Self::new(id, name, Arc::new(OwnerPermissions))
        }
    }

    pub fn permissions(&self) -> &dyn EntityPermissions {
        self.permissions.as_ref()
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Principal")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("is_owner", &self.is_owner)
            .finish_non_exhaustive()
    }
}
