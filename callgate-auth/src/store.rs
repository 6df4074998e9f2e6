//! Principal lookup.

use crate::error::{AuthError, AuthResult};
use crate::permissions::EntityPermissions;
use crate::policy::{EntityPolicy, PolicyPermissions};
use crate::principal::Principal;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Resolves a user id to a principal.
#[async_trait]
pub trait PrincipalStore: Send + Sync {
    /// Returns `None` when the user does not exist (or no longer exists).
    async fn get_principal(&self, user_id: &str) -> Option<Arc<Principal>>;
}

/// Principal store held in memory.
#[derive(Default)]
pub struct InMemoryPrincipalStore {
    principals: RwLock<HashMap<String, Arc<Principal>>>,
}

impl InMemoryPrincipalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads principals from a TOML policy file.
    pub fn load_from(path: impl AsRef<Path>) -> AuthResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| AuthError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self::from_toml_str(&contents)?;
        info!("Loaded principals from {:?}", path);
        Ok(store)
    }

    /// Parses principals from TOML.
    ///
    /// ```toml
    /// [[users]]
    /// id = "guest"
    /// name = "Guest"
    ///
    /// [users.policy.entities.entity_ids]
    /// "light.kitchen" = true
    ///
    /// [[users]]
    /// id = "admin"
    /// name = "Admin"
    /// owner = true
    /// ```
    pub fn from_toml_str(contents: &str) -> AuthResult<Self> {
        let file: PrincipalFile = toml::from_str(contents)?;
        let mut principals = HashMap::new();
        for user in file.users {
            let principal = user.into_principal();
            if principals.contains_key(&principal.id) {
                return Err(AuthError::DuplicatePrincipal(principal.id));
            }
            principals.insert(principal.id.clone(), Arc::new(principal));
        }
        Ok(Self {
            principals: RwLock::new(principals),
        })
    }

    /// Adds or replaces a principal.
    pub async fn insert(&self, principal: Principal) {
        debug!("Registering principal {}", principal.id);
        self.principals
            .write()
            .await
            .insert(principal.id.clone(), Arc::new(principal));
    }

    /// Removes a principal, returning it if it existed.
    pub async fn remove(&self, user_id: &str) -> Option<Arc<Principal>> {
        self.principals.write().await.remove(user_id)
    }

    pub async fn len(&self) -> usize {
        self.principals.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.principals.read().await.is_empty()
    }
}

#[async_trait]
impl PrincipalStore for InMemoryPrincipalStore {
    async fn get_principal(&self, user_id: &str) -> Option<Arc<Principal>> {
        self.principals.read().await.get(user_id).cloned()
    }
}

/// Raw TOML structure of a principal file.
#[derive(Deserialize)]
struct PrincipalFile {
    #[serde(default)]
    users: Vec<UserEntry>,
}

#[derive(Deserialize)]
struct UserEntry {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    owner: bool,
    #[serde(default)]
    policy: EntityPolicy,
}

impl UserEntry {
    fn into_principal(self) -> Principal {
        let name = self.name.unwrap_or_else(|| self.id.clone());
        if self.owner {
            return Principal::owner(self.id, name);
        }
        let permissions: Arc<dyn EntityPermissions> = Arc::new(PolicyPermissions::new(&self.policy));
        Principal::new(self.id, name, permissions)
    }
}
