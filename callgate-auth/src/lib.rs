//! Principals and entity permissions for callgate.
//!
//! A call made on behalf of a user is authorized per entity:
//!
//! ```text
//! Context.user_id ──► PrincipalStore::get_principal ──► Principal
//!                                                          │
//!                       EntityPermissions::check_entity ◄──┘
//! ```
//!
//! Two permission backends ship with the crate:
//! - [`OwnerPermissions`]: always allows (owners, admins)
//! - [`PolicyPermissions`]: evaluates an [`EntityPolicy`] of explicit
//!   entity ids, domains and a catch-all
//!
//! Principals can be loaded from a TOML policy file via
//! [`InMemoryPrincipalStore::load_from`].

mod error;
mod permissions;
mod policy;
mod principal;
mod store;

pub use error::{AuthError, AuthResult};
pub use permissions::{Decision, EntityPermissions, OwnerPermissions, PermissionCategory};
pub use policy::{CategoryPolicy, EntitiesPolicy, EntityPolicy, PolicyPermissions, SubPolicy};
pub use principal::Principal;
pub use store::{InMemoryPrincipalStore, PrincipalStore};
