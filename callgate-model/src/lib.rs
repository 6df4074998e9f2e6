//! Entity and platform model for callgate.
//!
//! Defines what service dispatch operates on:
//! - [`Entity`]: the capability set of an addressable unit (`entity_id`,
//!   `available`, `should_poll`, `update_state`)
//! - [`Platform`]: the owning subsystem of an ordered set of entities
//! - [`ServiceHandler`]: what a platform runs when a service targets some of
//!   its entities
//!
//! [`SimpleEntity`] is a ready-made entity for integrations that only need
//! availability and polling flags.

mod entity;
mod error;
mod handler;
mod platform;

pub use entity::{Entity, SimpleEntity};
pub use error::{HandlerError, PlatformError};
pub use handler::ServiceHandler;
pub use platform::Platform;
