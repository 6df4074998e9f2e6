//! Core type definitions for callgate.
//!
//! This crate defines the plain data types every other callgate crate
//! exchanges:
//! - [`Context`] and [`ContextId`] (UUID v7), identifying the caller of a call
//! - [`ServiceCall`], the immutable request handed to service handlers
//! - [`ServiceName`] and the entity id helpers that validate `domain.object`
//!   identifiers
//!
//! Nothing here performs I/O or authorization; those live in `callgate-auth`
//! and `callgate-core`.

mod call;
mod context;
mod ids;

pub use call::{ServiceCall, ServiceCallBuilder, Variables, ATTR_ENTITY_ID, ENTITY_MATCH_ALL};
pub use context::{Context, ContextId};
pub use ids::{split_entity_id, valid_entity_id, ServiceName};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("invalid entity id: {0}")]
    InvalidEntityId(String),

    #[error("invalid service: {0}")]
    InvalidService(String),
}
