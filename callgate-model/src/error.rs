//! Error types for entities, platforms and handlers.

use thiserror::Error;

/// Errors raised while a platform handles a service call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    /// The handler ran and failed.
    #[error("handler failed: {0}")]
    Failed(String),

    /// The entity could not be reached.
    #[error("entity unavailable: {0}")]
    Unavailable(String),

    /// The call data was not usable by this handler.
    #[error("invalid service data: {0}")]
    InvalidData(String),
}

/// Errors raised while building a platform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    #[error("entity {entity_id} already registered on platform {platform}")]
    DuplicateEntity { platform: String, entity_id: String },
}
