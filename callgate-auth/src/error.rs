//! Error types for the auth layer.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for auth operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// Errors that can occur while loading principals and policies.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The policy file could not be read.
    #[error("failed to read policy file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The policy file is not valid TOML for the expected shape.
    #[error("failed to parse policy: {0}")]
    Parse(#[from] toml::de::Error),

    /// Two principals share an id.
    #[error("duplicate principal id: {0}")]
    DuplicatePrincipal(String),
}
