//! Error types for service calls.

use crate::template::TemplateError;
use callgate_auth::PermissionCategory;
use callgate_model::HandlerError;
use callgate_types::Context;
use thiserror::Error;

/// Result type for service call operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced to the caller of a service call.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The context names a user that does not exist.
    #[error("unknown user: {}", .context.user_id.as_deref().unwrap_or_default())]
    UnknownUser { context: Context },

    /// The user may not act on any of the explicitly targeted entities.
    #[error(
        "unauthorized: user {} lacks {permission} permission on {entity_id}",
        .context.user_id.as_deref().unwrap_or_default()
    )]
    Unauthorized {
        context: Context,
        entity_id: String,
        permission: PermissionCategory,
    },

    /// No handler is registered for `domain.service`.
    #[error("service not found: {domain}.{service}")]
    ServiceNotFound { domain: String, service: String },

    /// A registered service handler failed.
    #[error("service handler failed: {0}")]
    Handler(#[from] HandlerError),
}

impl ServiceError {
    /// Returns true for the authorization failures that must never be
    /// swallowed.
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::UnknownUser { .. } | Self::Unauthorized { .. })
    }

    /// Context of the rejected call, for authorization failures.
    pub fn context(&self) -> Option<&Context> {
        match self {
            Self::UnknownUser { context } | Self::Unauthorized { context, .. } => Some(context),
            _ => None,
        }
    }
}

/// A call configuration that does not satisfy the service schema.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no service configuration given")]
    Missing,

    #[error("service configuration must be a mapping")]
    NotAMapping,

    #[error("must contain exactly one of service, service_template")]
    ServiceKey,

    #[error("invalid service: {0}")]
    InvalidService(String),

    #[error("invalid entity id: {0}")]
    InvalidEntityId(String),

    #[error("invalid entity_id value: {0}")]
    InvalidTarget(String),

    #[error("{0}")]
    Structure(#[from] serde_json::Error),

    #[error("invalid service descriptions: {0}")]
    Descriptions(#[from] toml::de::Error),
}

/// Template rendering of a call configuration failed.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Error rendering service name template: {0}")]
    ServiceTemplate(#[source] TemplateError),

    #[error("Template rendered invalid service: {0}")]
    InvalidService(String),

    #[error("Error rendering data template: {0}")]
    DataTemplate(#[source] TemplateError),
}

/// Any reason a configuration could not become a service call.
#[derive(Debug, Error)]
pub enum PrepareError {
    #[error("Invalid config for calling service: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Render(#[from] RenderError),
}
