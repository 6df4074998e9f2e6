//! Service-call resolution and authorization engine.
//!
//! Turns "invoke `domain.service` with these parameters on behalf of this
//! caller" into concurrent calls on the platforms owning the targeted
//! entities.
//!
//! # Architecture
//!
//! ```text
//! ServiceEngine::call_from_config
//!     │  validate (schema) ─► render (ConfigRenderer) ─► ServiceRegistry::call
//!     ▼
//! EntityComponent service ─► EntityServiceCaller::entity_service_call
//!     │  principal lookup ─► TargetResolver ─► PermissionFilter
//!     ▼
//! PlatformDispatcher::dispatch ─► ServiceHandler::call_platform (join all)
//! ```
//!
//! ## Failure policy
//!
//! - Malformed configuration and template failures are logged and swallowed.
//! - [`ServiceError::UnknownUser`] and [`ServiceError::Unauthorized`] are
//!   always returned to the caller.
//! - A failing platform handler is logged and never affects its siblings.
//!
//! # Example
//!
//! ```
//! use callgate_core::ServiceEngine;
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let engine = ServiceEngine::builder().build();
//! let config = json!({"service": "light.turn_on", "entity_id": "light.kitchen"});
//!
//! // Nothing is registered yet: the call is logged and dropped.
//! engine.call_from_config(Some(&config), Default::default()).await.unwrap();
//! # });
//! ```

mod component;
mod config;
mod dispatch;
mod engine;
mod entity_service;
mod error;
mod permission;
mod registry;
mod render;
mod schema;
mod target;
mod template;

pub use component::EntityComponent;
pub use config::EngineConfig;
pub use dispatch::{DispatchSummary, PlatformDispatcher};
pub use engine::{CallOptions, ServiceEngine, ServiceEngineBuilder};
pub use entity_service::EntityServiceCaller;
pub use error::{ConfigError, PrepareError, RenderError, ServiceError, ServiceResult};
pub use permission::{PermissionFilter, candidate_entities};
pub use registry::{
    FieldDescription, ServiceCallHandler, ServiceDescription, ServiceDescriptions,
    ServiceRegistry, parse_descriptions,
};
pub use render::ConfigRenderer;
pub use schema::{ServiceCallConfig, ServiceSource};
pub use target::{EntityTarget, GroupExpander, GroupRegistry, TargetResolution, TargetResolver};
pub use template::{JinjaTemplateEngine, TemplateEngine, TemplateError, is_template};
