//! The service engine facade.

use crate::component::EntityComponent;
use crate::config::EngineConfig;
use crate::dispatch::DispatchSummary;
use crate::entity_service::EntityServiceCaller;
use crate::error::{ConfigError, PrepareError, ServiceError, ServiceResult};
use crate::registry::{ServiceDescriptions, ServiceRegistry};
use crate::render::ConfigRenderer;
use crate::schema::ServiceCallConfig;
use crate::target::{GroupExpander, GroupRegistry};
use crate::template::{JinjaTemplateEngine, TemplateEngine};
use callgate_auth::{InMemoryPrincipalStore, PrincipalStore};
use callgate_model::{Platform, ServiceHandler};
use callgate_types::{Context, ServiceCall, Variables};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Per-call options for [`ServiceEngine::call_from_config`].
#[derive(Debug, Clone)]
pub struct CallOptions {
    /// Variables made available to templates.
    pub variables: Option<Variables>,
    /// Validate the configuration against the service schema first.
    pub validate_config: bool,
    /// Context to run the call under. Trusted when absent.
    pub context: Option<Context>,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            variables: None,
            validate_config: true,
            context: None,
        }
    }
}

impl CallOptions {
    pub fn with_variables(mut self, variables: Variables) -> Self {
        self.variables = Some(variables);
        self
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }

    pub fn without_validation(mut self) -> Self {
        self.validate_config = false;
        self
    }
}

/// Builder for [`ServiceEngine`].
#[derive(Default)]
pub struct ServiceEngineBuilder {
    config: EngineConfig,
    principals: Option<Arc<dyn PrincipalStore>>,
    groups: Option<Arc<dyn GroupExpander>>,
    templates: Option<Arc<dyn TemplateEngine>>,
}

impl ServiceEngineBuilder {
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn principals(mut self, principals: Arc<dyn PrincipalStore>) -> Self {
        self.principals = Some(principals);
        self
    }

    pub fn groups(mut self, groups: Arc<dyn GroupExpander>) -> Self {
        self.groups = Some(groups);
        self
    }

    pub fn templates(mut self, templates: Arc<dyn TemplateEngine>) -> Self {
        self.templates = Some(templates);
        self
    }

    pub fn build(self) -> ServiceEngine {
        let config = self.config;
        let principals = self
            .principals
            .unwrap_or_else(|| Arc::new(InMemoryPrincipalStore::new()));
        let groups = self
            .groups
            .unwrap_or_else(|| Arc::new(GroupRegistry::with_domain(config.group_domain.clone())));
        let templates = self
            .templates
            .unwrap_or_else(|| Arc::new(JinjaTemplateEngine::new()));

        ServiceEngine {
            registry: Arc::new(ServiceRegistry::new()),
            renderer: ConfigRenderer::new(templates),
            entity_services: Arc::new(EntityServiceCaller::new(principals, groups, &config)),
            config,
        }
    }
}

/// Resolves call configurations and runs them against registered services.
pub struct ServiceEngine {
    config: EngineConfig,
    registry: Arc<ServiceRegistry>,
    renderer: ConfigRenderer,
    entity_services: Arc<EntityServiceCaller>,
}

impl ServiceEngine {
    pub fn builder() -> ServiceEngineBuilder {
        ServiceEngineBuilder::default()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ServiceRegistry> {
        &self.registry
    }

    pub fn entity_services(&self) -> &Arc<EntityServiceCaller> {
        &self.entity_services
    }

    /// Creates an empty component for `domain` sharing this engine's
    /// principals and groups.
    pub fn entity_component(&self, domain: &str) -> Arc<EntityComponent> {
        Arc::new(EntityComponent::new(domain, self.entity_services.clone()))
    }

    /// Validates and renders `config` into a service call without running
    /// it. `config` is not modified.
    pub fn prepare_call(
        &self,
        config: &Value,
        options: &CallOptions,
    ) -> Result<ServiceCall, PrepareError> {
        let parsed = if options.validate_config {
            ServiceCallConfig::validate(config)?
        } else {
            ServiceCallConfig::parse(config)?
        };

        let empty = Variables::new();
        let variables = options.variables.as_ref().unwrap_or(&empty);
        let context = options.context.clone().unwrap_or_default();

        Ok(self.renderer.render_call(&parsed, context, variables)?)
    }

    /// Runs the service call described by `config` and waits for it.
    ///
    /// Malformed configurations, template failures, unknown services and
    /// handler failures are logged and reported as success. Only
    /// authorization failures are returned.
    pub async fn call_from_config(
        &self,
        config: Option<&Value>,
        options: CallOptions,
    ) -> ServiceResult<()> {
        let Some(config) = config.filter(|c| !is_empty_config(c)) else {
            error!("{}", PrepareError::Config(ConfigError::Missing));
            return Ok(());
        };

        let call = match self.prepare_call(config, &options) {
            Ok(call) => call,
            Err(e) => {
                error!("{}", e);
                return Ok(());
            }
        };

        debug!("Calling {}.{} from config", call.domain(), call.service());
        match self.registry.call(call).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_authorization() => Err(e),
            Err(ServiceError::ServiceNotFound { domain, service }) => {
                warn!("Unable to find service {}.{}", domain, service);
                Ok(())
            }
            Err(e) => {
                error!("Error executing service: {}", e);
                Ok(())
            }
        }
    }

    /// See [`EntityServiceCaller::entity_service_call`].
    pub async fn entity_service_call(
        &self,
        platforms: &[Arc<Platform>],
        handler: &dyn ServiceHandler,
        call: &ServiceCall,
    ) -> ServiceResult<DispatchSummary> {
        self.entity_services
            .entity_service_call(platforms, handler, call)
            .await
    }

    /// See [`EntityServiceCaller::extract_entity_ids`].
    pub fn extract_entity_ids(&self, call: &ServiceCall, expand_groups: bool) -> Vec<String> {
        self.entity_services.extract_entity_ids(call, expand_groups)
    }

    /// Descriptions of every registered service.
    pub async fn get_all_descriptions(&self) -> ServiceDescriptions {
        self.registry.all_descriptions().await
    }
}

fn is_empty_config(config: &Value) -> bool {
    match config {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
