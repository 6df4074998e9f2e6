//! The in-process service table and its descriptions.

use crate::error::{ConfigError, ServiceError, ServiceResult};
use async_trait::async_trait;
use callgate_types::ServiceCall;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Handles calls to one registered `domain.service`.
#[async_trait]
pub trait ServiceCallHandler: Send + Sync {
    async fn handle(&self, call: ServiceCall) -> ServiceResult<()>;
}

/// Human-readable description of a service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceDescription {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldDescription>,
}

/// Description of one service data field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldDescription {
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
}

/// `domain → service → description`.
pub type ServiceDescriptions = BTreeMap<String, BTreeMap<String, ServiceDescription>>;

/// Parses a domain's description file.
///
/// ```toml
/// [reload]
/// description = "Reload group configuration."
///
/// [set_level]
/// description = "Set log level for components."
/// fields.level = { description = "Default level", example = "debug" }
/// ```
pub fn parse_descriptions(src: &str) -> Result<BTreeMap<String, ServiceDescription>, ConfigError> {
    Ok(toml::from_str(src)?)
}

struct RegisteredService {
    handler: Arc<dyn ServiceCallHandler>,
    description: Option<ServiceDescription>,
}

/// Registered services, keyed by lower-case domain and service.
#[derive(Default)]
pub struct ServiceRegistry {
    services: RwLock<HashMap<String, HashMap<String, RegisteredService>>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces a service handler.
    pub async fn register(
        &self,
        domain: &str,
        service: &str,
        handler: Arc<dyn ServiceCallHandler>,
    ) {
        self.register_with_description(domain, service, handler, None)
            .await;
    }

    /// Registers or replaces a service handler together with its
    /// description.
    pub async fn register_with_description(
        &self,
        domain: &str,
        service: &str,
        handler: Arc<dyn ServiceCallHandler>,
        description: Option<ServiceDescription>,
    ) {
        let (domain, service) = (domain.to_lowercase(), service.to_lowercase());
        info!("Registering service {}.{}", domain, service);
        self.services
            .write()
            .await
            .entry(domain)
            .or_default()
            .insert(
                service,
                RegisteredService {
                    handler,
                    description,
                },
            );
    }

    /// Attaches descriptions to the already registered services of
    /// `domain`. Returns how many were applied.
    pub async fn set_descriptions(
        &self,
        domain: &str,
        descriptions: BTreeMap<String, ServiceDescription>,
    ) -> usize {
        let mut services = self.services.write().await;
        let Some(domain_services) = services.get_mut(&domain.to_lowercase()) else {
            return 0;
        };
        let mut applied = 0;
        for (service, description) in descriptions {
            if let Some(registered) = domain_services.get_mut(&service.to_lowercase()) {
                registered.description = Some(description);
                applied += 1;
            } else {
                debug!("Description for unknown service {}.{}", domain, service);
            }
        }
        applied
    }

    pub async fn remove(&self, domain: &str, service: &str) -> bool {
        let mut services = self.services.write().await;
        let domain = domain.to_lowercase();
        let removed = services
            .get_mut(&domain)
            .and_then(|s| s.remove(&service.to_lowercase()))
            .is_some();
        if services.get(&domain).is_some_and(HashMap::is_empty) {
            services.remove(&domain);
        }
        removed
    }

    pub async fn has_service(&self, domain: &str, service: &str) -> bool {
        self.services
            .read()
            .await
            .get(&domain.to_lowercase())
            .is_some_and(|s| s.contains_key(&service.to_lowercase()))
    }

    /// Runs the handler registered for the call's service and waits for it.
    pub async fn call(&self, call: ServiceCall) -> ServiceResult<()> {
        let handler = self
            .services
            .read()
            .await
            .get(call.domain())
            .and_then(|s| s.get(call.service()))
            .map(|registered| registered.handler.clone());

        let Some(handler) = handler else {
            return Err(ServiceError::ServiceNotFound {
                domain: call.domain().to_string(),
                service: call.service().to_string(),
            });
        };

        debug!("Calling service {}.{}", call.domain(), call.service());
        handler.handle(call).await
    }

    /// Descriptions of every registered service. Services registered
    /// without one get an empty description.
    pub async fn all_descriptions(&self) -> ServiceDescriptions {
        self.services
            .read()
            .await
            .iter()
            .map(|(domain, services)| {
                let described = services
                    .iter()
                    .map(|(name, registered)| {
                        (
                            name.clone(),
                            registered.description.clone().unwrap_or_default(),
                        )
                    })
                    .collect();
                (domain.clone(), described)
            })
            .collect()
    }
}
