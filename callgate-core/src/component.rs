//! A domain's entities, grouped by platform, exposed as services.

use crate::dispatch::DispatchSummary;
use crate::entity_service::EntityServiceCaller;
use crate::error::ServiceResult;
use crate::registry::{ServiceCallHandler, ServiceDescription, ServiceRegistry};
use async_trait::async_trait;
use callgate_model::{Platform, ServiceHandler};
use callgate_types::ServiceCall;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Owns the platforms of one domain and runs entity services over them.
pub struct EntityComponent {
    domain: String,
    platforms: RwLock<Vec<Arc<Platform>>>,
    caller: Arc<EntityServiceCaller>,
}

impl EntityComponent {
    pub fn new(domain: impl AsRef<str>, caller: Arc<EntityServiceCaller>) -> Self {
        Self {
            domain: domain.as_ref().to_lowercase(),
            platforms: RwLock::new(Vec::new()),
            caller,
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Appends a platform. Platforms are dispatched in the order added.
    pub async fn add_platform(&self, platform: Platform) -> Arc<Platform> {
        let platform = Arc::new(platform);
        debug!(
            "Adding platform {} with {} entities to {}",
            platform.name(),
            platform.len(),
            self.domain
        );
        self.platforms.write().await.push(platform.clone());
        platform
    }

    /// Snapshot of the current platforms.
    pub async fn platforms(&self) -> Vec<Arc<Platform>> {
        self.platforms.read().await.clone()
    }

    /// Runs `handler` for `call` over the current platforms.
    pub async fn call(
        &self,
        handler: &dyn ServiceHandler,
        call: &ServiceCall,
    ) -> ServiceResult<DispatchSummary> {
        let platforms = self.platforms().await;
        self.caller
            .entity_service_call(&platforms, handler, call)
            .await
    }

    /// Registers `<domain>.<service>` so that calls to it run `handler` on
    /// the targeted entities of this component.
    pub async fn register_entity_service(
        self: &Arc<Self>,
        registry: &ServiceRegistry,
        service: &str,
        handler: Arc<dyn ServiceHandler>,
        description: Option<ServiceDescription>,
    ) {
        let adapter = Arc::new(EntityServiceAdapter {
            component: self.clone(),
            handler,
        });
        registry
            .register_with_description(&self.domain, service, adapter, description)
            .await;
    }
}

struct EntityServiceAdapter {
    component: Arc<EntityComponent>,
    handler: Arc<dyn ServiceHandler>,
}

#[async_trait]
impl ServiceCallHandler for EntityServiceAdapter {
    async fn handle(&self, call: ServiceCall) -> ServiceResult<()> {
        let summary = self.component.call(self.handler.as_ref(), &call).await?;
        debug!(
            "{}.{} ran on {} platforms, {} failed",
            call.domain(),
            call.service(),
            summary.launched.len(),
            summary.failed.len()
        );
        Ok(())
    }
}
