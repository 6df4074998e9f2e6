use crate::config::EngineConfig;
use crate::dispatch::{DispatchSummary, PlatformDispatcher};
use crate::error::ServiceResult;
use crate::permission::{PermissionFilter, candidate_entities};
use crate::target::{GroupExpander, TargetResolver};
use callgate_auth::PrincipalStore;
use callgate_model::{Platform, ServiceHandler};
use callgate_types::ServiceCall;
use std::sync::Arc;

/// Runs entity-targeted service calls: authorize, resolve, dispatch.
#[derive(Clone)]
pub struct EntityServiceCaller {
    permissions: PermissionFilter,
    resolver: TargetResolver,
    expand_groups: bool,
}

impl EntityServiceCaller {
    pub fn new(
        principals: Arc<dyn PrincipalStore>,
        groups: Arc<dyn GroupExpander>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            permissions: PermissionFilter::new(principals),
            resolver: TargetResolver::new(groups, config),
            expand_groups: config.expand_groups,
        }
    }

    pub fn resolver(&self) -> &TargetResolver {
        &self.resolver
    }

    /// Returns the explicit entity ids a call targets. Calls targeting all
    /// entities yield an empty list.
    pub fn extract_entity_ids(&self, call: &ServiceCall, expand_groups: bool) -> Vec<String> {
        self.resolver
            .resolve(call.target(), expand_groups)
            .target
            .ids()
            .to_vec()
    }

    /// Calls `handler` on every entity of `platforms` that `call` targets
    /// and its caller may control.
    ///
    /// The principal is looked up before anything else, so an unknown user
    /// fails without resolving or dispatching. Handler failures are
    /// reported in the summary, not as errors.
    pub async fn entity_service_call(
        &self,
        platforms: &[Arc<Platform>],
        handler: &dyn ServiceHandler,
        call: &ServiceCall,
    ) -> ServiceResult<DispatchSummary> {
        let principal = self.permissions.principal_for(call.context()).await?;

        let resolution = self.resolver.resolve_call(call, self.expand_groups);
        let candidates = candidate_entities(platforms, &resolution.target);
        let authorized = PermissionFilter::filter(
            principal.as_deref(),
            call.context(),
            &resolution.target,
            candidates,
        )?;

        Ok(PlatformDispatcher::dispatch(platforms, &authorized, call, handler).await)
    }
}
