//! Per-principal entity authorization.

use crate::error::{ServiceError, ServiceResult};
use crate::target::EntityTarget;
use callgate_auth::{PermissionCategory, Principal, PrincipalStore};
use callgate_model::{Entity, Platform};
use callgate_types::Context;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Collects the entities of `platforms` matched by `target`, in platform
/// order and then registration order.
///
/// Explicit ids that no platform owns are dropped here.
pub fn candidate_entities(platforms: &[Arc<Platform>], target: &EntityTarget) -> Vec<Arc<dyn Entity>> {
    let all = platforms.iter().flat_map(|p| p.entities().iter().cloned());
    match target {
        EntityTarget::All => all.collect(),
        EntityTarget::Ids(ids) => {
            let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
            all.filter(|e| wanted.contains(e.entity_id().to_lowercase().as_str()))
                .collect()
        }
    }
}

/// Narrows candidate entities to those a caller may control.
///
/// - no user on the context: trusted, everything passes
/// - unknown user: [`ServiceError::UnknownUser`], nothing is evaluated
/// - target all: allowed subset, possibly empty
/// - explicit target: allowed subset; if nothing survives,
///   [`ServiceError::Unauthorized`] naming the first requested entity
#[derive(Clone)]
pub struct PermissionFilter {
    principals: Arc<dyn PrincipalStore>,
}

impl PermissionFilter {
    pub fn new(principals: Arc<dyn PrincipalStore>) -> Self {
        Self { principals }
    }

    /// Looks up the principal behind `context`.
    ///
    /// Returns `Ok(None)` for trusted contexts.
    pub async fn principal_for(&self, context: &Context) -> ServiceResult<Option<Arc<Principal>>> {
        let Some(user_id) = context.user_id.as_deref() else {
            return Ok(None);
        };
        match self.principals.get_principal(user_id).await {
            Some(principal) => Ok(Some(principal)),
            None => Err(ServiceError::UnknownUser {
                context: context.clone(),
            }),
        }
    }

    /// Looks up the principal and filters `candidates` for it.
    pub async fn authorize(
        &self,
        context: &Context,
        target: &EntityTarget,
        candidates: Vec<Arc<dyn Entity>>,
    ) -> ServiceResult<Vec<Arc<dyn Entity>>> {
        let principal = self.principal_for(context).await?;
        Self::filter(principal.as_deref(), context, target, candidates)
    }

    /// Filters `candidates` for an already looked-up principal.
    ///
    /// For explicit targets, `candidates` must already be restricted to the
    /// requested ids (see [`candidate_entities`]).
    pub fn filter(
        principal: Option<&Principal>,
        context: &Context,
        target: &EntityTarget,
        candidates: Vec<Arc<dyn Entity>>,
    ) -> ServiceResult<Vec<Arc<dyn Entity>>> {
        let Some(principal) = principal else {
            return Ok(candidates);
        };

        let permissions = principal.permissions();
        let (allowed, denied): (Vec<_>, Vec<_>) = candidates.into_iter().partition(|entity| {
            permissions
                .check_entity(entity.entity_id(), PermissionCategory::Control)
                .is_allowed()
        });

        if !denied.is_empty() {
            debug!(
                "User {} may not control {} of the targeted entities",
                principal.id,
                denied.len()
            );
        }

        match target {
            EntityTarget::Ids(ids) if allowed.is_empty() && !denied.is_empty() => {
                let denied_ids: HashSet<String> =
                    denied.iter().map(|e| e.entity_id().to_lowercase()).collect();
                let entity_id = ids
                    .iter()
                    .find(|id| denied_ids.contains(id.as_str()))
                    .cloned()
                    .unwrap_or_default();
                Err(ServiceError::Unauthorized {
                    context: context.clone(),
                    entity_id,
                    permission: PermissionCategory::Control,
                })
            }
            _ => Ok(allowed),
        }
    }
}
