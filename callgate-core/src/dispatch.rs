//! Concurrent fan-out to platforms.

use callgate_model::{Entity, Platform, ServiceHandler};
use callgate_types::ServiceCall;
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error};

/// What a dispatch did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Platforms whose handler was launched, in launch order.
    pub launched: Vec<String>,
    /// Platforms whose handler returned an error.
    pub failed: Vec<String>,
}

/// Groups authorized entities by platform and calls each platform once.
pub struct PlatformDispatcher;

impl PlatformDispatcher {
    /// Pairs each platform with its authorized entities.
    ///
    /// Platforms keep their list order and entities their registration
    /// order. Platforms without matches are left out.
    pub fn plan(
        platforms: &[Arc<Platform>],
        authorized: &[Arc<dyn Entity>],
    ) -> Vec<(Arc<Platform>, Vec<Arc<dyn Entity>>)> {
        let ids: HashSet<String> = authorized
            .iter()
            .map(|e| e.entity_id().to_lowercase())
            .collect();

        platforms
            .iter()
            .filter_map(|platform| {
                let entities: Vec<_> = platform
                    .entities()
                    .iter()
                    .filter(|e| ids.contains(&e.entity_id().to_lowercase()))
                    .cloned()
                    .collect();
                (!entities.is_empty()).then(|| (platform.clone(), entities))
            })
            .collect()
    }

    /// Runs `handler` for every planned platform concurrently and waits for
    /// all of them. Handler errors are logged and recorded, never returned.
    pub async fn dispatch(
        platforms: &[Arc<Platform>],
        authorized: &[Arc<dyn Entity>],
        call: &ServiceCall,
        handler: &dyn ServiceHandler,
    ) -> DispatchSummary {
        let plan = Self::plan(platforms, authorized);
        let mut summary = DispatchSummary::default();
        if plan.is_empty() {
            debug!("No entities to call {}.{} on", call.domain(), call.service());
            return summary;
        }

        let results = join_all(plan.iter().map(|(platform, entities)| {
            debug!(
                "Calling {}.{} on platform {} for {} entities",
                call.domain(),
                call.service(),
                platform.name(),
                entities.len()
            );
            handler.call_platform(platform, entities, call)
        }))
        .await;

        for ((platform, _), result) in plan.iter().zip(results) {
            summary.launched.push(platform.name().to_string());
            if let Err(e) = result {
                error!(
                    "Error calling {}.{} on platform {}: {}",
                    call.domain(),
                    call.service(),
                    platform.name(),
                    e
                );
                summary.failed.push(platform.name().to_string());
            }
        }

        summary
    }
}
