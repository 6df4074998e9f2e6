use crate::{Entity, HandlerError, Platform};
use async_trait::async_trait;
use callgate_types::ServiceCall;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn};

/// What a platform runs when a service call targets some of its entities.
///
/// Most handlers only implement [`ServiceHandler::call_entity`]; the default
/// [`ServiceHandler::call_platform`] walks the platform's matched entities:
/// - unavailable entities are skipped
/// - `call_entity` runs for each remaining entity, in order
/// - polled entities get `update_state` afterwards, concurrently
///
/// Override `call_platform` when a platform can serve the whole batch at once.
#[async_trait]
pub trait ServiceHandler: Send + Sync {
    /// Applies the call to a single entity.
    async fn call_entity(
        &self,
        entity: &Arc<dyn Entity>,
        call: &ServiceCall,
    ) -> Result<(), HandlerError>;

    /// Applies the call to the matched entities of one platform.
    async fn call_platform(
        &self,
        platform: &Platform,
        entities: &[Arc<dyn Entity>],
        call: &ServiceCall,
    ) -> Result<(), HandlerError> {
        let mut polled = Vec::new();

        for entity in entities {
            if !entity.available() {
                debug!(
                    "Skipping unavailable entity {} on platform {}",
                    entity.entity_id(),
                    platform.name()
                );
                continue;
            }

            self.call_entity(entity, call).await?;

            if entity.should_poll() {
                polled.push(entity);
            }
        }

        let results = join_all(polled.iter().map(|entity| entity.update_state())).await;
        for (entity, result) in polled.iter().zip(results) {
            if let Err(e) = result {
                warn!("Failed to update state of {}: {}", entity.entity_id(), e);
            }
        }

        Ok(())
    }
}
