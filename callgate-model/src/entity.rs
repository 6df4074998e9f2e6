use crate::HandlerError;
use async_trait::async_trait;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// An addressable unit owned by exactly one platform.
///
/// Entity ids are case-insensitive; implementations should return the
/// lower-case form.
#[async_trait]
pub trait Entity: Send + Sync {
    fn entity_id(&self) -> &str;

    /// Unavailable entities are skipped by service dispatch.
    fn available(&self) -> bool {
        true
    }

    /// Polled entities get `update_state` after a service touched them.
    fn should_poll(&self) -> bool {
        false
    }

    /// Refreshes the entity's state from its source.
    async fn update_state(&self) -> Result<(), HandlerError> {
        Ok(())
    }
}

impl fmt::Debug for dyn Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("entity_id", &self.entity_id())
            .field("available", &self.available())
            .field("should_poll", &self.should_poll())
            .finish()
    }
}

/// A flag-only entity that counts its state updates.
#[derive(Debug)]
pub struct SimpleEntity {
    entity_id: String,
    available: AtomicBool,
    should_poll: bool,
    updates: AtomicUsize,
}

impl SimpleEntity {
    /// Creates an available, non-polled entity. The id is lower-cased.
    pub fn new(entity_id: impl AsRef<str>) -> Self {
        Self {
            entity_id: entity_id.as_ref().to_lowercase(),
            available: AtomicBool::new(true),
            should_poll: false,
            updates: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn polled(mut self) -> Self {
        self.should_poll = true;
        self
    }

    #[must_use]
    pub fn unavailable(self) -> Self {
        self.set_available(false);
        self
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of completed `update_state` runs.
    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Entity for SimpleEntity {
    fn entity_id(&self) -> &str {
        &self.entity_id
    }

    fn available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn should_poll(&self) -> bool {
        self.should_poll
    }

    async fn update_state(&self) -> Result<(), HandlerError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
