use crate::{Entity, PlatformError};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The owning subsystem for a set of entities.
///
/// Entities keep their registration order; service dispatch walks them in
/// that order.
pub struct Platform {
    name: String,
    entities: Vec<Arc<dyn Entity>>,
    index: HashMap<String, usize>,
}

impl Platform {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entities: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Registers an entity. Ids are compared case-insensitively.
    pub fn add_entity(&mut self, entity: Arc<dyn Entity>) -> Result<(), PlatformError> {
        let key = entity.entity_id().to_lowercase();
        if self.index.contains_key(&key) {
            return Err(PlatformError::DuplicateEntity {
                platform: self.name.clone(),
                entity_id: key,
            });
        }
        self.index.insert(key, self.entities.len());
        self.entities.push(entity);
        Ok(())
    }

    /// Builder form of [`Platform::add_entity`].
    pub fn with_entity(mut self, entity: Arc<dyn Entity>) -> Result<Self, PlatformError> {
        self.add_entity(entity)?;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Entities in registration order.
    pub fn entities(&self) -> &[Arc<dyn Entity>] {
        &self.entities
    }

    pub fn get(&self, entity_id: &str) -> Option<&Arc<dyn Entity>> {
        self.index
            .get(&entity_id.to_lowercase())
            .map(|&i| &self.entities[i])
    }

    pub fn contains(&self, entity_id: &str) -> bool {
        self.index.contains_key(&entity_id.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl fmt::Debug for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Platform")
            .field("name", &self.name)
            .field("entities", &self.entities)
            .finish()
    }
}
