//! Setup file loading and the console service handler for the `callgate`
//! binary.
//!
//! A setup file declares who may call what, and which entities exist:
//!
//! ```toml
//! [engine]
//! expand_groups = true
//!
//! [[users]]
//! id = "guest"
//! [users.policy.entities.entity_ids]
//! "light.kitchen" = true
//!
//! [groups]
//! downstairs = ["light.kitchen", "light.hall"]
//!
//! [[platforms]]
//! name = "hue"
//! domain = "light"
//! entities = ["light.kitchen", { id = "light.hall", poll = true }]
//!
//! [services]
//! light = ["turn_on", "turn_off"]
//!
//! [descriptions.light.turn_on]
//! description = "Turn one or more lights on."
//! ```

use anyhow::{Context, Result};
use async_trait::async_trait;
use callgate_auth::InMemoryPrincipalStore;
use callgate_core::{EngineConfig, EntityComponent, GroupRegistry, ServiceDescription, ServiceEngine};
use callgate_model::{Entity, HandlerError, Platform, ServiceHandler, SimpleEntity};
use callgate_types::ServiceCall;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::info;

/// The parsed setup file, minus users.
#[derive(Debug, Default, Deserialize)]
pub struct Setup {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub groups: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub platforms: Vec<PlatformSetup>,
    #[serde(default)]
    pub services: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub descriptions: BTreeMap<String, BTreeMap<String, ServiceDescription>>,
}

#[derive(Debug, Deserialize)]
pub struct PlatformSetup {
    pub name: String,
    pub domain: String,
    #[serde(default)]
    pub entities: Vec<EntitySetup>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum EntitySetup {
    Id(String),
    Detailed {
        id: String,
        #[serde(default)]
        poll: bool,
        #[serde(default = "default_available")]
        available: bool,
    },
}

fn default_available() -> bool {
    true
}

impl EntitySetup {
    fn build(&self) -> SimpleEntity {
        match self {
            Self::Id(id) => SimpleEntity::new(id),
            Self::Detailed {
                id,
                poll,
                available,
            } => {
                let entity = if *poll {
                    SimpleEntity::new(id).polled()
                } else {
                    SimpleEntity::new(id)
                };
                entity.set_available(*available);
                entity
            }
        }
    }
}

/// A fully wired engine plus the handler every entity service runs.
pub struct Home {
    pub engine: ServiceEngine,
    pub components: BTreeMap<String, Arc<EntityComponent>>,
    pub handler: Arc<ConsoleHandler>,
}

impl Home {
    pub async fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read setup file {}", path.display()))?;
        Self::from_toml_str(&contents)
            .await
            .with_context(|| format!("Invalid setup file {}", path.display()))
    }

    pub async fn from_toml_str(contents: &str) -> Result<Self> {
        let setup: Setup = toml::from_str(contents)?;
        let principals = InMemoryPrincipalStore::from_toml_str(contents)?;

        let groups = Arc::new(GroupRegistry::with_domain(setup.engine.group_domain.clone()));
        for (object_id, members) in &setup.groups {
            groups.create_group(object_id, members);
        }

        let engine = ServiceEngine::builder()
            .config(setup.engine)
            .principals(Arc::new(principals))
            .groups(groups)
            .build();

        let mut components: BTreeMap<String, Arc<EntityComponent>> = BTreeMap::new();
        for platform_setup in &setup.platforms {
            let component = components
                .entry(platform_setup.domain.to_lowercase())
                .or_insert_with(|| engine.entity_component(&platform_setup.domain));

            let mut platform = Platform::new(&platform_setup.name);
            for entity in &platform_setup.entities {
                platform.add_entity(Arc::new(entity.build()))?;
            }
            component.add_platform(platform).await;
        }

        let handler = Arc::new(ConsoleHandler::default());
        for (domain, services) in &setup.services {
            let component = components
                .entry(domain.to_lowercase())
                .or_insert_with(|| engine.entity_component(domain));
            for service in services {
                component
                    .register_entity_service(engine.registry(), service, handler.clone(), None)
                    .await;
            }
        }

        for (domain, descriptions) in setup.descriptions {
            engine
                .registry()
                .set_descriptions(&domain, descriptions)
                .await;
        }

        info!(
            "Loaded setup with {} domains and {} platforms",
            components.len(),
            setup.platforms.len()
        );

        Ok(Self {
            engine,
            components,
            handler,
        })
    }
}

/// Entity service handler that logs each invocation and keeps a history.
#[derive(Default)]
pub struct ConsoleHandler {
    invocations: Mutex<Vec<Invocation>>,
}

/// One entity a service ran on.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub service: String,
    pub entity_id: String,
    pub data: Value,
}

impl ConsoleHandler {
    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ServiceHandler for ConsoleHandler {
    async fn call_entity(
        &self,
        entity: &Arc<dyn Entity>,
        call: &ServiceCall,
    ) -> Result<(), HandlerError> {
        let data = Value::Object(call.data_without_target());
        info!(
            "{}.{} -> {} {}",
            call.domain(),
            call.service(),
            entity.entity_id(),
            data
        );
        self.invocations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Invocation {
                service: format!("{}.{}", call.domain(), call.service()),
                entity_id: entity.entity_id().to_string(),
                data,
            });
        Ok(())
    }
}

/// Parses a `key=value` template variable. Values that parse as JSON are
/// kept typed, anything else is a string.
pub fn parse_var(s: &str) -> std::result::Result<(String, Value), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid KEY=value: no `=` found in `{s}`"))?;
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.trim().to_string(), value))
}
