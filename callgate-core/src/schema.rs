//! Call configuration schema.
//!
//! A call configuration looks like:
//!
//! ```json
//! {
//!   "service_template": "{{ domain }}.turn_on",
//!   "entity_id": "light.kitchen, light.living_room",
//!   "data": {"transition": 2},
//!   "data_template": {"brightness": "{{ level * 2 }}"}
//! }
//! ```

use crate::error::ConfigError;
use callgate_types::{ENTITY_MATCH_ALL, ServiceName, valid_entity_id};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Where the `domain.service` name comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceSource {
    Literal(String),
    Template(String),
}

/// A parsed call configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceCallConfig {
    pub service: ServiceSource,
    pub data: Map<String, Value>,
    pub data_template: Option<Map<String, Value>>,
    pub entity_id: Option<Value>,
}

#[derive(Deserialize)]
struct RawConfig {
    #[serde(default)]
    service: Option<String>,
    #[serde(default)]
    service_template: Option<String>,
    #[serde(default)]
    data: Option<Map<String, Value>>,
    #[serde(default)]
    data_template: Option<Map<String, Value>>,
    #[serde(default)]
    entity_id: Option<Value>,
}

impl ServiceCallConfig {
    /// Parses and validates a configuration.
    ///
    /// The service name must be `domain.service`, and `entity_id` is
    /// normalized to `"*"` or a lower-cased list of valid entity ids.
    pub fn validate(value: &Value) -> Result<Self, ConfigError> {
        let mut config = Self::parse(value)?;

        if let ServiceSource::Literal(name) = &config.service {
            name.parse::<ServiceName>()
                .map_err(|_| ConfigError::InvalidService(name.clone()))?;
        }

        if let Some(target) = &config.entity_id {
            config.entity_id = Some(normalize_entity_ids(target)?);
        }

        Ok(config)
    }

    /// Parses a configuration structurally, without checking values.
    pub fn parse(value: &Value) -> Result<Self, ConfigError> {
        if !value.is_object() {
            return Err(ConfigError::NotAMapping);
        }
        let raw = RawConfig::deserialize(value)?;

        let service = match (raw.service, raw.service_template) {
            (Some(name), None) => ServiceSource::Literal(name),
            (None, Some(template)) => ServiceSource::Template(template),
            _ => return Err(ConfigError::ServiceKey),
        };

        Ok(Self {
            service,
            data: raw.data.unwrap_or_default(),
            data_template: raw.data_template,
            entity_id: raw.entity_id,
        })
    }
}

/// Normalizes an `entity_id` config value.
fn normalize_entity_ids(value: &Value) -> Result<Value, ConfigError> {
    let ids: Vec<String> = match value {
        Value::String(s) if s.trim() == ENTITY_MATCH_ALL => {
            return Ok(Value::String(ENTITY_MATCH_ALL.to_string()));
        }
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|piece| !piece.is_empty())
            .map(str::to_lowercase)
            .collect(),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(|s| s.trim().to_lowercase())
                    .ok_or_else(|| ConfigError::InvalidTarget(item.to_string()))
            })
            .collect::<Result<_, _>>()?,
        other => return Err(ConfigError::InvalidTarget(other.to_string())),
    };

    if let Some(bad) = ids.iter().find(|id| !valid_entity_id(id)) {
        return Err(ConfigError::InvalidEntityId(bad.clone()));
    }

    Ok(Value::Array(ids.into_iter().map(Value::String).collect()))
}
