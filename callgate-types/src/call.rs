//! The immutable service call record.

use crate::Context;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reserved key in call data holding the target specification.
pub const ATTR_ENTITY_ID: &str = "entity_id";

/// Target value meaning "every candidate entity".
pub const ENTITY_MATCH_ALL: &str = "*";

/// Template variables, keyed by name.
pub type Variables = Map<String, Value>;

/// A request to invoke `domain.service` with `data` on behalf of `context`.
///
/// The record is immutable once built. Stages that need different data
/// build a new call instead of editing this one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ServiceCallRecord")]
pub struct ServiceCall {
    domain: String,
    service: String,
    data: Map<String, Value>,
    context: Context,
}

/// Wire form of [`ServiceCall`]; deserialized calls go through
/// [`ServiceCall::new`].
#[derive(Deserialize)]
struct ServiceCallRecord {
    domain: String,
    service: String,
    #[serde(default)]
    data: Map<String, Value>,
    #[serde(default)]
    context: Context,
}

impl From<ServiceCallRecord> for ServiceCall {
    fn from(record: ServiceCallRecord) -> Self {
        Self::new(record.domain, record.service, record.data, record.context)
    }
}

impl ServiceCall {
    /// Creates a call. Domain and service are lower-cased.
    pub fn new(
        domain: impl AsRef<str>,
        service: impl AsRef<str>,
        data: Map<String, Value>,
        context: Context,
    ) -> Self {
        Self {
            domain: domain.as_ref().to_lowercase(),
            service: service.as_ref().to_lowercase(),
            data,
            context,
        }
    }

    /// Starts a builder for a call with empty data and a trusted context.
    pub fn builder(domain: impl AsRef<str>, service: impl AsRef<str>) -> ServiceCallBuilder {
        ServiceCallBuilder {
            call: Self::new(domain, service, Map::new(), Context::new()),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Returns the raw target specification, if one was given.
    pub fn target(&self) -> Option<&Value> {
        self.data.get(ATTR_ENTITY_ID)
    }

    /// Returns a copy of the data without the target key.
    pub fn data_without_target(&self) -> Map<String, Value> {
        self.data
            .iter()
            .filter(|(k, _)| k.as_str() != ATTR_ENTITY_ID)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Builds a [`ServiceCall`] field by field.
#[derive(Debug, Clone)]
pub struct ServiceCallBuilder {
    call: ServiceCall,
}

impl ServiceCallBuilder {
    /// Replaces the whole data mapping.
    #[must_use]
    pub fn data(mut self, data: Map<String, Value>) -> Self {
        self.call.data = data;
        self
    }

    /// Sets a single data key.
    #[must_use]
    pub fn entry(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.call.data.insert(key.into(), value.into());
        self
    }

    /// Sets the target specification.
    #[must_use]
    pub fn target(self, target: impl Into<Value>) -> Self {
        self.entry(ATTR_ENTITY_ID, target)
    }

    #[must_use]
    pub fn context(mut self, context: Context) -> Self {
        self.call.context = context;
        self
    }

    pub fn build(self) -> ServiceCall {
        self.call
    }
}
