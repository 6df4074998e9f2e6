//! `domain.object` identifiers for entities and services.

use crate::Error;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static DOMAIN_OBJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\w+)\.(\w+)$").expect("static pattern compiles")
});

/// Returns true if `entity_id` has the `domain.object_id` shape.
pub fn valid_entity_id(entity_id: &str) -> bool {
    DOMAIN_OBJECT.is_match(entity_id)
}

/// Splits an entity id into `(domain, object_id)` at the first dot.
pub fn split_entity_id(entity_id: &str) -> Option<(&str, &str)> {
    entity_id.split_once('.')
}

/// A validated `domain.service` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServiceName {
    domain: String,
    service: String,
}

impl ServiceName {
    /// Builds a service name from its parts, lower-casing both.
    pub fn new(domain: &str, service: &str) -> crate::Result<Self> {
        format!("{domain}.{service}").parse()
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn service(&self) -> &str {
        &self.service
    }
}

impl FromStr for ServiceName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = DOMAIN_OBJECT
            .captures(s)
            .ok_or_else(|| Error::InvalidService(s.to_string()))?;
        Ok(Self {
            domain: caps[1].to_lowercase(),
            service: caps[2].to_lowercase(),
        })
    }
}

impl TryFrom<String> for ServiceName {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ServiceName> for String {
    fn from(value: ServiceName) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.domain, self.service)
    }
}
