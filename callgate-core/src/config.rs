use serde::{Deserialize, Serialize};

/// Configuration for the service engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Expand group entities into their members when resolving targets.
    pub expand_groups: bool,
    /// Log a deprecation warning when a call omits its target.
    pub warn_on_omitted_target: bool,
    /// Domain whose entities are groups.
    pub group_domain: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            expand_groups: true,
            warn_on_omitted_target: true,
            group_domain: "group".to_string(),
        }
    }
}
