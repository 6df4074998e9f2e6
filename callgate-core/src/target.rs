//! Target resolution: from the raw `entity_id` value to entity ids.

use crate::config::EngineConfig;
use callgate_types::{ENTITY_MATCH_ALL, ServiceCall, split_entity_id};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::warn;

/// The entities a call is aimed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityTarget {
    /// Every candidate entity, subject to permission filtering.
    All,
    /// Explicit lower-case ids, deduplicated, in request order.
    Ids(Vec<String>),
}

impl EntityTarget {
    /// The explicit ids, or an empty slice for [`EntityTarget::All`].
    pub fn ids(&self) -> &[String] {
        match self {
            Self::All => &[],
            Self::Ids(ids) => ids,
        }
    }
}

/// Outcome of resolving a target specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetResolution {
    pub target: EntityTarget,
    /// The target was omitted entirely (deprecated form of "all").
    pub omitted: bool,
}

/// Expands a group entity into its member entity ids.
pub trait GroupExpander: Send + Sync {
    /// Returns the transitive members of `group_id`, in order.
    fn expand(&self, group_id: &str) -> Vec<String>;
}

/// In-memory group registry with transitive, cycle-safe expansion.
#[derive(Debug)]
pub struct GroupRegistry {
    domain: String,
    groups: RwLock<HashMap<String, Vec<String>>>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::with_domain("group")
    }

    pub fn with_domain(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            groups: RwLock::new(HashMap::new()),
        }
    }

    /// Creates or replaces `<domain>.<object_id>` with the given members.
    /// Returns the group's entity id.
    pub fn create_group<I, S>(&self, object_id: &str, members: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let group_id = format!("{}.{}", self.domain, object_id).to_lowercase();
        let members = members
            .into_iter()
            .map(|m| m.as_ref().to_lowercase())
            .collect();
        self.groups
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(group_id.clone(), members);
        group_id
    }

    pub fn remove_group(&self, group_id: &str) -> bool {
        self.groups
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&group_id.to_lowercase())
            .is_some()
    }

    fn is_group(&self, entity_id: &str) -> bool {
        split_entity_id(entity_id).is_some_and(|(domain, _)| domain == self.domain)
    }

    fn expand_into(
        &self,
        groups: &HashMap<String, Vec<String>>,
        group_id: &str,
        visited: &mut HashSet<String>,
        found: &mut Vec<String>,
    ) {
        let Some(members) = groups.get(group_id) else {
            return;
        };
        for member in members {
            if self.is_group(member) {
                if visited.insert(member.clone()) {
                    self.expand_into(groups, member, visited, found);
                }
            } else if !found.contains(member) {
                found.push(member.clone());
            }
        }
    }
}

impl Default for GroupRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupExpander for GroupRegistry {
    fn expand(&self, group_id: &str) -> Vec<String> {
        let group_id = group_id.to_lowercase();
        let groups = self.groups.read().unwrap_or_else(PoisonError::into_inner);
        let mut visited = HashSet::from([group_id.clone()]);
        let mut found = Vec::new();
        self.expand_into(&groups, &group_id, &mut visited, &mut found);
        found
    }
}

/// Turns raw target specifications into [`EntityTarget`]s.
#[derive(Clone)]
pub struct TargetResolver {
    groups: Arc<dyn GroupExpander>,
    group_domain: String,
    warn_on_omitted: bool,
}

impl TargetResolver {
    pub fn new(groups: Arc<dyn GroupExpander>, config: &EngineConfig) -> Self {
        Self {
            groups,
            group_domain: config.group_domain.clone(),
            warn_on_omitted: config.warn_on_omitted_target,
        }
    }

    /// Resolves a raw target value.
    ///
    /// - absent → [`EntityTarget::All`], flagged as omitted
    /// - `"*"` → [`EntityTarget::All`]
    /// - `"a.b, c.d"` → split on commas, trimmed, lower-cased, empties dropped
    /// - `["a.b", ...]` → lower-cased
    ///
    /// Group ids are replaced by their members when `expand_groups` is set.
    /// Ids are never checked for existence.
    pub fn resolve(&self, target: Option<&Value>, expand_groups: bool) -> TargetResolution {
        let raw: Vec<String> = match target {
            None => {
                return TargetResolution {
                    target: EntityTarget::All,
                    omitted: true,
                };
            }
            Some(Value::String(s)) if s.trim() == ENTITY_MATCH_ALL => {
                return TargetResolution {
                    target: EntityTarget::All,
                    omitted: false,
                };
            }
            Some(Value::String(s)) => s
                .split(',')
                .map(str::trim)
                .filter(|piece| !piece.is_empty())
                .map(str::to_lowercase)
                .collect(),
            Some(Value::Array(items)) => items.iter().map(value_to_id).collect(),
            Some(Value::Null) => Vec::new(),
            Some(other) => vec![value_to_id(other)],
        };

        let mut seen = HashSet::new();
        let mut ids = Vec::with_capacity(raw.len());
        for id in raw {
            let expanded = if expand_groups && self.is_group(&id) {
                self.groups
                    .expand(&id)
                    .into_iter()
                    .map(|member| member.to_lowercase())
                    .collect()
            } else {
                vec![id]
            };
            for id in expanded {
                if seen.insert(id.clone()) {
                    ids.push(id);
                }
            }
        }

        TargetResolution {
            target: EntityTarget::Ids(ids),
            omitted: false,
        }
    }

    /// Resolves the target of `call`, logging the deprecation warning when
    /// the target was omitted.
    pub fn resolve_call(&self, call: &ServiceCall, expand_groups: bool) -> TargetResolution {
        let resolution = self.resolve(call.target(), expand_groups);
        if resolution.omitted && self.warn_on_omitted {
            warn!(
                "Not passing an entity ID to a service to target all entities is deprecated. \
                 Update your call to {}.{} to be instead: entity_id: {}",
                call.domain(),
                call.service(),
                ENTITY_MATCH_ALL
            );
        }
        resolution
    }

    fn is_group(&self, entity_id: &str) -> bool {
        split_entity_id(entity_id).is_some_and(|(domain, _)| domain == self.group_domain)
    }
}

fn value_to_id(value: &Value) -> String {
    match value {
        Value::String(s) => s.to_lowercase(),
        other => other.to_string().to_lowercase(),
    }
}
