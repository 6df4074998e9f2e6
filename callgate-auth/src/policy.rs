//! Policy-evaluated entity permissions.
//!
//! A policy grants access at three levels, checked most specific first:
//! explicit entity ids, then domains, then the catch-all `all`. The first
//! level with an opinion decides; no opinion anywhere means deny.
//!
//! ```toml
//! [entities]
//! all = { read = true }
//!
//! [entities.domains]
//! light = true
//!
//! [entities.entity_ids]
//! "switch.heater" = { control = true }
//! "light.garage" = false
//! ```

use crate::permissions::{Decision, EntityPermissions, PermissionCategory};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Top-level policy document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<EntitiesPolicy>,
}

/// Either a blanket grant/deny or a per-level table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntitiesPolicy {
    Blanket(bool),
    Table {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        all: Option<SubPolicy>,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        domains: BTreeMap<String, SubPolicy>,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        entity_ids: BTreeMap<String, SubPolicy>,
    },
}

/// A grant for one level: a flag for every category, or per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubPolicy {
    Flag(bool),
    Categories(CategoryPolicy),
}

/// Per-category grants. A missing category has no opinion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit: Option<bool>,
}

impl SubPolicy {
    fn lookup(&self, category: PermissionCategory) -> Option<bool> {
        match self {
            Self::Flag(flag) => Some(*flag),
            Self::Categories(c) => match category {
                PermissionCategory::Read => c.read,
                PermissionCategory::Control => c.control,
                PermissionCategory::Edit => c.edit,
            },
        }
    }
}

/// [`EntityPermissions`] backed by an [`EntityPolicy`].
#[derive(Debug, Clone, Default)]
pub struct PolicyPermissions {
    blanket: Option<bool>,
    all: Option<SubPolicy>,
    domains: HashMap<String, SubPolicy>,
    entity_ids: HashMap<String, SubPolicy>,
}

impl PolicyPermissions {
    /// Compiles a policy. Domain and entity keys are lower-cased.
    pub fn new(policy: &EntityPolicy) -> Self {
        match &policy.entities {
            None => Self::default(),
            Some(EntitiesPolicy::Blanket(flag)) => Self {
                blanket: Some(*flag),
                ..Self::default()
            },
            Some(EntitiesPolicy::Table {
                all,
                domains,
                entity_ids,
            }) => Self {
                blanket: None,
                all: *all,
                domains: lowercase_keys(domains),
                entity_ids: lowercase_keys(entity_ids),
            },
        }
    }
}

fn lowercase_keys(map: &BTreeMap<String, SubPolicy>) -> HashMap<String, SubPolicy> {
    map.iter().map(|(k, v)| (k.to_lowercase(), *v)).collect()
}

impl EntityPermissions for PolicyPermissions {
    fn check_entity(&self, entity_id: &str, category: PermissionCategory) -> Decision {
        if let Some(flag) = self.blanket {
            return flag.into();
        }

        let entity_id = entity_id.to_lowercase();
        let domain = entity_id.split_once('.').map(|(d, _)| d);

        let decided = self
            .entity_ids
            .get(&entity_id)
            .and_then(|p| p.lookup(category))
            .or_else(|| {
                domain
                    .and_then(|d| self.domains.get(d))
                    .and_then(|p| p.lookup(category))
            })
            .or_else(|| self.all.and_then(|p| p.lookup(category)));

        decided.unwrap_or(false).into()
    }
}
