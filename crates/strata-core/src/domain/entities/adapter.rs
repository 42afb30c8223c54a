//! Adapter: the loadable unit behind a module.
//!
//! An adapter bundles [`AdapterMetadata`] (identity, requirements, conflicts,
//! capabilities, smart path overrides), a [`ParameterSchema`] and a
//! [`Blueprint`]. Planning only ever reads metadata.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::{
    capabilities::Capability,
    entities::blueprint::Blueprint,
    error::DomainError,
    parameters::ParameterSchema,
    smart_path::{OverrideSource, PathOverride, SmartPathKey},
    value_objects::{ModuleCategory, ModuleKey},
};

// ── Requirement ──────────────────────────────────────────────────────────────

/// One `requires`/`conflicts` entry.
///
/// Written as `id`, `category:id` or `category:*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Requirement {
    /// Any module with this id, whatever its category.
    Id(String),
    Exact(ModuleKey),
    /// Any module in the category.
    AnyOf(ModuleCategory),
}

impl Requirement {
    pub fn matches(&self, key: &ModuleKey) -> bool {
        match self {
            Self::Id(id) => key.id == *id,
            Self::Exact(exact) => exact == key,
            Self::AnyOf(category) => key.category == *category,
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => f.write_str(id),
            Self::Exact(key) => write!(f, "{key}"),
            Self::AnyOf(category) => write!(f, "{category}:*"),
        }
    }
}

impl FromStr for Requirement {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once(':') {
            None if !s.is_empty() => Ok(Self::Id(s.to_string())),
            None => Err(DomainError::InvalidModuleKey(s.to_string())),
            Some((category, "*")) => category
                .parse()
                .map(Self::AnyOf)
                .map_err(|_| DomainError::InvalidModuleKey(s.to_string())),
            Some(_) => ModuleKey::parse(s).map(Self::Exact),
        }
    }
}

impl TryFrom<String> for Requirement {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Requirement> for String {
    fn from(r: Requirement) -> Self {
        r.to_string()
    }
}

// ── Metadata ─────────────────────────────────────────────────────────────────

/// Smart path override declared by an adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathOverrideDecl {
    pub key: SmartPathKey,
    pub value: String,
    #[serde(default)]
    pub reason: String,
    /// Limit the override to one module id.
    #[serde(default)]
    pub module: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterMetadata {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: ModuleCategory,
    pub version: String,
    #[serde(default)]
    pub requires: Vec<Requirement>,
    #[serde(default)]
    pub conflicts: Vec<Requirement>,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    #[serde(default)]
    pub path_overrides: Vec<PathOverrideDecl>,
}

impl AdapterMetadata {
    pub fn new(category: ModuleCategory, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            category,
            version: "1.0.0".into(),
            requires: Vec::new(),
            conflicts: Vec::new(),
            capabilities: Vec::new(),
            path_overrides: Vec::new(),
        }
    }

    pub fn key(&self) -> ModuleKey {
        ModuleKey::new(self.category, self.id.clone())
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn requires(mut self, requirement: Requirement) -> Self {
        self.requires.push(requirement);
        self
    }

    pub fn conflicts_with(mut self, requirement: Requirement) -> Self {
        self.conflicts.push(requirement);
        self
    }

    pub fn capability(mut self, capability: Capability) -> Self {
        self.capabilities.push(capability);
        self
    }

    pub fn path_override(
        mut self,
        key: SmartPathKey,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        self.path_overrides.push(PathOverrideDecl {
            key,
            value: value.into(),
            reason: reason.into(),
            module: None,
        });
        self
    }

    /// Capability record for a category, if the adapter declares one.
    pub fn capability_for(&self, category: ModuleCategory) -> Option<&Capability> {
        self.capabilities.iter().find(|c| c.category() == category)
    }

    /// Declared overrides as registry entries. Framework adapters register at
    /// `framework` priority, everything else at `adapter` priority.
    pub fn path_overrides(&self) -> Vec<PathOverride> {
        let source = if self.category == ModuleCategory::Framework {
            OverrideSource::Framework
        } else {
            OverrideSource::Adapter
        };

        self.path_overrides
            .iter()
            .map(|decl| {
                let reason = if decl.reason.is_empty() {
                    format!("declared by {}", self.key())
                } else {
                    decl.reason.clone()
                };
                let o = PathOverride::new(decl.key, decl.value.clone(), source, reason);
                match &decl.module {
                    Some(module) => o.for_module(module.clone()),
                    None => o,
                }
            })
            .collect()
    }
}

/// Everything `AdapterRegistry::load` hands back.
#[derive(Debug, Clone)]
pub struct LoadedAdapter {
    pub metadata: AdapterMetadata,
    pub parameter_schema: ParameterSchema,
    pub blueprint: Blueprint,
}
