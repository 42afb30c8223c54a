//! Adapter Service - read-only queries over the adapter registry.
//!
//! Separated from the orchestrator so listing never builds an executor.

use std::sync::Arc;

use serde::Serialize;

use crate::{
    application::ports::AdapterRegistry,
    domain::{AdapterMetadata, ModuleCategory, ModuleKey},
    error::StrataResult,
};

/// Adapter summary for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdapterInfo {
    pub key: String,
    pub name: String,
    pub description: String,
    pub version: String,
    pub requires: Vec<String>,
    pub conflicts: Vec<String>,
    pub capabilities: Vec<String>,
}

impl From<&AdapterMetadata> for AdapterInfo {
    fn from(meta: &AdapterMetadata) -> Self {
        Self {
            key: meta.key().to_string(),
            name: meta.name.clone(),
            description: meta.description.clone(),
            version: meta.version.clone(),
            requires: meta.requires.iter().map(ToString::to_string).collect(),
            conflicts: meta.conflicts.iter().map(ToString::to_string).collect(),
            capabilities: meta.capabilities.iter().map(|c| c.summary()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: String,
    pub required: bool,
    pub default: Option<String>,
    pub choices: Vec<String>,
    pub description: String,
}

/// Everything `strata list <key>` shows about one adapter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdapterDetails {
    #[serde(flatten)]
    pub info: AdapterInfo,
    pub parameters: Vec<ParameterInfo>,
    pub actions: Vec<String>,
}

pub struct AdapterService {
    registry: Arc<dyn AdapterRegistry>,
}

impl AdapterService {
    pub fn new(registry: Arc<dyn AdapterRegistry>) -> Self {
        Self { registry }
    }

    /// All adapters, optionally restricted to one category.
    pub fn list(&self, category: Option<ModuleCategory>) -> Vec<AdapterInfo> {
        self.registry
            .list()
            .iter()
            .filter(|m| category.is_none_or(|c| m.category == c))
            .map(AdapterInfo::from)
            .collect()
    }

    pub fn describe(&self, key: &ModuleKey) -> StrataResult<AdapterDetails> {
        let loaded = self.registry.load(key)?;

        let parameters = loaded
            .parameter_schema
            .iter()
            .map(|def| ParameterInfo {
                name: def.name.clone(),
                param_type: def.param_type.to_string(),
                required: def.required,
                default: def.default.as_ref().map(ToString::to_string),
                choices: def.choices.clone(),
                description: def.description.clone(),
            })
            .collect();

        let actions = loaded
            .blueprint
            .actions
            .iter()
            .map(|a| a.kind.to_string())
            .collect();

        Ok(AdapterDetails {
            info: AdapterInfo::from(&loaded.metadata),
            parameters,
            actions,
        })
    }
}
