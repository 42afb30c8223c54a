//! Recipe aggregate: the sole input to a run.
//!
//! A recipe is parsed once at process start and never mutated afterwards.
//! The on-disk shape (YAML, JSON or TOML) is:
//!
//! ```yaml
//! version: "1.0"
//! project:
//!   name: my-app
//!   framework: nextjs
//!   path: ./my-app
//!   structure: single-app      # or monorepo
//!   paths:                      # user smart-path overrides
//!     auth_config: src/auth/config
//!   installed: [database:drizzle]
//! genome:
//!   name: saas-starter
//!   paths: {}
//! modules:
//!   - { id: nextjs, category: framework, version: "14", parameters: {} }
//! options: { skipInstall: false, skipGit: false, verbose: false }
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::{
    error::DomainError,
    value_objects::{ModuleCategory, ModuleKey, ParameterValue, ProjectLayout},
};

/// Declarative description of a project to scaffold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub version: String,
    pub project: ProjectSpec,
    #[serde(default)]
    pub genome: Option<GenomeSpec>,
    #[serde(default)]
    pub modules: Vec<ModuleRef>,
    #[serde(default)]
    pub options: ExecutionOptions,
}

/// Project metadata carried by a recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSpec {
    pub name: String,
    #[serde(default)]
    pub framework: Option<String>,
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub structure: ProjectLayout,
    /// User-level smart path overrides, keyed by smart path name.
    #[serde(default)]
    pub paths: BTreeMap<String, String>,
    /// Modules already present in the target project. They satisfy
    /// requirements but are never executed.
    #[serde(default)]
    pub installed: Vec<ModuleKey>,
}

/// The genome (named recipe template) a recipe was derived from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenomeSpec {
    pub name: String,
    /// Genome-level smart path defaults, lowest override priority.
    #[serde(default)]
    pub paths: BTreeMap<String, String>,
}

/// A reference to one technology plugin plus its raw configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRef {
    pub id: String,
    pub category: ModuleCategory,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterValue>,
}

impl ModuleRef {
    pub fn new(category: ModuleCategory, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category,
            version: None,
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_parameter(
        mut self,
        name: impl Into<String>,
        value: impl Into<ParameterValue>,
    ) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn key(&self) -> ModuleKey {
        ModuleKey::new(self.category, self.id.clone())
    }
}

impl From<ModuleKey> for ModuleRef {
    fn from(key: ModuleKey) -> Self {
        Self::new(key.category, key.id)
    }
}

/// Execution switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionOptions {
    #[serde(default)]
    pub skip_install: bool,
    #[serde(default, alias = "skipVcs")]
    pub skip_git: bool,
    #[serde(default)]
    pub verbose: bool,
}

impl Recipe {
    /// Start a recipe for the named project with no modules.
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            version: "1.0".into(),
            project: ProjectSpec {
                name: project_name.into(),
                framework: None,
                path: None,
                structure: ProjectLayout::default(),
                paths: BTreeMap::new(),
                installed: Vec::new(),
            },
            genome: None,
            modules: Vec::new(),
            options: ExecutionOptions::default(),
        }
    }

    pub fn with_module(mut self, module: ModuleRef) -> Self {
        self.modules.push(module);
        self
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.project.path = Some(path.into());
        self
    }

    pub fn with_layout(mut self, layout: ProjectLayout) -> Self {
        self.project.structure = layout;
        self
    }

    pub fn with_options(mut self, options: ExecutionOptions) -> Self {
        self.options = options;
        self
    }

    /// Directory the project is generated into. Defaults to `./<name>`.
    pub fn project_root(&self) -> PathBuf {
        self.project
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from(".").join(&self.project.name))
    }

    pub fn module(&self, key: &ModuleKey) -> Option<&ModuleRef> {
        self.modules
            .iter()
            .find(|m| m.category == key.category && m.id == key.id)
    }

    /// Check the recipe's shape.
    ///
    /// Fails on an empty version or project name, an empty module list,
    /// malformed module ids, and duplicate `(category, id)` pairs.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.version.trim().is_empty() {
            return Err(DomainError::InvalidRecipe("version must not be empty".into()));
        }

        let name = self.project.name.trim();
        if name.is_empty() {
            return Err(DomainError::InvalidRecipe(
                "project name must not be empty".into(),
            ));
        }
        if name.contains('/') || name.contains('\\') {
            return Err(DomainError::InvalidRecipe(format!(
                "project name '{name}' cannot contain path separators"
            )));
        }

        if self.modules.is_empty() {
            return Err(DomainError::InvalidRecipe(
                "recipe must contain at least one module".into(),
            ));
        }

        let mut seen = HashSet::new();
        for module in &self.modules {
            if module.id.is_empty() || module.id.chars().any(|c| c.is_whitespace() || c == ':') {
                return Err(DomainError::InvalidRecipe(format!(
                    "invalid module id '{}'",
                    module.id
                )));
            }
            if !seen.insert(module.key()) {
                return Err(DomainError::DuplicateModule {
                    category: module.category.to_string(),
                    id: module.id.clone(),
                });
            }
        }

        Ok(())
    }
}
