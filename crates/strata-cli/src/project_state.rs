//! `.strata/project.json`: what a project was generated with.
//!
//! Written after every non-dry run so `strata add` and `strata scale` can
//! rebuild the project spec and mark existing modules as installed.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use strata_core::application::RecipeExecutionReport;
use strata_core::domain::{GenomeSpec, ModuleKey, ModuleRef, ProjectSpec, Recipe};

use crate::error::{CliError, CliResult, IntoCli};

pub const STATE_DIR: &str = ".strata";
pub const STATE_FILE: &str = "project.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectState {
    pub strata_version: String,
    pub project: ProjectSpec,
    #[serde(default)]
    pub genome: Option<GenomeSpec>,
    /// Modules that completed, with the parameters they ran with.
    #[serde(default)]
    pub modules: Vec<ModuleRef>,
}

impl ProjectState {
    pub fn path(root: &Path) -> PathBuf {
        root.join(STATE_DIR).join(STATE_FILE)
    }

    pub fn exists(root: &Path) -> bool {
        Self::path(root).is_file()
    }

    /// Start a state file for a freshly scaffolded project.
    pub fn new(recipe: &Recipe) -> Self {
        let mut project = recipe.project.clone();
        project.path = None;
        project.installed.clear();
        Self {
            strata_version: strata_core::VERSION.to_string(),
            project,
            genome: recipe.genome.clone(),
            modules: Vec::new(),
        }
    }

    pub fn load(root: &Path) -> CliResult<Self> {
        let path = Self::path(root);
        if !path.is_file() {
            return Err(CliError::NotAStrataProject {
                path: root.to_path_buf(),
            });
        }
        let raw =
            fs::read_to_string(&path).with_cli_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&raw).map_err(|e| CliError::InvalidInput {
            message: format!("{} is not a valid project file", path.display()),
            source: Some(Box::new(e)),
        })
    }

    pub fn save(&self, root: &Path) -> CliResult<()> {
        let path = Self::path(root);
        let dir = root.join(STATE_DIR);
        fs::create_dir_all(&dir).with_cli_context(|| format!("creating {}", dir.display()))?;

        let mut text = serde_json::to_string_pretty(self).map_err(|e| CliError::InvalidInput {
            message: "project state could not be encoded".into(),
            source: Some(Box::new(e)),
        })?;
        text.push('\n');
        fs::write(&path, text).with_cli_context(|| format!("writing {}", path.display()))?;
        debug!(path = %path.display(), modules = self.modules.len(), "Project state saved");
        Ok(())
    }

    pub fn installed(&self) -> Vec<ModuleKey> {
        self.modules.iter().map(ModuleRef::key).collect()
    }

    /// A recipe for `root` that carries this project's spec and marks every
    /// recorded module installed.  The caller adds the new modules.
    pub fn base_recipe(&self, root: &Path) -> Recipe {
        let mut recipe = Recipe::new(self.project.name.clone());
        recipe.project = self.project.clone();
        recipe.project.path = Some(root.to_path_buf());
        recipe.project.installed = self.installed();
        recipe.genome = self.genome.clone();
        recipe
    }

    /// Record the modules from `recipe` that succeeded in `report`.
    pub fn record(&mut self, recipe: &Recipe, report: &RecipeExecutionReport) {
        for result in report.succeeded() {
            let Some(module) = recipe.module(&result.module) else {
                continue;
            };
            match self.modules.iter_mut().find(|m| m.key() == result.module) {
                Some(existing) => *existing = module.clone(),
                None => self.modules.push(module.clone()),
            }
        }
        for (key, value) in &recipe.project.paths {
            self.project.paths.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::application::ExecutionResult;
    use strata_core::domain::{ModuleCategory, ParameterValue};
    use tempfile::TempDir;

    fn recipe() -> Recipe {
        Recipe::new("shop")
            .with_path("/tmp/shop")
            .with_module(ModuleRef::new(ModuleCategory::Framework, "nextjs"))
            .with_module(
                ModuleRef::new(ModuleCategory::Database, "drizzle")
                .with_parameter("dialect", "sqlite"),
            )
    }

    fn report_with(succeeded: &[ModuleKey], failed: &[ModuleKey]) -> RecipeExecutionReport {
        let mut report = RecipeExecutionReport::new("shop", "/tmp/shop");
        for key in succeeded {
            report.push(ExecutionResult::new(key.clone()));
        }
        for key in failed {
            report.push(ExecutionResult::failed(
                key.clone(),
                strata_core::error::StrataError::Internal { message: "x".into() },
            ));
        }
        report
    }

    #[test]
    fn records_only_succeeded_modules() {
        let recipe = recipe();
        let mut state = ProjectState::new(&recipe);
        let nextjs = ModuleKey::new(ModuleCategory::Framework, "nextjs");
        let drizzle = ModuleKey::new(ModuleCategory::Database, "drizzle");

        state.record(&recipe, &report_with(&[nextjs.clone()], &[drizzle]));

        assert_eq!(state.installed(), vec![nextjs]);
        assert!(state.project.path.is_none());
    }

    #[test]
    fn save_then_load() {
        let temp = TempDir::new().unwrap();
        let recipe = recipe();
        let mut state = ProjectState::new(&recipe);
        let keys: Vec<_> = recipe.modules.iter().map(ModuleRef::key).collect();
        state.record(&recipe, &report_with(&keys, &[]));

        state.save(temp.path()).unwrap();
        assert!(ProjectState::exists(temp.path()));

        let loaded = ProjectState::load(temp.path()).unwrap();
        assert_eq!(loaded, state);
        assert_eq!(
            loaded.modules[1].parameters["dialect"],
            ParameterValue::String("sqlite".into())
        );
    }

    #[test]
    fn missing_state_is_not_a_project() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            ProjectState::load(temp.path()),
            Err(CliError::NotAStrataProject { .. })
        ));
    }

    #[test]
    fn base_recipe_marks_modules_installed() {
        let recipe = recipe();
        let mut state = ProjectState::new(&recipe);
        let keys: Vec<_> = recipe.modules.iter().map(ModuleRef::key).collect();
        state.record(&recipe, &report_with(&keys, &[]));

        let base = state.base_recipe(Path::new("/srv/shop"));
        assert_eq!(base.project.name, "shop");
        assert_eq!(base.project_root(), PathBuf::from("/srv/shop"));
        assert_eq!(base.project.installed, keys);
        assert!(base.modules.is_empty());
    }
}
