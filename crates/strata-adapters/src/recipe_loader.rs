//! Recipe files on disk.
//!
//! The format follows the extension: `.yaml`/`.yml`, `.json` or `.toml`.
//! Parsing only checks shape; structural validation happens when the
//! orchestrator plans the run.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{debug, instrument};

use strata_core::domain::Recipe;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeFormat {
    Yaml,
    Json,
    Toml,
}

impl RecipeFormat {
    /// Format for a path, judged by extension only.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
}

impl fmt::Display for RecipeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Yaml => "YAML",
            Self::Json => "JSON",
            Self::Toml => "TOML",
        })
    }
}

#[derive(Debug, Error)]
pub enum RecipeLoadError {
    #[error("Cannot read recipe {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported recipe format for {path}; use .yaml, .yml, .json or .toml")]
    UnsupportedFormat { path: PathBuf },

    #[error("Invalid {format} recipe {path}: {reason}")]
    Parse {
        path: PathBuf,
        format: RecipeFormat,
        reason: String,
    },
}

/// Read and parse a recipe file.
#[instrument(fields(path = %path.display()))]
pub fn load_recipe(path: &Path) -> Result<Recipe, RecipeLoadError> {
    let format = RecipeFormat::from_path(path).ok_or_else(|| RecipeLoadError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;
    let raw = fs::read_to_string(path).map_err(|source| RecipeLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let recipe = parse_recipe(&raw, format).map_err(|reason| RecipeLoadError::Parse {
        path: path.to_path_buf(),
        format,
        reason,
    })?;
    debug!(%format, modules = recipe.modules.len(), "recipe parsed");
    Ok(recipe)
}

/// Parse recipe text in the given format.
pub fn parse_recipe(raw: &str, format: RecipeFormat) -> Result<Recipe, String> {
    match format {
        RecipeFormat::Yaml => serde_yaml_ng::from_str(raw).map_err(|e| e.to_string()),
        RecipeFormat::Json => serde_json::from_str(raw).map_err(|e| e.to_string()),
        RecipeFormat::Toml => toml::from_str(raw).map_err(|e| e.to_string()),
    }
}

/// Serialize a recipe, e.g. to save what a genome expanded to.
pub fn render_recipe(recipe: &Recipe, format: RecipeFormat) -> Result<String, String> {
    match format {
        RecipeFormat::Yaml => serde_yaml_ng::to_string(recipe).map_err(|e| e.to_string()),
        RecipeFormat::Json => serde_json::to_string_pretty(recipe).map_err(|e| e.to_string()),
        RecipeFormat::Toml => toml::to_string_pretty(recipe).map_err(|e| e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::domain::{ModuleCategory, ParameterValue, ProjectLayout};
    use tempfile::TempDir;

    const YAML: &str = r#"
version: "1.0"
project:
  name: my-app
  structure: monorepo
  paths:
    auth_config: src/auth
modules:
  - id: nextjs
    category: framework
  - id: drizzle
    category: database
    parameters:
      dialect: sqlite
options:
  skipInstall: true
"#;

    #[test]
    fn yaml_recipe_parses() {
        let recipe = parse_recipe(YAML, RecipeFormat::Yaml).unwrap();

        assert_eq!(recipe.project.name, "my-app");
        assert_eq!(recipe.project.structure, ProjectLayout::Monorepo);
        assert_eq!(recipe.modules[1].category, ModuleCategory::Database);
        assert_eq!(
            recipe.modules[1].parameters.get("dialect"),
            Some(&ParameterValue::String("sqlite".into()))
        );
        assert!(recipe.options.skip_install);
    }

    #[test]
    fn toml_recipe_parses() {
        let raw = r#"
version = "1.0"

[project]
name = "api"

[[modules]]
id = "nextjs"
category = "framework"

[modules.parameters]
strict = false
"#;
        let recipe = parse_recipe(raw, RecipeFormat::Toml).unwrap();
        assert_eq!(
            recipe.modules[0].parameters.get("strict"),
            Some(&ParameterValue::Boolean(false))
        );
    }

    #[test]
    fn load_picks_format_from_extension() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("recipe.yml");
        fs::write(&path, YAML).unwrap();

        assert_eq!(load_recipe(&path).unwrap().modules.len(), 2);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_recipe(Path::new("recipe.ini")).unwrap_err();
        assert!(matches!(err, RecipeLoadError::UnsupportedFormat { .. }));
    }

    #[test]
    fn parse_error_names_format_and_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.json");
        fs::write(&path, "{\"version\": \"1.0\"}").unwrap();

        let message = load_recipe(&path).unwrap_err().to_string();
        assert!(message.starts_with("Invalid JSON recipe"), "{message}");
        assert!(message.contains("project"), "{message}");
    }

    #[test]
    fn rendered_yaml_reads_back() {
        let recipe = parse_recipe(YAML, RecipeFormat::Yaml).unwrap();
        let text = render_recipe(&recipe, RecipeFormat::Yaml).unwrap();
        assert_eq!(parse_recipe(&text, RecipeFormat::Yaml).unwrap(), recipe);
    }
}
