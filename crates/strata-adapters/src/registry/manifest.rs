//! Filesystem-based adapter loader.
//!
//! Discovers `adapter.toml` manifests under a directory tree and converts them
//! into [`LoadedAdapter`]s for the registry.
//!
//! # Directory layout expected
//!
//! ```text
//! adapters/
//! ├── clerk/
//! │   ├── adapter.toml         ← manifest (required)
//! │   └── files/
//! │       └── middleware.ts    ← referenced through `content_file`
//! └── auth/
//!     └── lucia/
//!         └── adapter.toml
//! ```
//!
//! # `adapter.toml` format
//!
//! ```toml
//! [adapter]
//! id          = "clerk"
//! name        = "Clerk"
//! category    = "auth"
//! description = "Hosted auth with Clerk"     # optional
//! version     = "5.0.0"                      # optional, defaults to 1.0.0
//! requires    = ["framework:nextjs"]         # id | category:id | category:*
//! conflicts   = ["better-auth"]
//!
//! [[adapter.path_overrides]]
//! key    = "auth_config"
//! value  = "src/auth"
//! reason = "Clerk expects a top-level auth folder"
//!
//! [[parameters]]
//! name    = "sign_in_url"
//! type    = "string"                         # string | boolean | number | array | object | select
//! default = "/sign-in"
//!
//! [[actions]]
//! type         = "ADD_CONTENT"
//! target       = "src/middleware.ts"
//! content_file = "files/middleware.ts"       # or inline `content = "..."`
//!
//! [[actions]]
//! type     = "ENHANCE_FILE"
//! path     = ".gitignore"
//! modifier = "line-appender"
//! params   = { lines = [".clerk"] }
//!
//! [[actions]]
//! type      = "RUN_COMMAND"
//! command   = "npm install @clerk/nextjs"
//! condition = "{{module.parameters.install}}"
//! ```

use std::{
    collections::BTreeMap,
    fs,
    path::{Component, Path, PathBuf},
};

use serde::Deserialize;
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use strata_core::domain::{
    AdapterMetadata, Blueprint, BlueprintAction, DomainError, LoadedAdapter, ModuleCategory,
    ParameterDef, ParameterSchema, ParameterType, ParameterValue, PathOverrideDecl, Requirement,
    capabilities::Capability,
};

pub const MANIFEST_FILE: &str = "adapter.toml";

// ── Manifest types ────────────────────────────────────────────────────────────

/// Deserialised representation of an `adapter.toml` file.
#[derive(Debug, Deserialize, Clone)]
pub struct AdapterManifest {
    pub adapter: AdapterSection,
    #[serde(default)]
    pub parameters: Vec<ParameterEntry>,
    #[serde(default)]
    pub actions: Vec<ActionEntry>,
}

/// `[adapter]` section.
#[derive(Debug, Deserialize, Clone)]
pub struct AdapterSection {
    pub id: String,
    pub name: String,
    pub category: ModuleCategory,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_version")]
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

fn default_version() -> String {
    "1.0.0".into()
}

/// One entry under `[[parameters]]`.
#[derive(Debug, Deserialize, Clone)]
pub struct ParameterEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParameterType,
    #[serde(default)]
    pub required: bool,
    pub default: Option<ParameterValue>,
    #[serde(default)]
    pub choices: Vec<String>,
    #[serde(default)]
    pub description: String,
}

/// One entry under `[[actions]]`.
///
/// Fields are a union over the three action kinds; [`ActionEntry::into_action`]
/// checks that the ones the kind needs are present.
#[derive(Debug, Deserialize, Clone)]
pub struct ActionEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: Option<String>,
    #[serde(default)]
    pub requires: Vec<String>,
    pub condition: Option<String>,
    pub target: Option<String>,
    pub content: Option<String>,
    /// File next to the manifest whose text becomes `content`.
    pub content_file: Option<String>,
    pub path: Option<String>,
    pub modifier: Option<String>,
    #[serde(default)]
    pub params: BTreeMap<String, ParameterValue>,
    pub command: Option<String>,
}

impl ActionEntry {
    /// Resolve into a [`BlueprintAction`], reading `content_file` relative to `base`.
    fn into_action(
        self,
        index: usize,
        adapter: &str,
        base: &Path,
    ) -> Result<BlueprintAction, DomainError> {
        let invalid = |reason: String| DomainError::InvalidBlueprint {
            blueprint: adapter.to_string(),
            reason: format!("action #{index}: {reason}"),
        };
        let field = |value: Option<String>, name: &str| {
            value.ok_or_else(|| invalid(format!("{} requires '{name}'", self.kind)))
        };

        let mut action = match self.kind.to_ascii_uppercase().replace('-', "_").as_str() {
            "ADD_CONTENT" => {
                let target = field(self.target.clone(), "target")?;
                let content = match (self.content.clone(), self.content_file.as_deref()) {
                    (Some(inline), None) => inline,
                    (None, Some(file)) => read_content_file(base, file).map_err(invalid)?,
                    (Some(_), Some(_)) => {
                        return Err(invalid(
                            "set either 'content' or 'content_file', not both".into(),
                        ));
                    }
                    (None, None) => {
                        return Err(invalid(
                            "ADD_CONTENT requires 'content' or 'content_file'".into(),
                        ));
                    }
                };
                BlueprintAction::add_content(target, content)
            }
            "ENHANCE_FILE" => {
                let mut action = BlueprintAction::enhance_file(
                    field(self.path.clone(), "path")?,
                    field(self.modifier.clone(), "modifier")?,
                );
                for (name, value) in self.params.clone() {
                    action = action.with_param(name, value);
                }
                action
            }
            "RUN_COMMAND" => BlueprintAction::run_command(field(self.command.clone(), "command")?),
            other => return Err(invalid(format!("unknown action type '{other}'"))),
        };

        action.id = self.id;
        action.requires = self.requires;
        action.condition = self.condition;
        Ok(action)
    }
}

fn read_content_file(base: &Path, rel: &str) -> Result<String, String> {
    let rel_path = Path::new(rel);
    if rel_path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return Err(format!("content_file '{rel}' must stay inside the adapter directory"));
    }
    fs::read_to_string(base.join(rel_path))
        .map_err(|e| format!("failed to read content_file '{rel}': {e}"))
}

impl AdapterManifest {
    /// Convert into a registry entry. `base` is the manifest's directory.
    pub fn into_adapter(self, base: &Path) -> Result<LoadedAdapter, DomainError> {
        let section = self.adapter;

        let mut metadata =
            AdapterMetadata::new(section.category, section.id.clone(), section.name.clone())
                .describe(section.description)
                .version(section.version);
        metadata.requires = section.requires;
        metadata.conflicts = section.conflicts;
        metadata.capabilities = section.capabilities;
        metadata.path_overrides = section.path_overrides;

        let mut schema = ParameterSchema::new();
        for entry in self.parameters {
            let mut def = ParameterDef::new(entry.name, entry.param_type)
                .choices(entry.choices)
                .description(entry.description);
            if entry.required {
                def = def.required();
            }
            if let Some(default) = entry.default {
                def = def.default_value(default);
            }
            schema.insert(def);
        }

        let mut blueprint = Blueprint::new(section.id.clone(), section.name);
        for (index, entry) in self.actions.into_iter().enumerate() {
            blueprint = blueprint.with_action(entry.into_action(index, &section.id, base)?);
        }
        blueprint.validate()?;

        Ok(LoadedAdapter {
            metadata,
            parameter_schema: schema,
            blueprint,
        })
    }
}

// ── Loader ────────────────────────────────────────────────────────────────────

/// Loads adapters from every `adapter.toml` under a directory.
///
/// Manifests that fail to parse or convert emit a `WARN` log and are skipped;
/// they never prevent the others from loading.
pub struct ManifestLoader {
    adapters_dir: PathBuf,
}

impl ManifestLoader {
    pub fn new(adapters_dir: impl Into<PathBuf>) -> Self {
        Self {
            adapters_dir: adapters_dir.into(),
        }
    }

    /// Load every valid adapter, in path order.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidBlueprint`] if the directory is missing
    /// or cannot be walked.
    #[instrument(skip(self), fields(dir = %self.adapters_dir.display()))]
    pub fn load_all(&self) -> Result<Vec<LoadedAdapter>, DomainError> {
        if !self.adapters_dir.is_dir() {
            return Err(DomainError::InvalidBlueprint {
                blueprint: self.adapters_dir.display().to_string(),
                reason: "adapters directory not found".into(),
            });
        }

        let mut adapters = Vec::new();

        for entry in WalkDir::new(&self.adapters_dir)
            .min_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| DomainError::InvalidBlueprint {
                blueprint: self.adapters_dir.display().to_string(),
                reason: format!("directory walk error: {e}"),
            })?;
            if !entry.file_type().is_file()
                || entry.file_name() != std::ffi::OsStr::new(MANIFEST_FILE)
            {
                continue;
            }

            match load_manifest(entry.path()) {
                Ok(adapter) => {
                    debug!(key = %adapter.metadata.key(), "loaded adapter");
                    adapters.push(adapter);
                }
                Err(e) => {
                    warn!(
                        manifest = %entry.path().display(),
                        error = %e,
                        "skipping adapter manifest due to load error"
                    );
                }
            }
        }

        debug!(count = adapters.len(), "finished loading adapters");
        Ok(adapters)
    }
}

/// Parse one `adapter.toml` and convert it.
pub fn load_manifest(path: &Path) -> Result<LoadedAdapter, DomainError> {
    let invalid = |reason: String| DomainError::InvalidBlueprint {
        blueprint: path.display().to_string(),
        reason,
    };

    let raw = fs::read_to_string(path).map_err(|e| invalid(format!("failed to read: {e}")))?;
    let manifest: AdapterManifest =
        toml::from_str(&raw).map_err(|e| invalid(format!("failed to parse: {e}")))?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    manifest.into_adapter(base)
}

// ── Discovery ─────────────────────────────────────────────────────────────────

/// First existing local adapters directory: `$STRATA_ADAPTERS_DIR`,
/// `./adapters`, then `<exe>/adapters`.
#[instrument]
pub fn discover_dir() -> Option<PathBuf> {
    let found = candidate_paths().into_iter().find(|p| {
        debug!(path = %p.display(), "checking candidate adapters path");
        p.is_dir()
    });
    if let Some(dir) = &found {
        info!(path = %dir.display(), "using local adapters directory");
    }
    found
}

fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::with_capacity(3);

    if let Ok(env_dir) = std::env::var("STRATA_ADAPTERS_DIR") {
        paths.push(PathBuf::from(env_dir));
    }

    paths.push(PathBuf::from("adapters"));

    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|p| p.join("adapters")))
    {
        paths.push(exe_dir);
    }

    paths
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::domain::{ActionKind, SmartPathKey};
    use tempfile::TempDir;

    /// Write one adapter directory (manifest plus extra files) under `root`.
    fn write_adapter(root: &Path, name: &str, manifest: &str, files: &[(&str, &str)]) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(MANIFEST_FILE), manifest).unwrap();
        for (rel, content) in files {
            let full = dir.join(rel);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, content).unwrap();
        }
    }

    const CLERK: &str = r#"
[adapter]
id = "clerk"
name = "Clerk"
category = "auth"
requires = ["framework:nextjs"]
conflicts = ["better-auth"]

[[adapter.path_overrides]]
key = "auth_config"
value = "src/auth"
reason = "top-level auth folder"

[[parameters]]
name = "sign_in_url"
type = "string"
default = "/sign-in"

[[parameters]]
name = "theme"
type = "select"
choices = ["light", "dark"]
required = true

[[actions]]
type = "ADD_CONTENT"
id = "middleware"
target = "src/middleware.ts"
content_file = "files/middleware.ts"

[[actions]]
type = "ENHANCE_FILE"
path = ".gitignore"
modifier = "line-appender"
requires = ["middleware"]
params = { lines = [".clerk"] }

[[actions]]
type = "run-command"
command = "npm install @clerk/nextjs"
condition = "{{module.parameters.install}}"
"#;

    #[test]
    fn loads_full_manifest() {
        let temp = TempDir::new().unwrap();
        write_adapter(
            temp.path(),
            "clerk",
            CLERK,
            &[("files/middleware.ts", "export { default } from '@clerk/nextjs';\n")],
        );

        let adapters = ManifestLoader::new(temp.path()).load_all().unwrap();
        assert_eq!(adapters.len(), 1);
        let clerk = &adapters[0];

        assert_eq!(clerk.metadata.key().to_string(), "auth:clerk");
        assert_eq!(clerk.metadata.version, "1.0.0");
        assert_eq!(clerk.metadata.requires, vec![Requirement::AnyOf(ModuleCategory::Framework)]);
        assert_eq!(clerk.metadata.path_overrides[0].key, SmartPathKey::AuthConfig);

        assert_eq!(clerk.parameter_schema.len(), 2);
        assert!(clerk.parameter_schema.get("theme").unwrap().required);

        let actions = &clerk.blueprint.actions;
        assert_eq!(actions.len(), 3);
        match &actions[0].kind {
            ActionKind::AddContent { target, content } => {
                assert_eq!(target, "src/middleware.ts");
                assert!(content.contains("@clerk/nextjs"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(actions[1].requires, vec!["middleware"]);
        assert!(matches!(actions[2].kind, ActionKind::RunCommand { .. }));
        assert!(actions[2].condition.is_some());
    }

    #[test]
    fn missing_dir_is_an_error() {
        let loader = ManifestLoader::new("/absolutely/does/not/exist");
        assert!(matches!(loader.load_all(), Err(DomainError::InvalidBlueprint { .. })));
    }

    #[test]
    fn bad_manifest_is_skipped() {
        let temp = TempDir::new().unwrap();
        write_adapter(temp.path(), "clerk", CLERK, &[("files/middleware.ts", "x")]);
        write_adapter(temp.path(), "broken", "[adapter]\nid = 'x'\n", &[]);

        let adapters = ManifestLoader::new(temp.path()).load_all().unwrap();
        assert_eq!(adapters.len(), 1);
    }

    #[test]
    fn nested_directories_are_discovered() {
        let temp = TempDir::new().unwrap();
        write_adapter(
            temp.path(),
            "tooling/biome",
            "[adapter]\nid = \"biome\"\nname = \"Biome\"\ncategory = \"tooling\"\n",
            &[],
        );

        let adapters = ManifestLoader::new(temp.path()).load_all().unwrap();
        assert_eq!(adapters[0].metadata.id, "biome");
        assert!(adapters[0].blueprint.is_empty());
    }

    #[test]
    fn content_file_cannot_escape_adapter_dir() {
        let temp = TempDir::new().unwrap();
        let manifest = r#"
[adapter]
id = "sneaky"
name = "Sneaky"
category = "tooling"

[[actions]]
type = "ADD_CONTENT"
target = "x"
content_file = "../secret"
"#;
        write_adapter(temp.path(), "sneaky", manifest, &[]);

        let err = load_manifest(&temp.path().join("sneaky").join(MANIFEST_FILE)).unwrap_err();
        assert!(err.to_string().contains("inside the adapter directory"));
    }

    #[test]
    fn unknown_action_type_is_rejected() {
        let temp = TempDir::new().unwrap();
        let manifest = "[adapter]\nid = \"x\"\nname = \"X\"\ncategory = \"tooling\"\n\n[[actions]]\ntype = \"DELETE\"\n";
        write_adapter(temp.path(), "x", manifest, &[]);

        let err = load_manifest(&temp.path().join("x").join(MANIFEST_FILE)).unwrap_err();
        assert!(err.to_string().contains("unknown action type"));
    }
}
