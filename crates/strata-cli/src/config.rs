//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value.  The
//! CLI layer owns config; the core crate never sees it.
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (handled at the call-site, not here)
//! 2. Environment variables: `STRATA_<SECTION>__<KEY>`, e.g.
//!    `STRATA_DEFAULTS__SKIP_GIT=true`
//! 3. Config file (`--config`, or the platform config dir)
//! 4. Built-in defaults (always present)

use std::path::{Path, PathBuf};

use anyhow::Context;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Defaults applied to every recipe run.
    pub defaults: Defaults,
    /// Output settings.
    pub output: OutputConfig,
    /// Where to look for local adapter manifests.
    pub adapters: AdapterConfig,
    /// Log file settings.
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    /// Shown in the "next steps" hint after a run.
    pub package_manager: String,
    pub skip_install: bool,
    pub skip_git: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            package_manager: "npm".into(),
            skip_install: false,
            skip_git: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub no_color: bool,
    /// `auto`, `human`, `plain` or `json`; used when `--output-format` is auto.
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            no_color: false,
            format: "auto".into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Directory of `adapter.toml` manifests. When unset the usual discovery
    /// order applies (`$STRATA_ADAPTERS_DIR`, `./adapters`, next to the binary).
    pub local_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// JSON log file; `--log-file` takes precedence.
    pub file: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration, layering file and environment over the defaults.
    ///
    /// An explicit `config_file` must exist; the default location is optional.
    pub fn load(config_file: Option<&PathBuf>) -> anyhow::Result<Self> {
        let (path, required) = match config_file {
            Some(path) => (path.clone(), true),
            None => (Self::config_path(), false),
        };
        debug!(path = %path.display(), required, "Loading configuration");

        Self::builder(&path, required)?
            .add_source(
                Environment::with_prefix("STRATA")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Load from a single file, skipping the environment.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        Self::builder(path, true)?
            .build()
            .with_context(|| format!("Failed to read {}", path.display()))?
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    fn builder(
        path: &Path,
        required: bool,
    ) -> anyhow::Result<config::ConfigBuilder<config::builder::DefaultState>> {
        let defaults =
            Config::try_from(&Self::default()).context("Failed to encode default configuration")?;
        Ok(Config::builder()
            .add_source(defaults)
            .add_source(File::from(path).format(FileFormat::Toml).required(required)))
    }

    /// Path to the default configuration file.
    ///
    /// Uses `directories::ProjectDirs` for cross-platform correctness,
    /// falling back to `.strata.toml` in the current directory.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("dev", "strata", "strata")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(".strata.toml"))
    }

    /// Look up a dotted key such as `defaults.skip_git`.
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        let mut value = serde_json::to_value(self).ok()?;
        for part in key.split('.') {
            value = value.get(part)?.clone();
        }
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.defaults.package_manager, "npm");
        assert!(!cfg.defaults.skip_install);
        assert!(!cfg.output.no_color);
        assert!(cfg.adapters.local_path.is_none());
    }

    #[test]
    fn file_overrides_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            "[defaults]\npackage_manager = \"pnpm\"\nskip_git = true\n\n[adapters]\nlocal_path = \"/opt/adapters\"\n",
        )
        .unwrap();

        let cfg = AppConfig::from_file(&path).unwrap();
        assert_eq!(cfg.defaults.package_manager, "pnpm");
        assert!(cfg.defaults.skip_git);
        assert!(!cfg.defaults.skip_install);
        assert_eq!(cfg.adapters.local_path, Some(PathBuf::from("/opt/adapters")));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        assert!(AppConfig::load(Some(&temp.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "[defaults\nskip_git = ").unwrap();
        assert!(AppConfig::from_file(&path).is_err());
    }

    #[test]
    fn dotted_get() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.get("defaults.package_manager"), Some(serde_json::json!("npm")));
        assert_eq!(cfg.get("defaults.skip_git"), Some(serde_json::json!(false)));
        assert!(cfg.get("defaults.missing").is_none());
    }

    #[test]
    fn config_path_is_not_empty() {
        let p = AppConfig::config_path();
        assert!(!p.as_os_str().is_empty());
    }
}
