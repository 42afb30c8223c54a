//! Merge strategies for `ADD_CONTENT`.
//!
//! The target's file name picks the strategy:
//!
//! - `package.json`: deep JSON merge. Nested objects merge recursively,
//!   arrays and scalars from the new content replace existing ones.
//! - `.env`, `.env.*`: append only keys not yet present. Existing values are
//!   never touched.
//! - anything else: full replacement.

use std::path::Path;

use serde_json::{Map, Value};

use crate::domain::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    PackageManifest,
    EnvFile,
    Replace,
}

impl MergeStrategy {
    pub fn for_target(target: &str) -> Self {
        let file_name = Path::new(target)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();

        match file_name {
            "package.json" => Self::PackageManifest,
            ".env" => Self::EnvFile,
            name if name.starts_with(".env.") => Self::EnvFile,
            _ => Self::Replace,
        }
    }
}

// ── package.json ─────────────────────────────────────────────────────────────

/// Result of a manifest merge plus what it asked to install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestMerge {
    pub content: String,
    /// `name@version` for every entry in the new `dependencies` and
    /// `devDependencies`.
    pub dependencies: Vec<String>,
    /// Names of scripts the new content declares.
    pub scripts: Vec<String>,
}

pub fn merge_package_manifest(
    target: &str,
    existing: Option<&str>,
    incoming: &str,
) -> Result<ManifestMerge, DomainError> {
    let mut base = match existing {
        Some(text) if !text.trim().is_empty() => parse_object(target, text)?,
        _ => Value::Object(Map::new()),
    };
    let overlay = parse_object(target, incoming)?;

    let mut dependencies = Vec::new();
    for section in ["dependencies", "devDependencies"] {
        if let Some(Value::Object(entries)) = overlay.get(section) {
            for (name, version) in entries {
                match version.as_str() {
                    Some(v) => dependencies.push(format!("{name}@{v}")),
                    None => dependencies.push(name.clone()),
                }
            }
        }
    }
    let scripts = match overlay.get("scripts") {
        Some(Value::Object(entries)) => entries.keys().cloned().collect(),
        _ => Vec::new(),
    };

    deep_merge(&mut base, overlay);

    Ok(ManifestMerge {
        content: to_pretty_json(target, &base)?,
        dependencies,
        scripts,
    })
}

/// Merge `overlay` into `base`. Objects merge key by key; any other overlay
/// value replaces what is there.
pub fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

pub(crate) fn parse_object(target: &str, text: &str) -> Result<Value, DomainError> {
    let value: Value = serde_json::from_str(text).map_err(|e| DomainError::InvalidManifest {
        target: target.to_string(),
        reason: e.to_string(),
    })?;
    if !value.is_object() {
        return Err(DomainError::InvalidManifest {
            target: target.to_string(),
            reason: "expected a JSON object at the top level".into(),
        });
    }
    Ok(value)
}

/// Two-space indented JSON with a trailing newline.
pub(crate) fn to_pretty_json(target: &str, value: &Value) -> Result<String, DomainError> {
    let mut text = serde_json::to_string_pretty(value).map_err(|e| DomainError::InvalidManifest {
        target: target.to_string(),
        reason: e.to_string(),
    })?;
    text.push('\n');
    Ok(text)
}

// ── .env ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvMerge {
    pub content: String,
    pub added: Vec<String>,
    /// Keys from the new content that were already defined.
    pub kept: Vec<String>,
}

pub fn merge_env(existing: Option<&str>, incoming: &str) -> EnvMerge {
    let existing = existing.unwrap_or_default();
    let mut present: Vec<String> =
        existing.lines().filter_map(env_key).map(str::to_string).collect();

    let mut added = Vec::new();
    let mut kept = Vec::new();
    let mut appended = Vec::new();

    for line in incoming.lines() {
        let Some(key) = env_key(line) else {
            continue;
        };
        if present.iter().any(|k| k == key) {
            kept.push(key.to_string());
            continue;
        }
        present.push(key.to_string());
        added.push(key.to_string());
        appended.push(line.trim());
    }

    let mut content = existing.to_string();
    if !appended.is_empty() {
        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
        for line in appended {
            content.push_str(line);
            content.push('\n');
        }
    }

    EnvMerge {
        content,
        added,
        kept,
    }
}

/// Key of a `KEY=VALUE` line; `None` for blanks, comments and junk.
fn env_key(line: &str) -> Option<&str> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let line = line.strip_prefix("export ").unwrap_or(line);
    let (key, _) = line.split_once('=')?;
    let key = key.trim();
    (!key.is_empty()).then_some(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strategy_by_file_name() {
        assert_eq!(MergeStrategy::for_target("package.json"), MergeStrategy::PackageManifest);
        assert_eq!(
            MergeStrategy::for_target("apps/web/package.json"),
            MergeStrategy::PackageManifest
        );
        assert_eq!(MergeStrategy::for_target(".env"), MergeStrategy::EnvFile);
        assert_eq!(MergeStrategy::for_target(".env.example"), MergeStrategy::EnvFile);
        assert_eq!(MergeStrategy::for_target("src/.env.local"), MergeStrategy::EnvFile);
        assert_eq!(MergeStrategy::for_target("src/env.ts"), MergeStrategy::Replace);
        assert_eq!(MergeStrategy::for_target("README.md"), MergeStrategy::Replace);
    }

    #[test]
    fn manifest_merge_keeps_sibling_scripts() {
        let merged = merge_package_manifest(
            "package.json",
            Some(r#"{"scripts":{"dev":"x"}}"#),
            r#"{"scripts":{"build":"y"}}"#,
        )
        .unwrap();

        let value: Value = serde_json::from_str(&merged.content).unwrap();
        assert_eq!(value, json!({"scripts": {"dev": "x", "build": "y"}}));
        assert_eq!(merged.scripts, vec!["build"]);
    }

    #[test]
    fn manifest_merge_new_arrays_and_scalars_win() {
        let merged = merge_package_manifest(
            "package.json",
            Some(r#"{"name":"a","files":["dist"],"private":true}"#),
            r#"{"name":"b","files":["lib"]}"#,
        )
        .unwrap();
        let value: Value = serde_json::from_str(&merged.content).unwrap();
        assert_eq!(value, json!({"name": "b", "files": ["lib"], "private": true}));
    }

    #[test]
    fn manifest_merge_from_nothing_collects_dependencies() {
        let merged = merge_package_manifest(
            "package.json",
            None,
            r#"{"dependencies":{"drizzle-orm":"^0.30.0"},"devDependencies":{"drizzle-kit":"^0.20.0"}}"#,
        )
        .unwrap();
        assert_eq!(
            merged.dependencies,
            vec!["drizzle-orm@^0.30.0", "drizzle-kit@^0.20.0"]
        );
        assert!(merged.content.starts_with("{\n  \"dependencies\""));
        assert!(merged.content.ends_with("}\n"));
    }

    #[test]
    fn invalid_existing_manifest_is_reported() {
        let err = merge_package_manifest("package.json", Some("{oops"), "{}").unwrap_err();
        assert!(matches!(err, DomainError::InvalidManifest { .. }));

        let err = merge_package_manifest("package.json", None, "[1]").unwrap_err();
        assert!(matches!(err, DomainError::InvalidManifest { .. }));
    }

    #[test]
    fn env_merge_never_overwrites() {
        let merged = merge_env(Some("A=1"), "A=2\nB=3");
        assert_eq!(merged.content, "A=1\nB=3\n");
        assert_eq!(merged.added, vec!["B"]);
        assert_eq!(merged.kept, vec!["A"]);
    }

    #[test]
    fn env_merge_ignores_comments_and_blanks() {
        let merged = merge_env(
            Some("# secrets\nexport DATABASE_URL=postgres://me\n"),
            "\n# db\nDATABASE_URL=changeme\nAUTH_SECRET=\n",
        );
        assert_eq!(
            merged.content,
            "# secrets\nexport DATABASE_URL=postgres://me\nAUTH_SECRET=\n"
        );
    }

    #[test]
    fn env_merge_is_idempotent() {
        let once = merge_env(None, "A=1\nB=2\n").content;
        let twice = merge_env(Some(&once), "A=1\nB=2\n").content;
        assert_eq!(once, twice);
    }
}
