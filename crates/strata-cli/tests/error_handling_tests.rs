//! Tests for error handling, exit codes and suggestions.

use std::{fs, path::Path};

use assert_cmd::{Command, cargo};
use predicates::prelude::*;
use tempfile::TempDir;

fn strata(cwd: &Path) -> Command {
    let mut cmd = cargo::cargo_bin_cmd!("strata");
    cmd.current_dir(cwd)
        .env("HOME", cwd)
        .env("XDG_CONFIG_HOME", cwd.join(".config"))
        .env_remove("RUST_LOG")
        .env_remove("STRATA_ADAPTERS_DIR")
        .args(["--output-format", "plain"]);
    cmd
}

#[test]
fn test_unparseable_recipe_is_user_error() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("broken.yaml"), "project: [unclosed").unwrap();

    strata(temp.path())
        .args(["new", "broken.yaml", "--yes"])
        .assert()
        .code(2);
}

#[test]
fn test_unsupported_recipe_format() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("recipe.ini"), "name=x").unwrap();

    strata(temp.path())
        .args(["new", "recipe.ini", "--yes"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unsupported recipe format"));
}

#[test]
fn test_missing_recipe_file_is_not_found() {
    let temp = TempDir::new().unwrap();
    strata(temp.path())
        .args(["new", "nope.yaml", "--yes"])
        .assert()
        .code(3);
}

#[test]
fn test_unknown_genome() {
    let temp = TempDir::new().unwrap();
    strata(temp.path())
        .args(["new", "app", "--genome", "does-not-exist", "--yes"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Unknown genome"));

    assert!(!temp.path().join("app").exists());
}

#[test]
fn test_missing_framework_rejects_whole_recipe() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("recipe.yaml"),
        r#"
version: "1.0"
project:
  name: pay
modules:
  - id: stripe
    category: payment
"#,
    )
    .unwrap();

    strata(temp.path())
        .args(["new", "recipe.yaml", "--yes", "--skip-git"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Recipe rejected"));

    assert!(!temp.path().join("pay").exists());
}

#[test]
fn test_add_outside_project() {
    let temp = TempDir::new().unwrap();
    strata(temp.path())
        .args(["add", "payment:stripe", "--yes"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("No Strata project found"));
}

#[test]
fn test_invalid_project_name() {
    let temp = TempDir::new().unwrap();
    strata(temp.path())
        .args(["new", ".hidden", "--genome", "blog", "--yes"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid project name"));
}

#[test]
fn test_unknown_config_key() {
    let temp = TempDir::new().unwrap();
    strata(temp.path())
        .args(["config", "get", "no.such.key"])
        .assert()
        .code(4);
}

#[test]
fn test_missing_subcommand_is_usage_error() {
    let temp = TempDir::new().unwrap();
    strata(temp.path()).assert().code(2);
}
