//! Integration tests for the strata binary.

use std::{fs, path::Path};

use assert_cmd::{Command, cargo};
use predicates::prelude::*;
use tempfile::TempDir;

const NEXT_ONLY: &str = r#"
version: "1.0"
project:
  name: my-app
modules:
  - id: nextjs
    category: framework
"#;

/// A `strata` invocation isolated from the user's config and environment.
fn strata(cwd: &Path) -> Command {
    let mut cmd = cargo::cargo_bin_cmd!("strata");
    cmd.current_dir(cwd)
        .env("HOME", cwd)
        .env("XDG_CONFIG_HOME", cwd.join(".config"))
        .env_remove("RUST_LOG")
        .env_remove("STRATA_ADAPTERS_DIR")
        .env_remove("STRATA_LOG_FILE")
        .env_remove("NO_COLOR")
        .args(["--output-format", "plain"]);
    cmd
}

fn write_recipe(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn test_version_flag() {
    let temp = TempDir::new().unwrap();
    strata(temp.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_new_command_help() {
    let temp = TempDir::new().unwrap();
    strata(temp.path())
        .args(["new", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--genome"))
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--param"));
}

#[test]
fn test_list_genomes() {
    let temp = TempDir::new().unwrap();
    strata(temp.path())
        .args(["list-genomes", "--format", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("saas-starter"))
        .stdout(predicate::str::contains("blog"));
}

#[test]
fn test_list_adapters_as_json() {
    let temp = TempDir::new().unwrap();
    let output = strata(temp.path())
        .args(["list", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let adapters: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let keys: Vec<&str> = adapters
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|a| a["key"].as_str())
        .collect();
    assert!(keys.contains(&"database:drizzle"), "{keys:?}");
    assert!(keys.contains(&"framework:nextjs"), "{keys:?}");
}

#[test]
fn test_list_describes_one_adapter() {
    let temp = TempDir::new().unwrap();
    strata(temp.path())
        .args(["list", "payment:stripe"])
        .assert()
        .success()
        .stdout(predicate::str::contains("webhooks"));
}

#[test]
fn test_dry_run_writes_nothing() {
    let temp = TempDir::new().unwrap();
    strata(temp.path())
        .args(["new", "my-blog", "--genome", "blog", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("package.json"));

    assert!(!temp.path().join("my-blog").exists());
}

#[test]
fn test_new_then_add() {
    let temp = TempDir::new().unwrap();
    let recipe = write_recipe(temp.path(), "recipe.yaml", NEXT_ONLY);

    strata(temp.path())
        .arg("new")
        .arg(&recipe)
        .args(["--yes", "--skip-git", "--skip-install"])
        .assert()
        .success();

    let project = temp.path().join("my-app");
    assert!(project.join("package.json").exists());
    assert!(project.join(".strata/project.json").exists());
    assert!(!project.join(".git").exists());

    strata(temp.path())
        .args(["add", "payment:stripe", "--yes", "--skip-install"])
        .args(["-p", "stripe.webhooks=false", "--path"])
        .arg(&project)
        .assert()
        .success();

    assert!(project.join("src/lib/payment/config/index.ts").exists());
    assert!(!project.join("src/app/api/webhooks/stripe/route.ts").exists());

    let package = fs::read_to_string(project.join("package.json")).unwrap();
    assert!(package.contains("\"next\""), "{package}");
    assert!(package.contains("\"stripe\""), "{package}");

    let state = fs::read_to_string(project.join(".strata/project.json")).unwrap();
    assert!(state.contains("stripe"), "{state}");
}

#[test]
fn test_add_skips_installed_module() {
    let temp = TempDir::new().unwrap();
    let recipe = write_recipe(temp.path(), "recipe.yaml", NEXT_ONLY);

    strata(temp.path())
        .arg("new")
        .arg(&recipe)
        .args(["--yes", "--skip-git", "--skip-install"])
        .assert()
        .success();

    strata(temp.path())
        .args(["add", "nextjs", "--yes", "--path", "my-app"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to add"));
}

#[test]
fn test_new_refuses_non_empty_directory() {
    let temp = TempDir::new().unwrap();
    let recipe = write_recipe(temp.path(), "recipe.yaml", NEXT_ONLY);
    fs::create_dir(temp.path().join("my-app")).unwrap();
    fs::write(temp.path().join("my-app/keep.txt"), "x").unwrap();

    strata(temp.path())
        .arg("new")
        .arg(&recipe)
        .args(["--yes", "--skip-git"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_config_path() {
    let temp = TempDir::new().unwrap();
    strata(temp.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("toml"));
}

#[test]
fn test_config_get() {
    let temp = TempDir::new().unwrap();
    strata(temp.path())
        .args(["config", "get", "defaults.package_manager"])
        .assert()
        .success()
        .stdout(predicate::str::contains("npm"));
}

#[test]
fn test_completions() {
    let temp = TempDir::new().unwrap();
    strata(temp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("strata"));
}
