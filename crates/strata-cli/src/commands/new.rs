//! Implementation of the `strata new` command.
//!
//! Responsibility: build a [`Recipe`] from a recipe file or a genome, apply
//! CLI overrides, and hand it to the shared run flow.  No business logic
//! lives here.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use strata_adapters::load_recipe;
use strata_core::domain::Recipe;

use crate::{
    cli::{NewArgs, global::GlobalArgs},
    commands::{RunContext, apply_options, apply_params, build_registry, find_genome},
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
    project_state::ProjectState,
};

/// Execute the `strata new` command.
///
/// 1. Build the recipe (file or genome)
/// 2. Apply `--output`, `--param` and option flags
/// 3. Refuse a non-empty project directory unless `--force`
/// 4. Plan, confirm and run (or preview with `--dry-run`)
/// 5. Record the project state and report
#[instrument(skip_all, fields(target = %args.target))]
pub fn execute(
    args: NewArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let mut recipe = build_recipe(&args)?;
    validate_project_name(&recipe.project.name)?;

    apply_params(&mut recipe, &args.run.params)?;
    apply_options(&mut recipe, &args.run, &global, &config);

    let root = recipe.project_root();
    debug!(
        project = %recipe.project.name,
        root = %root.display(),
        modules = recipe.modules.len(),
        "Recipe ready"
    );

    if !args.run.dry_run && !args.force && is_non_empty_dir(&root) {
        return Err(CliError::ProjectExists { path: root });
    }

    let ctx = RunContext {
        registry: build_registry(&config)?,
        global: &global,
        config: &config,
        output: &output,
    };

    match ctx.execute(&recipe, &args.run)? {
        Some(report) => ctx.finish(&recipe, &report, ProjectState::new(&recipe)),
        None => Ok(()),
    }
}

fn build_recipe(args: &NewArgs) -> CliResult<Recipe> {
    let mut recipe = match &args.genome {
        Some(genome) => {
            let (name, path) = resolve_project_path(&args.target)?;
            let mut recipe = find_genome(genome)?.to_recipe(&name);
            recipe.project.path = Some(path);
            recipe
        }
        None => load_recipe(Path::new(&args.target))?,
    };

    if let Some(dir) = &args.output {
        recipe.project.path = Some(dir.clone());
    }
    Ok(recipe)
}

// ── Path resolution ───────────────────────────────────────────────────────────

/// Split `path/to/name` into the project name and the project directory.
pub fn resolve_project_path(name: &str) -> CliResult<(String, PathBuf)> {
    let path = Path::new(name);

    let project_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| CliError::InvalidProjectName {
            name: name.into(),
            reason: "cannot extract valid project name".into(),
        })?
        .to_string();

    Ok((project_name, path.to_path_buf()))
}

fn validate_project_name(name: &str) -> CliResult<()> {
    if name.trim().is_empty() {
        return Err(CliError::InvalidProjectName {
            name: name.into(),
            reason: "name cannot be empty".into(),
        });
    }
    if name.starts_with('.') {
        return Err(CliError::InvalidProjectName {
            name: name.into(),
            reason: "name cannot start with '.'".into(),
        });
    }
    if name.contains('/') || name.contains('\\') {
        return Err(CliError::InvalidProjectName {
            name: name.into(),
            reason: "name cannot contain path separators".into(),
        });
    }
    Ok(())
}

fn is_non_empty_dir(path: &Path) -> bool {
    fs::read_dir(path).map(|mut entries| entries.next().is_some()).unwrap_or(false)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::RunArgs;
    use tempfile::TempDir;

    fn new_args(target: &str, genome: Option<&str>) -> NewArgs {
        NewArgs {
            target: target.into(),
            genome: genome.map(Into::into),
            output: None,
            force: false,
            run: RunArgs {
                params: Vec::new(),
                dry_run: true,
                yes: true,
                skip_install: false,
                skip_git: false,
            },
        }
    }

    #[test]
    fn simple_name_resolves_to_relative_dir() {
        let (name, path) = resolve_project_path("my-app").unwrap();
        assert_eq!(name, "my-app");
        assert_eq!(path, PathBuf::from("my-app"));
    }

    #[test]
    fn nested_path_keeps_last_component_as_name() {
        let (name, path) = resolve_project_path("work/clients/acme").unwrap();
        assert_eq!(name, "acme");
        assert_eq!(path, PathBuf::from("work/clients/acme"));
    }

    #[test]
    fn names_with_spaces_are_allowed() {
        assert!(validate_project_name("Acme Cloud").is_ok());
        assert!(validate_project_name(".hidden").is_err());
        assert!(validate_project_name("  ").is_err());
    }

    #[test]
    fn genome_recipe_targets_the_given_dir() {
        let recipe = build_recipe(&new_args("sites/journal", Some("blog"))).unwrap();
        assert_eq!(recipe.project.name, "journal");
        assert_eq!(recipe.project_root(), PathBuf::from("sites/journal"));
        assert_eq!(recipe.genome.as_ref().unwrap().name, "blog");
    }

    #[test]
    fn output_flag_overrides_recipe_path() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("recipe.yaml");
        fs::write(
            &file,
            "version: '1.0'\nproject:\n  name: api\n  path: ./elsewhere\nmodules:\n  - id: nextjs\n    category: framework\n",
        )
        .unwrap();

        let mut args = new_args(file.to_str().unwrap(), None);
        args.output = Some(temp.path().join("api"));

        let recipe = build_recipe(&args).unwrap();
        assert_eq!(recipe.project_root(), temp.path().join("api"));
    }

    #[test]
    fn unknown_genome_fails() {
        assert!(matches!(
            build_recipe(&new_args("x", Some("mobile"))),
            Err(CliError::GenomeNotFound { .. })
        ));
    }

    #[test]
    fn empty_dir_is_not_an_existing_project() {
        let temp = TempDir::new().unwrap();
        assert!(!is_non_empty_dir(temp.path()));
        assert!(!is_non_empty_dir(&temp.path().join("missing")));
        fs::write(temp.path().join("README.md"), "x").unwrap();
        assert!(is_non_empty_dir(temp.path()));
    }
}
