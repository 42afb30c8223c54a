//! Implementation of the `strata add` command.

use tracing::{info, instrument};

use strata_core::domain::ModuleRef;

use crate::{
    cli::{AddArgs, global::GlobalArgs},
    commands::{RunContext, apply_options, apply_params, build_registry, resolve_module},
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
    project_state::ProjectState,
};

/// Add modules to the project at `--path`.
///
/// Modules the project already has are reported and left out; they still
/// satisfy the requirements of the new ones.
#[instrument(skip_all, fields(path = %args.path.display()))]
pub fn execute(
    args: AddArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let state = ProjectState::load(&args.path)?;
    let registry = build_registry(&config)?;

    let mut recipe = state.base_recipe(&args.path);
    for spec in &args.modules {
        let key = resolve_module(registry.as_ref(), spec)?;
        if recipe.project.installed.contains(&key) {
            output.info(&format!("{key} is already installed"))?;
            continue;
        }
        if recipe.module(&key).is_none() {
            recipe.modules.push(ModuleRef::new(key.category, key.id));
        }
    }

    if recipe.modules.is_empty() {
        output.info("Nothing to add")?;
        return Ok(());
    }

    apply_params(&mut recipe, &args.run.params)?;
    apply_options(&mut recipe, &args.run, &global, &config);
    // `git init` only runs when a project is first created.
    recipe.options.skip_git = true;

    info!(
        modules = recipe.modules.len(),
        installed = recipe.project.installed.len(),
        "Adding modules"
    );

    let ctx = RunContext {
        registry,
        global: &global,
        config: &config,
        output: &output,
    };

    match ctx.execute(&recipe, &args.run)? {
        Some(report) => ctx.finish(&recipe, &report, state),
        None => Ok(()),
    }
}
