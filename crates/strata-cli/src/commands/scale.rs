//! Implementation of the `strata scale` command.

use tracing::{info, instrument};

use strata_adapters::load_recipe;
use strata_core::domain::{ModuleRef, Recipe};

use crate::{
    cli::{ScaleArgs, global::GlobalArgs},
    commands::{RunContext, apply_options, apply_params, build_registry, find_genome},
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
    project_state::ProjectState,
};

/// Apply the modules of a recipe or genome to the project at `--path`.
///
/// The existing project spec (name, layout, paths) wins; the source only
/// contributes its modules, their parameters, and path defaults the project
/// does not set already.
#[instrument(skip_all, fields(path = %args.path.display()))]
pub fn execute(
    args: ScaleArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let state = ProjectState::load(&args.path)?;
    let source = load_source(&args, &state.project.name)?;

    let mut recipe = state.base_recipe(&args.path);
    let skipped = merge_source(&mut recipe, source);
    for module in &skipped {
        output.info(&format!("{} is already installed", module.key()))?;
    }

    if recipe.modules.is_empty() {
        output.info("Nothing to scale: every module is already installed")?;
        return Ok(());
    }

    apply_params(&mut recipe, &args.run.params)?;
    apply_options(&mut recipe, &args.run, &global, &config);
    recipe.options.skip_git = true;

    info!(modules = recipe.modules.len(), skipped = skipped.len(), "Scaling project");

    let ctx = RunContext {
        registry: build_registry(&config)?,
        global: &global,
        config: &config,
        output: &output,
    };

    match ctx.execute(&recipe, &args.run)? {
        Some(report) => ctx.finish(&recipe, &report, state),
        None => Ok(()),
    }
}

fn load_source(args: &ScaleArgs, project_name: &str) -> CliResult<Recipe> {
    match (&args.recipe, &args.genome) {
        (Some(path), _) => Ok(load_recipe(path)?),
        (None, Some(genome)) => Ok(find_genome(genome)?.to_recipe(project_name)),
        (None, None) => Err(CliError::InvalidInput {
            message: "a recipe file or --genome is required".into(),
            source: None,
        }),
    }
}

/// Move `source`'s modules into `recipe`, returning the ones already installed.
fn merge_source(recipe: &mut Recipe, source: Recipe) -> Vec<ModuleRef> {
    let mut skipped = Vec::new();
    for module in source.modules {
        if recipe.project.installed.contains(&module.key()) {
            skipped.push(module);
        } else {
            recipe.modules.push(module);
        }
    }

    for (key, value) in source.project.paths {
        recipe.project.paths.entry(key).or_insert(value);
    }
    if recipe.genome.is_none() {
        recipe.genome = source.genome;
    }
    recipe.options = source.options;
    skipped
}
