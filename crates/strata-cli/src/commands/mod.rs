//! Command handlers.
//!
//! Each handler turns parsed arguments into a [`Recipe`], hands it to the
//! core [`Orchestrator`] and renders the report.  The helpers below are the
//! parts `new`, `add` and `scale` share.

pub mod add;
pub mod completions;
pub mod config;
pub mod list;
pub mod list_genomes;
pub mod new;
pub mod scale;

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use strata_adapters::{
    InMemoryAdapterRegistry, LocalFilesystem, MemoryFilesystem, ProcessRunner, RecordingRunner,
    genomes, registry::manifest,
};
use strata_core::{
    application::{AdapterRegistry, Orchestrator, RecipeExecutionReport},
    domain::{ExecutionPlan, ModuleKey, ParameterValue, Recipe},
    error::StrataError,
};

use crate::{
    cli::{GlobalArgs, OutputFormat, RunArgs},
    config::AppConfig,
    error::{CliError, CliResult},
    interrupt,
    output::OutputManager,
    progress::ProgressObserver,
    project_state::ProjectState,
};

// ── Registry ──────────────────────────────────────────────────────────────────

/// Built-in adapters plus any local manifests.
///
/// `adapters.local_path` from the config wins over discovery and must exist.
#[instrument(skip_all)]
pub fn build_registry(config: &AppConfig) -> CliResult<Arc<InMemoryAdapterRegistry>> {
    let registry = InMemoryAdapterRegistry::with_builtin()?;

    let dir = config.adapters.local_path.clone().or_else(manifest::discover_dir);
    if let Some(dir) = dir {
        let loaded = registry.load_dir(&dir)?;
        info!(path = %dir.display(), loaded, "Local adapters registered");
    }

    debug!(adapters = registry.len(), "Adapter registry ready");
    Ok(Arc::new(registry))
}

// ── Module & parameter resolution ─────────────────────────────────────────────

/// Resolve `category:id`, or a bare id that names exactly one adapter.
pub fn resolve_module(registry: &dyn AdapterRegistry, spec: &str) -> CliResult<ModuleKey> {
    if spec.contains(':') {
        let key = ModuleKey::parse(spec).map_err(StrataError::from)?;
        return match registry.metadata(&key) {
            Some(_) => Ok(key),
            None => Err(CliError::UnknownModule { module: spec.into() }),
        };
    }

    let matches: Vec<ModuleKey> = registry
        .list()
        .iter()
        .map(|m| m.key())
        .filter(|k| k.id == spec)
        .collect();

    match matches.as_slice() {
        [] => Err(CliError::UnknownModule { module: spec.into() }),
        [key] => Ok(key.clone()),
        many => Err(CliError::AmbiguousModule {
            id: spec.into(),
            matches: many.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "),
        }),
    }
}

/// One `--param MODULE.NAME=VALUE` override.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamOverride {
    pub module: String,
    pub name: String,
    pub value: ParameterValue,
}

pub fn parse_param(raw: &str) -> CliResult<ParamOverride> {
    let invalid = |reason: &str| CliError::InvalidInput {
        message: format!("--param '{raw}': {reason}"),
        source: None,
    };

    let (lhs, value) = raw.split_once('=').ok_or_else(|| invalid("expected MODULE.NAME=VALUE"))?;
    let (module, name) = lhs
        .rsplit_once('.')
        .ok_or_else(|| invalid("expected MODULE.NAME before '='"))?;
    if module.is_empty() || name.is_empty() {
        return Err(invalid("module and parameter name must not be empty"));
    }

    Ok(ParamOverride {
        module: module.to_string(),
        name: name.to_string(),
        value: parse_value(value),
    })
}

/// Booleans, numbers and JSON arrays/objects are typed; anything else is a string.
fn parse_value(raw: &str) -> ParameterValue {
    match raw {
        "true" => return ParameterValue::Boolean(true),
        "false" => return ParameterValue::Boolean(false),
        _ => {}
    }
    if let Ok(number) = raw.parse::<f64>() {
        return ParameterValue::Number(number);
    }
    if raw.starts_with('[') || raw.starts_with('{') {
        let parsed: Option<serde_json::Value> = serde_json::from_str(raw).ok();
        if let Some(value) = parsed.as_ref().and_then(ParameterValue::from_json) {
            return value;
        }
    }
    ParameterValue::String(raw.to_string())
}

/// Apply `--param` overrides to modules already in `recipe`.
pub fn apply_params(recipe: &mut Recipe, raw: &[String]) -> CliResult<()> {
    for entry in raw {
        let param = parse_param(entry)?;
        let position = if param.module.contains(':') {
            let key = ModuleKey::parse(&param.module).map_err(StrataError::from)?;
            recipe.modules.iter().position(|m| m.key() == key)
        } else {
            recipe.modules.iter().position(|m| m.id == param.module)
        };

        let index = position.ok_or_else(|| CliError::InvalidInput {
            message: format!("--param '{entry}' names a module that is not part of this run"),
            source: None,
        })?;
        debug!(module = %recipe.modules[index].key(), name = %param.name, "Parameter override");
        recipe.modules[index].parameters.insert(param.name, param.value);
    }
    Ok(())
}

/// Fold CLI flags and config defaults into the recipe's options.
pub fn apply_options(recipe: &mut Recipe, run: &RunArgs, global: &GlobalArgs, config: &AppConfig) {
    let options = &mut recipe.options;
    options.skip_install |= run.skip_install || config.defaults.skip_install;
    options.skip_git |= run.skip_git || config.defaults.skip_git;
    options.verbose |= global.verbose > 0;
}

pub fn find_genome(name: &str) -> CliResult<genomes::Genome> {
    genomes::find(name).ok_or_else(|| CliError::GenomeNotFound { name: name.into() })
}

// ── Execution ─────────────────────────────────────────────────────────────────

/// Shared state for a recipe-executing command.
pub struct RunContext<'a> {
    pub registry: Arc<InMemoryAdapterRegistry>,
    pub global: &'a GlobalArgs,
    pub config: &'a AppConfig,
    pub output: &'a OutputManager,
}

impl RunContext<'_> {
    /// Plan, confirm, then run (or preview) `recipe`.
    ///
    /// Returns `Ok(None)` for a dry run.  A finished run is returned even
    /// when modules failed; [`Self::finish`] turns that into the exit status.
    #[instrument(skip_all, fields(project = %recipe.project.name, dry_run = run.dry_run))]
    pub fn execute(
        &self,
        recipe: &Recipe,
        run: &RunArgs,
    ) -> CliResult<Option<RecipeExecutionReport>> {
        let plan = self
            .orchestrator_for_planning()
            .plan(recipe)
            .map_err(|errors| CliError::Planning { errors })?;
        self.show_plan(recipe, &plan)?;

        if run.dry_run {
            self.preview(recipe)?;
            return Ok(None);
        }

        let interactive = self.global.is_interactive(self.output.format());
        if !run.yes && interactive && !confirm()? {
            return Err(CliError::Cancelled);
        }

        let observer =
            ProgressObserver::new(interactive && self.output.format() == OutputFormat::Human);
        let orchestrator = Orchestrator::new(
            self.registry.clone(),
            Arc::new(LocalFilesystem::new()),
            Arc::new(ProcessRunner::new()),
        )
        .with_cancellation(interrupt::cancellation_flag());
        let report = orchestrator.run_with_observer(recipe, &observer);
        info!(success = report.is_success(), modules = report.modules.len(), "Run finished");

        self.output.report(&report)?;
        Ok(Some(report))
    }

    fn orchestrator_for_planning(&self) -> Orchestrator {
        Orchestrator::new(
            self.registry.clone(),
            Arc::new(MemoryFilesystem::new()),
            Arc::new(RecordingRunner::new()),
        )
    }

    fn show_plan(&self, recipe: &Recipe, plan: &ExecutionPlan) -> CliResult<()> {
        if self.output.format() == OutputFormat::Json {
            return Ok(());
        }
        self.output.header(&format!(
            "Plan for '{}' in {}",
            recipe.project.name,
            recipe.project_root().display()
        ))?;
        for (position, key) in plan.order.iter().enumerate() {
            self.output.print(&format!("  {}. {key}", position + 1))?;
        }
        if !recipe.project.installed.is_empty() {
            let installed: Vec<String> =
                recipe.project.installed.iter().map(ToString::to_string).collect();
            self.output.print(&format!("  already installed: {}", installed.join(", ")))?;
        }
        Ok(())
    }

    /// Run against an in-memory overlay and list what would change.
    fn preview(&self, recipe: &Recipe) -> CliResult<()> {
        let memory = Arc::new(MemoryFilesystem::overlay());
        let runner = Arc::new(RecordingRunner::new());
        let report =
            Orchestrator::new(self.registry.clone(), memory.clone(), runner.clone()).run(recipe);

        if self.output.format() == OutputFormat::Json {
            self.output.json(&report)?;
            return Ok(());
        }

        let root = recipe.project_root();
        self.output.info("Dry run: nothing was written")?;
        for path in report.files_written() {
            let shown = path.strip_prefix(&root).unwrap_or(path);
            self.output.print(&format!("  write  {}", shown.display()))?;
        }
        for command in runner.calls() {
            self.output.print(&format!("  run    {command}"))?;
        }
        for error in report.errors() {
            self.output.warning(&error.to_string())?;
        }
        Ok(())
    }

    /// Save project state for whatever succeeded, print next steps, and map
    /// an incomplete run to an error.
    pub fn finish(
        &self,
        recipe: &Recipe,
        report: &RecipeExecutionReport,
        mut state: ProjectState,
    ) -> CliResult<()> {
        let root = recipe.project_root();
        if report.succeeded().next().is_some() {
            state.record(recipe, report);
            state.save(&root)?;
        }

        if let Some(err) = incomplete_run(report) {
            return Err(err);
        }

        if self.output.format() != OutputFormat::Json {
            self.output.success(&format!(
                "'{}' ready: {} module(s), {} file(s)",
                recipe.project.name,
                report.modules.len(),
                report.files_written().len()
            ))?;
            self.next_steps(recipe, report, &root)?;
        }
        Ok(())
    }

    fn next_steps(
        &self,
        recipe: &Recipe,
        report: &RecipeExecutionReport,
        root: &Path,
    ) -> CliResult<()> {
        let dependencies = report.dependencies_to_install();
        if recipe.options.skip_install || dependencies.is_empty() {
            return Ok(());
        }
        self.output.print("")?;
        self.output.print("Next steps:")?;
        self.output.print(&format!("  cd {}", root.display()))?;
        self.output.print(&format!("  {} install", self.config.defaults.package_manager))?;
        Ok(())
    }
}

/// The error an unfinished run exits with, if any.
fn incomplete_run(report: &RecipeExecutionReport) -> Option<CliError> {
    if report.has_fatal_errors() {
        return Some(fatal_error(report));
    }

    let total = report.modules.len();
    if report.cancelled {
        return Some(CliError::Interrupted {
            completed: report.succeeded().count(),
            total,
        });
    }

    if !report.is_success() {
        let failed = report.modules.iter().filter(|r| !r.is_success()).count();
        return Some(CliError::ModulesFailed { failed, total });
    }
    None
}

fn fatal_error(report: &RecipeExecutionReport) -> CliError {
    match report.fatal_errors.as_slice() {
        [single] if !single.is_structural() => CliError::Core(single.clone()),
        errors => CliError::Planning { errors: errors.to_vec() },
    }
}

// ── Prompt ────────────────────────────────────────────────────────────────────

#[cfg(feature = "interactive")]
fn confirm() -> CliResult<bool> {
    use std::io::IsTerminal as _;

    if !std::io::stdin().is_terminal() {
        return confirm_line();
    }
    dialoguer::Confirm::new()
        .with_prompt("Continue?")
        .default(true)
        .interact()
        .map_err(|e| CliError::IoError {
            message: "failed to read confirmation".into(),
            source: std::io::Error::other(e),
        })
}

#[cfg(not(feature = "interactive"))]
fn confirm() -> CliResult<bool> {
    confirm_line()
}

/// Line-based prompt; an empty answer (or closed stdin) means yes.
fn confirm_line() -> CliResult<bool> {
    use std::io::{self, Write};

    print!("Continue? [Y/n] ");
    io::stdout().flush().map_err(|e| CliError::IoError {
        message: "failed to flush stdout".into(),
        source: e,
    })?;

    let mut input = String::new();
    io::stdin().read_line(&mut input).map_err(|e| CliError::IoError {
        message: "failed to read confirmation input".into(),
        source: e,
    })?;

    let input = input.trim().to_ascii_lowercase();
    Ok(input.is_empty() || input == "y" || input == "yes")
}

// ── tests ─────────────────────────────────────────────────────────────────────
