//! Orchestrator - the main application use case.
//!
//! Drives one recipe run end to end:
//! 1. Validate the recipe shape
//! 2. Plan the module order from adapter metadata (blueprints are not loaded)
//! 3. Register smart path overrides from genome, adapters and the recipe
//! 4. For each module in order: load, resolve parameters, build the template
//!    context, execute the blueprint
//! 5. Initialise a git repository unless disabled
//!
//! Structural errors from steps 1 and 2 abort before anything is written.
//! Module failures are recorded and the run continues; modules that depend
//! on a failed module are skipped.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use crate::{
    application::{
        ApplicationError,
        ports::{
            AdapterRegistry, CommandRunner, CommandSpec, ExecutionObserver, Filesystem,
            NoopObserver,
        },
        report::{ExecutionResult, RecipeExecutionReport},
        services::blueprint_executor::{BlueprintExecutor, ExecutionContext},
    },
    domain::{
        ActionKind, Blueprint, DependencyPlanner, DomainValidator, ExecutionPlan, LoadedAdapter,
        ModifierRegistry, ModuleCategory, ModuleKey, ModuleRef, OverrideSource, ParameterResolver,
        PathContext, PathOverride, PlanNode, Recipe, SmartPathKey, SmartPathResolver,
        TemplateContext,
    },
    error::StrataError,
};

/// Set from another thread (a Ctrl-C handler, say) to stop before the next module.
pub type CancellationFlag = Arc<AtomicBool>;

pub struct Orchestrator {
    registry: Arc<dyn AdapterRegistry>,
    filesystem: Arc<dyn Filesystem>,
    runner: Arc<dyn CommandRunner>,
    executor: BlueprintExecutor,
    cancel: Option<CancellationFlag>,
}

impl Orchestrator {
    pub fn new(
        registry: Arc<dyn AdapterRegistry>,
        filesystem: Arc<dyn Filesystem>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        let executor = BlueprintExecutor::new(filesystem.clone(), runner.clone());
        Self {
            registry,
            filesystem,
            runner,
            executor,
            cancel: None,
        }
    }

    pub fn with_modifiers(mut self, modifiers: ModifierRegistry) -> Self {
        self.executor = self.executor.with_modifiers(modifiers);
        self
    }

    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Validate and order the recipe's modules without loading or writing
    /// anything. Every planning error is returned, not just the first.
    #[instrument(skip_all, fields(project = %recipe.project.name))]
    pub fn plan(&self, recipe: &Recipe) -> Result<ExecutionPlan, Vec<StrataError>> {
        DomainValidator::validate_recipe(recipe).map_err(|e| vec![StrataError::from(e)])?;

        let nodes: Vec<PlanNode> = recipe
            .modules
            .iter()
            .map(|m| {
                let key = m.key();
                match self.registry.metadata(&key) {
                    Some(metadata) => PlanNode::from_metadata(key, &metadata),
                    None => {
                        debug!(module = %key, "No metadata; planning without constraints");
                        PlanNode::bare(key)
                    }
                }
            })
            .collect();

        DependencyPlanner::plan(&nodes, &recipe.project.installed)
            .map_err(|errors| errors.into_iter().map(StrataError::from).collect())
    }

    pub fn run(&self, recipe: &Recipe) -> RecipeExecutionReport {
        self.run_with_observer(recipe, &NoopObserver)
    }

    /// Execute the recipe. Always returns a report; inspect
    /// [`RecipeExecutionReport::is_success`] for the outcome.
    #[instrument(skip_all, fields(project = %recipe.project.name))]
    pub fn run_with_observer(
        &self,
        recipe: &Recipe,
        observer: &dyn ExecutionObserver,
    ) -> RecipeExecutionReport {
        let started = Instant::now();
        let root = recipe.project_root();
        let mut report = RecipeExecutionReport::new(recipe.project.name.clone(), root.clone());

        let plan = match self.plan(recipe) {
            Ok(plan) => plan,
            Err(errors) => {
                warn!(count = errors.len(), "Recipe rejected before execution");
                report.fatal_errors = errors;
                return report;
            }
        };
        report.order = plan.order.clone();
        let order: Vec<String> = plan.order.iter().map(ToString::to_string).collect();
        info!(modules = plan.len(), ?order, "Execution plan ready");

        if let Err(e) = self.filesystem.create_dir_all(&root) {
            report.fatal_errors.push(e);
            return report;
        }

        let resolver = SmartPathResolver::new(self.path_overrides(recipe, &mut report));
        observer.run_started(plan.len());

        let mut broken: HashSet<ModuleKey> = HashSet::new();
        for (position, key) in plan.order.iter().enumerate() {
            let result = if self.is_cancelled() {
                ExecutionResult::skipped(key.clone(), ApplicationError::Cancelled.to_string())
            } else if let Some(dep) = plan.dependencies_of(key).find(|d| broken.contains(*d)) {
                info!(module = %key, dependency = %dep, "Skipping module");
                let reason = format!("dependency '{dep}' did not complete");
                ExecutionResult::skipped(key.clone(), reason)
            } else {
                observer.module_started(key, position);
                self.run_module(recipe, key, &resolver)
            };

            if !result.is_success() {
                broken.insert(key.clone());
            }
            observer.module_finished(&result);
            report.push(result);
        }

        report.cancelled = self.is_cancelled();
        if report.cancelled {
            warn!("Run interrupted; remaining modules skipped");
        } else if !recipe.options.skip_git {
            self.init_git(recipe, &mut report);
        }

        observer.run_finished();
        report.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            succeeded = report.succeeded().count(),
            failed = report.failed().count(),
            skipped = report.skipped().count(),
            "Recipe finished"
        );
        report
    }

    #[instrument(skip_all, fields(module = %key))]
    fn run_module(
        &self,
        recipe: &Recipe,
        key: &ModuleKey,
        resolver: &SmartPathResolver,
    ) -> ExecutionResult {
        let Some(module) = recipe.module(key) else {
            return ExecutionResult::failed(
                key.clone(),
                ApplicationError::AdapterNotFound {
                    category: key.category.to_string(),
                    id: key.id.clone(),
                },
            );
        };

        let loaded = match self.registry.load(key) {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!(error = %e, "Adapter could not be loaded");
                return ExecutionResult::failed(key.clone(), e);
            }
        };

        let schema = &loaded.parameter_schema;
        let resolution = match ParameterResolver::resolve(&key.id, &module.parameters, schema) {
            Ok(resolution) => resolution,
            Err(e) => return ExecutionResult::failed(key.clone(), e),
        };

        let monorepo = recipe.project.structure.is_monorepo();
        let path_ctx =
            PathContext::new(recipe.project_root(), monorepo).with_module(key.id.clone());
        let (paths, path_warnings) = resolver.resolve_all(&path_ctx);

        let mut template = project_context(recipe);
        template.insert("module.id", key.id.clone());
        template.insert("module.category", key.category.as_str());
        template.insert("module.version", module_version(module, &loaded));
        template.extend_prefixed("module.parameters", resolution.parameters.iter());
        template.extend_prefixed("paths", &paths);

        let ctx = ExecutionContext {
            module: key.clone(),
            project_root: recipe.project_root(),
            template,
            options: recipe.options,
        };

        let mut result = self.executor.execute(&loaded.blueprint, &ctx);

        for warning in resolution.warnings {
            warn!(%warning, "Parameter warning");
            result.warn(None, warning.to_string());
        }
        for warning in path_warnings {
            debug!(%warning, "Smart path override");
            if mentions_path(&loaded.blueprint, warning.key) {
                result.warn(None, warning.to_string());
            }
            result.path_overrides.push(warning);
        }
        result
    }

    /// Overrides in registration order: genome defaults, every selected or
    /// installed adapter's declarations, then the recipe's own paths.
    fn path_overrides(
        &self,
        recipe: &Recipe,
        report: &mut RecipeExecutionReport,
    ) -> Vec<PathOverride> {
        let mut overrides = Vec::new();

        if let Some(genome) = &recipe.genome {
            let reason = format!("genome '{}' default", genome.name);
            let source = OverrideSource::GenomeDefault;
            overrides.extend(parse_paths(&genome.paths, source, &reason, report));
        }

        let keys = recipe
            .project
            .installed
            .iter()
            .cloned()
            .chain(recipe.modules.iter().map(ModuleRef::key));
        for key in keys {
            if let Some(metadata) = self.registry.metadata(&key) {
                overrides.extend(metadata.path_overrides());
            }
        }

        overrides.extend(parse_paths(
            &recipe.project.paths,
            OverrideSource::User,
            "set in recipe",
            report,
        ));
        overrides
    }

    fn init_git(&self, recipe: &Recipe, report: &mut RecipeExecutionReport) {
        let root = recipe.project_root();
        if self.filesystem.exists(&root.join(".git")) {
            debug!("Git repository already present");
            return;
        }
        let spec = CommandSpec::new("git", root).arg("init");
        match self.runner.run(&spec) {
            Ok(output) if output.is_success() => info!("Initialised git repository"),
            Ok(output) => {
                warn!(stderr = %output.stderr.trim(), "git init failed");
                report.warnings.push(format!("git init failed: {}", output.stderr.trim()));
            }
            Err(e) => {
                warn!(error = %e, "git init could not run");
                report.warnings.push(format!("git init could not run: {e}"));
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }
}

fn project_context(recipe: &Recipe) -> TemplateContext {
    let framework = recipe
        .project
        .framework
        .clone()
        .or_else(|| {
            recipe
                .modules
                .iter()
                .map(ModuleRef::key)
                .chain(recipe.project.installed.iter().cloned())
                .find(|k| k.category == ModuleCategory::Framework)
                .map(|k| k.id)
        })
        .unwrap_or_default();

    TemplateContext::new(recipe.project.name.clone())
        .with("project.framework", framework)
        .with("project.path", recipe.project_root().display().to_string())
        .with("project.structure", recipe.project.structure.as_str())
}

fn module_version(module: &ModuleRef, loaded: &LoadedAdapter) -> String {
    module
        .version
        .clone()
        .unwrap_or_else(|| loaded.metadata.version.clone())
}

fn parse_paths<'a>(
    paths: &'a BTreeMap<String, String>,
    source: OverrideSource,
    reason: &'a str,
    report: &'a mut RecipeExecutionReport,
) -> impl Iterator<Item = PathOverride> + 'a {
    paths.iter().filter_map(move |(name, value)| match name.parse::<SmartPathKey>() {
        Ok(key) => Some(PathOverride::new(key, value.clone(), source, reason)),
        Err(e) => {
            warn!(error = %e, "Ignoring path override");
            report.warnings.push(e.to_string());
            None
        }
    })
}

/// Overrides a blueprint can observe also surface as warnings.
fn mentions_path(blueprint: &Blueprint, key: SmartPathKey) -> bool {
    let needle = format!("paths.{}", key.as_str());
    blueprint.actions.iter().any(|action| {
        action.kind.target().contains(&needle)
            || action.condition.as_deref().is_some_and(|c| c.contains(&needle))
            || match &action.kind {
                ActionKind::AddContent { content, .. } => content.contains(&needle),
                ActionKind::EnhanceFile { params, .. } => {
                    params.values().any(|v| v.to_string().contains(&needle))
                }
                ActionKind::RunCommand { .. } => false,
            }
    })
}
