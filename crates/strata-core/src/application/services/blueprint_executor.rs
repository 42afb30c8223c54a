//! Blueprint Executor - runs one module's actions against a project.
//!
//! Every string an action carries is rendered through the module's
//! [`TemplateContext`] first. Then:
//! 1. `ADD_CONTENT` writes through the target's [`MergeStrategy`]
//! 2. `ENHANCE_FILE` reads, transforms and rewrites an existing file
//! 3. `RUN_COMMAND` spawns a process in the project root
//!
//! An action that fails is recorded and the next one runs, unless a later
//! action names the failed one in `requires`, which halts the blueprint.

use std::collections::{BTreeMap, HashSet};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use crate::{
    application::{
        ApplicationError,
        ports::{CommandRunner, CommandSpec, Filesystem},
        report::ExecutionResult,
    },
    domain::{
        ActionKind, Blueprint, BlueprintAction, DomainError, ExecutionOptions, MergeStrategy,
        ModifierRegistry, ModuleKey, ParameterValue, TemplateContext,
        merge::{merge_env, merge_package_manifest},
        template::is_truthy,
    },
    error::{StrataError, StrataResult},
};

/// Programs that prompt on a terminal, with the input that accepts their
/// defaults. Matched against the program itself or the tool a runner
/// (`npx`, `pnpm dlx`, `bunx`, `yarn dlx`) launches.
const INTERACTIVE_TOOLS: &[(&str, &str)] = &[
    ("shadcn", "\n\n\n\n\n\n\n\n"),
    ("shadcn-ui", "\n\n\n\n\n\n\n\n"),
    ("create-next-app", "\n\n\n\n\n\n\n\n"),
    ("drizzle-kit", "y\n"),
    ("prisma", "y\n"),
];

const PACKAGE_MANAGERS: &[&str] = &["npm", "pnpm", "yarn", "bun"];
const INSTALL_VERBS: &[&str] = &["install", "i", "add", "ci"];

/// Everything an action may need to know about the module it belongs to.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub module: ModuleKey,
    pub project_root: PathBuf,
    pub template: TemplateContext,
    pub options: ExecutionOptions,
}

pub struct BlueprintExecutor {
    filesystem: Arc<dyn Filesystem>,
    runner: Arc<dyn CommandRunner>,
    modifiers: ModifierRegistry,
}

impl BlueprintExecutor {
    pub fn new(filesystem: Arc<dyn Filesystem>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            filesystem,
            runner,
            modifiers: ModifierRegistry::builtin(),
        }
    }

    pub fn with_modifiers(mut self, modifiers: ModifierRegistry) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn modifiers(&self) -> &ModifierRegistry {
        &self.modifiers
    }

    /// Run every action of `blueprint` in order and collect the outcome.
    ///
    /// Never returns early on an action failure; the result carries every
    /// error with its action index and target.
    #[instrument(skip_all, fields(module = %ctx.module, blueprint = %blueprint.id))]
    pub fn execute(&self, blueprint: &Blueprint, ctx: &ExecutionContext) -> ExecutionResult {
        let started = Instant::now();
        let mut result = ExecutionResult::new(ctx.module.clone());

        if let Err(e) = blueprint.validate() {
            result.record_error(None, None, e);
            result.finalize();
            return result;
        }

        info!(actions = blueprint.len(), "Executing blueprint");

        let mut failed: HashSet<&str> = HashSet::new();
        for (index, action) in blueprint.actions.iter().enumerate() {
            if let Some(required) = action.requires.iter().find(|r| failed.contains(r.as_str())) {
                warn!(index, requires = %required, "Blueprint halted");
                result.record_error(
                    Some(index),
                    Some(action.kind.target().to_string()),
                    ApplicationError::BlueprintHalted {
                        action_index: index,
                        requires: required.clone(),
                    },
                );
                break;
            }

            if let Err(error) = self.run_action(blueprint, index, action, ctx, &mut result) {
                warn!(index, action = action.kind.label(), error = %error, "Action failed");
                let target = ctx
                    .template
                    .render(action.kind.target())
                    .unwrap_or_else(|_| action.kind.target().to_string());
                result.record_error(Some(index), Some(target), error);
                if let Some(id) = &action.id {
                    failed.insert(id.as_str());
                }
            }
        }

        result.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        result.finalize();
        info!(
            files = result.files_written.len(),
            errors = result.errors.len(),
            "Blueprint finished"
        );
        result
    }

    fn run_action(
        &self,
        blueprint: &Blueprint,
        index: usize,
        action: &BlueprintAction,
        ctx: &ExecutionContext,
        result: &mut ExecutionResult,
    ) -> StrataResult<()> {
        if let Some(condition) = &action.condition {
            let value = ctx.template.render(condition)?;
            if !is_truthy(&value) {
                debug!(index, condition = %condition, "Condition is false, skipping");
                result.note(format!(
                    "action #{index} ({}) skipped: condition '{condition}' is false",
                    action.kind.label()
                ));
                return Ok(());
            }
        }

        match &action.kind {
            ActionKind::AddContent { target, content } => {
                let target = ctx.template.render(target)?;
                let content = ctx.template.render(content)?;
                self.add_content(blueprint, &target, &content, ctx, result)
            }
            ActionKind::EnhanceFile {
                path,
                modifier,
                params,
            } => {
                let path = ctx.template.render(path)?;
                let params = params
                    .iter()
                    .map(|(k, v)| Ok((k.clone(), render_value(&ctx.template, v)?)))
                    .collect::<Result<BTreeMap<_, _>, DomainError>>()?;
                self.enhance_file(blueprint, index, &path, modifier, &params, ctx, result)
            }
            ActionKind::RunCommand { command } => {
                let command = ctx.template.render(command)?;
                self.run_command(blueprint, index, &command, ctx, result)
            }
        }
    }

    fn add_content(
        &self,
        blueprint: &Blueprint,
        target: &str,
        content: &str,
        ctx: &ExecutionContext,
        result: &mut ExecutionResult,
    ) -> StrataResult<()> {
        let path = project_path(blueprint, &ctx.project_root, target)?;
        let existing = if self.filesystem.exists(&path) {
            Some(self.filesystem.read_file(&path)?)
        } else {
            None
        };

        let output = match MergeStrategy::for_target(target) {
            MergeStrategy::PackageManifest => {
                let merged = merge_package_manifest(target, existing.as_deref(), content)?;
                result.dependencies_to_install.extend(merged.dependencies);
                result.scripts_to_register.extend(merged.scripts);
                merged.content
            }
            MergeStrategy::EnvFile => {
                let merged = merge_env(existing.as_deref(), content);
                if !merged.kept.is_empty() {
                    debug!(target, kept = ?merged.kept, "Existing env keys kept");
                }
                merged.content
            }
            MergeStrategy::Replace => content.to_string(),
        };

        if existing.as_deref() == Some(output.as_str()) {
            debug!(target, "Content unchanged");
            return Ok(());
        }

        self.write(&path, &output)?;
        result.file_written(target);
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn enhance_file(
        &self,
        blueprint: &Blueprint,
        index: usize,
        target: &str,
        modifier: &str,
        params: &BTreeMap<String, ParameterValue>,
        ctx: &ExecutionContext,
        result: &mut ExecutionResult,
    ) -> StrataResult<()> {
        let path = project_path(blueprint, &ctx.project_root, target)?;
        if !self.filesystem.exists(&path) {
            return Err(ApplicationError::TargetFileMissing { path }.into());
        }

        let source = self.filesystem.read_file(&path)?;
        let modified = self.modifiers.apply(modifier, target, &source, params)?;
        for warning in modified.warnings {
            warn!(target, modifier, %warning, "Modifier parameter");
            result.warn(Some(index), format!("{modifier}: {warning}"));
        }

        let enhanced = modified.content;
        if enhanced == source {
            debug!(target, modifier, "File already enhanced");
            return Ok(());
        }

        self.filesystem.write_file(&path, &enhanced)?;
        result.file_written(target);
        Ok(())
    }

    fn run_command(
        &self,
        blueprint: &Blueprint,
        index: usize,
        command: &str,
        ctx: &ExecutionContext,
        result: &mut ExecutionResult,
    ) -> StrataResult<()> {
        let argv = split_command(command).map_err(|reason| DomainError::InvalidBlueprint {
            blueprint: blueprint.id.clone(),
            reason: format!("action #{index}: {reason}"),
        })?;

        if ctx.options.skip_install && is_install_command(&argv) {
            info!(command, "Skipping install command");
            result.warn(Some(index), format!("skipped `{command}` (install disabled)"));
            return Ok(());
        }

        let (program, args) = argv.split_first().ok_or_else(|| DomainError::InvalidBlueprint {
            blueprint: blueprint.id.clone(),
            reason: format!("action #{index}: empty command"),
        })?;
        let mut spec =
            CommandSpec::new(program.clone(), ctx.project_root.clone()).args(args.iter().cloned());
        if let Some(input) = interactive_input(&argv) {
            debug!(command, "Feeding default answers to interactive tool");
            spec = spec.stdin(input);
        }

        info!(command = %spec, "Running command");
        let output = self.runner.run(&spec)?;
        if !output.is_success() {
            return Err(ApplicationError::CommandFailed {
                command: command.to_string(),
                exit_code: output.exit_code,
                stderr: tail(&output.stderr, 20),
            }
            .into());
        }
        Ok(())
    }

    fn write(&self, path: &Path, content: &str) -> StrataResult<()> {
        if let Some(parent) = path.parent() {
            self.filesystem.create_dir_all(parent)?;
        }
        self.filesystem.write_file(path, content)
    }
}

/// Join `target` onto the project root. Targets must stay inside it.
fn project_path(blueprint: &Blueprint, root: &Path, target: &str) -> Result<PathBuf, StrataError> {
    let relative = Path::new(target);
    let escapes = relative.is_absolute()
        || relative
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)));
    if target.trim().is_empty() || escapes {
        return Err(DomainError::InvalidBlueprint {
            blueprint: blueprint.id.clone(),
            reason: format!("target '{target}' must be a relative path inside the project"),
        }
        .into());
    }
    Ok(root.join(relative))
}

/// Render every string inside a modifier parameter.
fn render_value(
    ctx: &TemplateContext,
    value: &ParameterValue,
) -> Result<ParameterValue, DomainError> {
    Ok(match value {
        ParameterValue::String(s) => ParameterValue::String(ctx.render(s)?),
        ParameterValue::Array(items) => ParameterValue::Array(
            items
                .iter()
                .map(|v| render_value(ctx, v))
                .collect::<Result<_, _>>()?,
        ),
        ParameterValue::Object(map) => ParameterValue::Object(
            map.iter()
                .map(|(k, v)| Ok((k.clone(), render_value(ctx, v)?)))
                .collect::<Result<_, DomainError>>()?,
        ),
        other => other.clone(),
    })
}

/// Split a command line into argv. Supports single quotes, double quotes and
/// backslash escapes outside single quotes. No globbing or variable expansion.
pub fn split_command(line: &str) -> Result<Vec<String>, String> {
    let mut argv = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some('\''), '\'') | (Some('"'), '"') => quote = None,
            (Some('"') | None, '\\') => {
                let escaped = chars.next().ok_or("trailing backslash")?;
                current.push(escaped);
                in_word = true;
            }
            (Some(_), c) => current.push(c),
            (None, '\'' | '"') => {
                quote = Some(c);
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    argv.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if let Some(q) = quote {
        return Err(format!("unterminated {q} quote"));
    }
    if in_word {
        argv.push(current);
    }
    if argv.is_empty() {
        return Err("empty command".into());
    }
    Ok(argv)
}

fn is_install_command(argv: &[String]) -> bool {
    let Some((program, rest)) = argv.split_first() else {
        return false;
    };
    if !PACKAGE_MANAGERS.contains(&program.as_str()) {
        return false;
    }
    match rest.first() {
        Some(verb) => INSTALL_VERBS.contains(&verb.as_str()),
        // bare `yarn` / `pnpm` / `bun` installs
        None => program != "npm",
    }
}

/// The tool a command ultimately launches, looking through package runners.
fn launched_tool(argv: &[String]) -> Option<&str> {
    let program = argv.first()?.as_str();
    let tool = match (program, argv.get(1).map(String::as_str)) {
        ("npx" | "bunx", _) => argv.iter().skip(1).find(|a| !a.starts_with('-'))?,
        ("pnpm" | "yarn", Some("dlx")) | ("bun", Some("x")) => {
            argv.iter().skip(2).find(|a| !a.starts_with('-'))?
        }
        _ => return Some(program),
    };
    // `shadcn@latest` -> `shadcn`, keeping scoped names intact
    let bare = match tool.rfind('@') {
        Some(pos) if pos > 0 => &tool[..pos],
        _ => tool.as_str(),
    };
    Some(bare)
}

fn interactive_input(argv: &[String]) -> Option<&'static str> {
    let tool = launched_tool(argv)?;
    INTERACTIVE_TOOLS
        .iter()
        .find(|(name, _)| *name == tool)
        .map(|(_, input)| *input)
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.trim_end().lines().collect();
    let start = all.len().saturating_sub(lines);
    all[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{FakeFs, FakeRunner};
    use crate::domain::ModuleCategory;

    fn ctx() -> ExecutionContext {
        ExecutionContext {
            module: ModuleKey::new(ModuleCategory::Database, "drizzle"),
            project_root: PathBuf::from("/p"),
            template: TemplateContext::new("demo").with("module.parameters.provider", "postgres"),
            options: ExecutionOptions::default(),
        }
    }

    fn executor(fs: &Arc<FakeFs>, runner: &Arc<FakeRunner>) -> BlueprintExecutor {
        BlueprintExecutor::new(fs.clone(), runner.clone())
    }

    // ========================================================================
    // Actions
    // ========================================================================

    #[test]
    fn add_content_renders_and_writes() {
        let fs = Arc::new(FakeFs::default());
        let runner = Arc::new(FakeRunner::default());
        let bp = Blueprint::new("drizzle", "Drizzle").with_action(BlueprintAction::add_content(
            "src/db/{{module.parameters.provider}}.ts",
            "// {{project.name}}",
        ));

        let result = executor(&fs, &runner).execute(&bp, &ctx());

        assert!(result.is_success(), "{:?}", result.errors);
        assert_eq!(fs.read("/p/src/db/postgres.ts").unwrap(), "// demo");
        assert_eq!(result.files_written, vec![PathBuf::from("src/db/postgres.ts")]);
    }

    #[test]
    fn package_json_is_merged_and_dependencies_collected() {
        let existing = r#"{"name":"demo","dependencies":{"next":"14"}}"#;
        let fs = Arc::new(FakeFs::default().with_file("/p/package.json", existing));
        let runner = Arc::new(FakeRunner::default());
        let bp = Blueprint::new("drizzle", "Drizzle").with_action(BlueprintAction::add_content(
            "package.json",
            r#"{"dependencies":{"drizzle-orm":"^0.30"},"scripts":{"db:push":"drizzle-kit push"}}"#,
        ));

        let result = executor(&fs, &runner).execute(&bp, &ctx());

        let json: serde_json::Value =
            serde_json::from_str(&fs.read("/p/package.json").unwrap()).unwrap();
        assert_eq!(json["dependencies"]["next"], "14");
        assert_eq!(json["dependencies"]["drizzle-orm"], "^0.30");
        assert_eq!(result.dependencies_to_install, vec!["drizzle-orm@^0.30"]);
        assert_eq!(result.scripts_to_register, vec!["db:push"]);
    }

    #[test]
    fn env_file_keeps_existing_values() {
        let fs = Arc::new(FakeFs::default().with_file("/p/.env", "DATABASE_URL=old\n"));
        let runner = Arc::new(FakeRunner::default());
        let bp = Blueprint::new("drizzle", "Drizzle").with_action(BlueprintAction::add_content(
            ".env",
            "DATABASE_URL=new\nAUTH_SECRET=x\n",
        ));

        executor(&fs, &runner).execute(&bp, &ctx());

        let env = fs.read("/p/.env").unwrap();
        assert!(env.contains("DATABASE_URL=old"));
        assert!(!env.contains("DATABASE_URL=new"));
        assert!(env.contains("AUTH_SECRET=x"));
    }

    #[test]
    fn enhance_missing_file_fails_but_execution_continues() {
        let fs = Arc::new(FakeFs::default());
        let runner = Arc::new(FakeRunner::default());
        let bp = Blueprint::new("auth", "Auth")
            .with_action(
                BlueprintAction::enhance_file("src/app/layout.tsx", "line-appender")
                    .with_param("lines", vec!["// x".to_string()]),
            )
            .with_action(BlueprintAction::add_content("README.md", "# demo"));

        let result = executor(&fs, &runner).execute(&bp, &ctx());

        assert!(result.is_failed());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].action_index, Some(0));
        assert!(matches!(
            result.errors[0].error,
            StrataError::Application(ApplicationError::TargetFileMissing { .. })
        ));
        assert_eq!(fs.read("/p/README.md").unwrap(), "# demo");
    }

    #[test]
    fn enhance_file_applies_modifier() {
        let fs = Arc::new(FakeFs::default().with_file("/p/.gitignore", "node_modules\n"));
        let runner = Arc::new(FakeRunner::default());
        let bp = Blueprint::new("drizzle", "Drizzle").with_action(
            BlueprintAction::enhance_file(".gitignore", "line-appender")
                .with_param("lines", vec!["drizzle/".to_string()]),
        );

        let result = executor(&fs, &runner).execute(&bp, &ctx());

        assert!(result.is_success(), "{:?}", result.errors);
        assert!(fs.read("/p/.gitignore").unwrap().contains("drizzle/"));
    }

    #[test]
    fn undeclared_modifier_param_is_a_warning() {
        let fs = Arc::new(FakeFs::default().with_file("/p/.gitignore", "node_modules\n"));
        let runner = Arc::new(FakeRunner::default());
        let bp = Blueprint::new("drizzle", "Drizzle").with_action(
            BlueprintAction::enhance_file(".gitignore", "line-appender")
                .with_param("lines", vec!["drizzle/".to_string()])
                .with_param("position", "top"),
        );

        let result = executor(&fs, &runner).execute(&bp, &ctx());

        assert!(result.is_success(), "{:?}", result.errors);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].action_index, Some(0));
        assert_eq!(result.warnings[0].message, "line-appender: unknown parameter 'position'");
        assert!(fs.read("/p/.gitignore").unwrap().contains("drizzle/"));
    }

    #[test]
    fn false_condition_skips_with_a_note() {
        let fs = Arc::new(FakeFs::default());
        let runner = Arc::new(FakeRunner::default());
        let bp = Blueprint::new("x", "X").with_action(
            BlueprintAction::add_content("a.txt", "a").when("{{module.parameters.missing_flag}}"),
        );

        let mut context = ctx();
        context.template.insert("module.parameters.missing_flag", "false");
        let result = executor(&fs, &runner).execute(&bp, &context);

        assert!(result.is_success());
        assert!(fs.read("/p/a.txt").is_none());
        assert_eq!(result.notes.len(), 1);
    }

    #[test]
    fn failed_requirement_halts_blueprint() {
        let fs = Arc::new(FakeFs::default());
        let runner = Arc::new(FakeRunner::failing(&["npx"]));
        let bp = Blueprint::new("db", "DB")
            .with_action(
                BlueprintAction::run_command("npx drizzle-kit generate").with_id("generate"),
            )
            .with_action(BlueprintAction::add_content("migrated.txt", "ok").requires("generate"))
            .with_action(BlueprintAction::add_content("after.txt", "never"));

        let result = executor(&fs, &runner).execute(&bp, &ctx());

        assert_eq!(result.errors.len(), 2);
        assert!(matches!(
            result.errors[1].error,
            StrataError::Application(ApplicationError::BlueprintHalted { action_index: 1, .. })
        ));
        assert!(fs.read("/p/migrated.txt").is_none());
        assert!(fs.read("/p/after.txt").is_none());
    }

    #[test]
    fn commands_run_in_project_root_with_canned_input() {
        let fs = Arc::new(FakeFs::default());
        let runner = Arc::new(FakeRunner::default());
        let bp = Blueprint::new("ui", "UI")
            .with_action(BlueprintAction::run_command("npx shadcn@latest init --defaults"));

        let result = executor(&fs, &runner).execute(&bp, &ctx());

        assert!(result.is_success());
        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "npx");
        assert_eq!(calls[0].args, vec!["shadcn@latest", "init", "--defaults"]);
        assert_eq!(calls[0].cwd, PathBuf::from("/p"));
        assert!(calls[0].stdin.is_some());
    }

    #[test]
    fn skip_install_suppresses_package_manager_installs() {
        let fs = Arc::new(FakeFs::default());
        let runner = Arc::new(FakeRunner::default());
        let bp = Blueprint::new("x", "X")
            .with_action(BlueprintAction::run_command("pnpm add drizzle-orm"))
            .with_action(BlueprintAction::run_command("npx drizzle-kit generate"));

        let mut context = ctx();
        context.options.skip_install = true;
        let result = executor(&fs, &runner).execute(&bp, &context);

        assert!(result.is_success());
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(runner.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn targets_outside_the_project_are_rejected() {
        let fs = Arc::new(FakeFs::default());
        let runner = Arc::new(FakeRunner::default());
        let bp = Blueprint::new("x", "X")
            .with_action(BlueprintAction::add_content("../escape.txt", "no"));

        let result = executor(&fs, &runner).execute(&bp, &ctx());

        assert!(result.is_failed());
        assert!(fs.files.lock().unwrap().is_empty());
    }

    // ========================================================================
    // Command splitting
    // ========================================================================

    #[test]
    fn split_handles_quotes_and_escapes() {
        assert_eq!(
            split_command(r#"git commit -m "initial commit" --author='A B' a\ b"#).unwrap(),
            vec!["git", "commit", "-m", "initial commit", "--author=A B", "a b"]
        );
        assert_eq!(split_command("echo ''").unwrap(), vec!["echo", ""]);
        assert!(split_command("echo \"open").is_err());
        assert!(split_command("   ").is_err());
    }

    #[test]
    fn detects_install_commands() {
        let argv = |s: &str| split_command(s).unwrap();
        assert!(is_install_command(&argv("npm install")));
        assert!(is_install_command(&argv("pnpm add -D vitest")));
        assert!(is_install_command(&argv("yarn")));
        assert!(!is_install_command(&argv("npm run build")));
        assert!(!is_install_command(&argv("npx drizzle-kit push")));
    }

    #[test]
    fn launched_tool_looks_through_runners() {
        let argv = |s: &str| split_command(s).unwrap();
        assert_eq!(launched_tool(&argv("npx -y shadcn@latest add button")), Some("shadcn"));
        assert_eq!(launched_tool(&argv("pnpm dlx create-next-app@14 .")), Some("create-next-app"));
        assert_eq!(launched_tool(&argv("npx @scope/tool")), Some("@scope/tool"));
        assert_eq!(launched_tool(&argv("git init")), Some("git"));
    }
}
