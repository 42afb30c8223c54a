//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "strata",
    bin_name = "strata",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "\u{26a1} Declarative project scaffolding",
    long_about = "Strata composes technology modules (framework, database, auth, \
                  payments, ...) into a working project from a declarative recipe.",
    after_help = "EXAMPLES:\n\
        \x20 strata new recipe.yaml\n\
        \x20 strata new my-saas --genome saas-starter\n\
        \x20 strata add payment:stripe --path ./my-saas\n\
        \x20 strata list database\n\
        \x20 strata completions bash > /usr/share/bash-completion/completions/strata",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scaffold a new project from a recipe file or a genome.
    #[command(
        visible_alias = "n",
        about = "Create a new project",
        after_help = "EXAMPLES:\n\
            \x20 strata new recipe.yaml\n\
            \x20 strata new recipe.json --dry-run\n\
            \x20 strata new my-blog --genome blog --param database:prisma.provider=postgresql"
    )]
    New(NewArgs),

    /// Add modules to an existing project.
    #[command(
        about = "Add modules to an existing project",
        after_help = "EXAMPLES:\n\
            \x20 strata add payment:stripe\n\
            \x20 strata add resend vitest --path ./my-app\n\
            \x20 strata add database:drizzle --param database:drizzle.dialect=sqlite"
    )]
    Add(AddArgs),

    /// Apply a recipe or genome on top of an existing project.
    #[command(
        about = "Apply a recipe to an existing project",
        after_help = "EXAMPLES:\n\
            \x20 strata scale more-modules.yaml --path ./my-app\n\
            \x20 strata scale --genome saas-starter"
    )]
    Scale(ScaleArgs),

    /// List the built-in genomes.
    #[command(visible_alias = "genomes", about = "List available genomes")]
    ListGenomes(ListGenomesArgs),

    /// List adapters, or describe one.
    #[command(
        visible_alias = "ls",
        about = "List available adapters",
        after_help = "EXAMPLES:\n\
            \x20 strata list\n\
            \x20 strata list auth\n\
            \x20 strata list database:drizzle --format json"
    )]
    List(ListArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 strata completions bash > ~/.local/share/bash-completion/completions/strata\n\
            \x20 strata completions zsh  > ~/.zfunc/_strata\n\
            \x20 strata completions fish > ~/.config/fish/completions/strata.fish"
    )]
    Completions(CompletionsArgs),

    /// Inspect the effective configuration.
    #[command(
        about = "Configuration management",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 strata config get defaults.skip_install\n\
            \x20 strata config list\n\
            \x20 strata config path"
    )]
    Config(ConfigCommands),
}

// ── shared run flags ──────────────────────────────────────────────────────────

/// Flags shared by every command that executes a recipe.
#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Module parameter override, repeatable.
    #[arg(
        short = 'p',
        long = "param",
        value_name = "MODULE.NAME=VALUE",
        help = "Set a module parameter (e.g. database:drizzle.dialect=sqlite)"
    )]
    pub params: Vec<String>,

    /// Plan and preview without writing anything.
    #[arg(long = "dry-run", help = "Show the plan and files without writing")]
    pub dry_run: bool,

    /// Skip the confirmation prompt.
    #[arg(short = 'y', long = "yes", help = "Skip confirmation")]
    pub yes: bool,

    /// Do not run package-manager install commands.
    #[arg(long = "skip-install", help = "Do not run install commands")]
    pub skip_install: bool,

    /// Do not initialise a git repository.
    #[arg(long = "skip-git", help = "Do not run git init")]
    pub skip_git: bool,
}

// ── new ───────────────────────────────────────────────────────────────────────

/// Arguments for `strata new`.
#[derive(Debug, Args)]
pub struct NewArgs {
    /// Recipe file, or the project name/path when `--genome` is given.
    #[arg(value_name = "RECIPE|NAME", help = "Recipe file (or project name with --genome)")]
    pub target: String,

    /// Build the recipe from a built-in genome.
    #[arg(short = 'g', long = "genome", value_name = "GENOME", help = "Use a built-in genome")]
    pub genome: Option<String>,

    /// Override the project directory from the recipe.
    #[arg(short = 'o', long = "output", value_name = "DIR", help = "Project directory")]
    pub output: Option<PathBuf>,

    /// Scaffold into a non-empty directory.
    #[arg(long = "force", help = "Allow a non-empty project directory")]
    pub force: bool,

    #[command(flatten)]
    pub run: RunArgs,
}

// ── add ───────────────────────────────────────────────────────────────────────

/// Arguments for `strata add`.
#[derive(Debug, Args)]
pub struct AddArgs {
    /// Modules as `category:id`, or a bare id when it is unambiguous.
    #[arg(value_name = "MODULE", required = true, help = "Modules to add")]
    pub modules: Vec<String>,

    /// Existing project directory.
    #[arg(long = "path", value_name = "DIR", default_value = ".", help = "Project directory")]
    pub path: PathBuf,

    #[command(flatten)]
    pub run: RunArgs,
}

// ── scale ─────────────────────────────────────────────────────────────────────

/// Arguments for `strata scale`.
#[derive(Debug, Args)]
#[command(group = clap::ArgGroup::new("source").required(true).args(["recipe", "genome"]))]
pub struct ScaleArgs {
    /// Recipe whose modules are applied.
    #[arg(value_name = "RECIPE", help = "Recipe file")]
    pub recipe: Option<PathBuf>,

    /// Apply a built-in genome instead of a recipe file.
    #[arg(short = 'g', long = "genome", value_name = "GENOME", help = "Use a built-in genome")]
    pub genome: Option<String>,

    /// Existing project directory.
    #[arg(long = "path", value_name = "DIR", default_value = ".", help = "Project directory")]
    pub path: PathBuf,

    #[command(flatten)]
    pub run: RunArgs,
}

// ── list ──────────────────────────────────────────────────────────────────────

/// Arguments for `strata list`.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// A category (e.g. `auth`) to filter by, or a `category:id` to describe.
    #[arg(value_name = "CATEGORY|MODULE", help = "Filter by category or describe one adapter")]
    pub filter: Option<String>,

    /// Output format.
    #[arg(
        long = "format",
        value_enum,
        default_value = "table",
        help = "Output format"
    )]
    pub format: ListFormat,
}

/// Arguments for `strata list-genomes`.
#[derive(Debug, Args)]
pub struct ListGenomesArgs {
    #[arg(
        long = "format",
        value_enum,
        default_value = "table",
        help = "Output format"
    )]
    pub format: ListFormat,
}

/// Output format for the listing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListFormat {
    /// Human-readable table.
    Table,
    /// One key per line.
    List,
    /// JSON array.
    Json,
    /// CSV rows.
    Csv,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `strata completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `strata config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `defaults.skip_git`.
        key: String,
    },
    /// Print all configuration values.
    List,
    /// Print the path to the active configuration file.
    Path,
}

// ── tests ─────────────────────────────────────────────────────────────────────
