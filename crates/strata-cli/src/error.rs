//! Comprehensive error handling for Strata CLI.
//!
//! Provides structured errors with:
//! - User-friendly messages
//! - Actionable suggestions
//! - Proper error chaining
//! - Exit code mapping

use std::error::Error;
use std::path::PathBuf;

use owo_colors::OwoColorize;
use thiserror::Error;

use strata_adapters::RecipeLoadError;
use strata_core::error::StrataError;

pub use strata_core::error::ErrorCategory as CoreCategory;

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// Comprehensive CLI error types.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input (validation failed).
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Target directory is not empty and `--force` was not given.
    #[error("Project already exists at {path}")]
    ProjectExists { path: PathBuf },

    #[error("Invalid project name '{name}': {reason}")]
    InvalidProjectName { name: String, reason: String },

    // ── Recipe errors ──────────────────────────────────────────────────────
    #[error(transparent)]
    Recipe(#[from] RecipeLoadError),

    #[error("Unknown genome '{name}'")]
    GenomeNotFound { name: String },

    #[error("Unknown module '{module}'")]
    UnknownModule { module: String },

    /// A bare module id matched adapters in more than one category.
    #[error("Module '{id}' is ambiguous: {matches}")]
    AmbiguousModule { id: String, matches: String },

    #[error("No Strata project found at {path}")]
    NotAStrataProject { path: PathBuf },

    /// Every error the planner found before anything was written.
    #[error("Recipe rejected with {} error(s)", errors.len())]
    Planning { errors: Vec<StrataError> },

    /// The run finished but some modules failed or were skipped.
    #[error("{failed} of {total} module(s) did not complete")]
    ModulesFailed { failed: usize, total: usize },

    // ── Config errors ──────────────────────────────────────────────────────
    /// A configuration file could not be read or parsed.
    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // ── Core errors ────────────────────────────────────────────────────────
    /// An error propagated from `strata-core`.
    #[error("Scaffolding failed: {0}")]
    Core(#[from] StrataError),

    // ── System errors ──────────────────────────────────────────────────────
    #[error("I/O error: {message}")]
    IoError {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Operation cancelled by user.
    #[error("Operation cancelled")]
    Cancelled,

    /// Ctrl-C stopped the run between modules.
    #[error("Run interrupted after {completed} of {total} module(s)")]
    Interrupted { completed: usize, total: usize },
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::IoError {
            message: err.to_string(),
            source: err,
        }
    }
}

impl CliError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidInput { message, .. } => vec![
                format!("Check your input: {}", message),
                "Use --help for usage information".into(),
            ],

            Self::ProjectExists { path } => vec![
                format!("The directory '{}' is not empty", path.display()),
                "Use --force to scaffold into it anyway".into(),
                "Use 'strata add' to extend an existing Strata project".into(),
                "Choose a different project path".into(),
            ],

            Self::InvalidProjectName { name, reason } => vec![
                format!("Project name '{}' is invalid: {}", name, reason),
                "Use letters, numbers, spaces, hyphens and underscores".into(),
                "Examples: my-project, my_app, Acme Cloud".into(),
            ],

            Self::Recipe(RecipeLoadError::UnsupportedFormat { .. }) => vec![
                "Rename the recipe to .yaml, .yml, .json or .toml".into(),
            ],
            Self::Recipe(RecipeLoadError::Io { .. }) => vec![
                "Check that the recipe path exists and is readable".into(),
                "To start from a genome instead: strata new <name> --genome saas-starter".into(),
            ],
            Self::Recipe(RecipeLoadError::Parse { .. }) => vec![
                "A recipe needs 'version', 'project.name' and a 'modules' list".into(),
                "Each module needs an 'id' and a 'category'".into(),
            ],

            Self::GenomeNotFound { name } => vec![
                format!("No genome is named '{}'", name),
                "List available genomes: strata list-genomes".into(),
            ],

            Self::UnknownModule { module } => vec![
                format!("No adapter matches '{}'", module),
                "List available adapters: strata list".into(),
                "Use the category:id form, e.g. payment:stripe".into(),
            ],

            Self::AmbiguousModule { id, .. } => vec![
                format!("Qualify the module with its category, e.g. <category>:{}", id),
            ],

            Self::NotAStrataProject { path } => vec![
                format!("{} has no .strata/project.json", path.display()),
                "Run the command from the project root or pass --path".into(),
                "Create a project first: strata new <recipe>".into(),
            ],

            Self::Planning { errors } => {
                let mut suggestions: Vec<String> =
                    errors.iter().map(|e| format!("\u{2022} {e}")).collect();
                for error in errors {
                    for hint in error.suggestions() {
                        if !suggestions.contains(&hint) {
                            suggestions.push(hint);
                        }
                    }
                }
                suggestions
            }

            Self::ModulesFailed { .. } => vec![
                "See the report above for the failing actions".into(),
                "Fix the cause and re-run with 'strata add' for the missing modules".into(),
            ],

            Self::ConfigError { message, .. } => vec![
                format!("Configuration issue: {}", message),
                format!(
                    "Check your config file at {}",
                    crate::config::AppConfig::config_path().display()
                ),
                "Show the effective configuration: strata config list".into(),
            ],

            Self::Core(core_err) => core_err.suggestions(),

            Self::IoError { message, .. } => vec![
                format!("I/O operation failed: {}", message),
                "Check file permissions".into(),
                "Ensure the parent directory exists".into(),
            ],

            Self::Cancelled => vec!["No changes were made".into()],

            Self::Interrupted { .. } => vec![
                "Completed modules were recorded in .strata/project.json".into(),
                "Add the remaining modules with 'strata add'".into(),
            ],
        }
    }

    /// Get the error category for styling and exit codes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidInput { .. } => ErrorCategory::UserError,
            Self::ProjectExists { .. } => ErrorCategory::UserError,
            Self::InvalidProjectName { .. } => ErrorCategory::UserError,
            Self::Recipe(RecipeLoadError::Io { .. }) => ErrorCategory::NotFound,
            Self::Recipe(_) => ErrorCategory::UserError,
            Self::GenomeNotFound { .. } => ErrorCategory::NotFound,
            Self::UnknownModule { .. } => ErrorCategory::NotFound,
            Self::AmbiguousModule { .. } => ErrorCategory::UserError,
            Self::NotAStrataProject { .. } => ErrorCategory::NotFound,
            Self::Planning { .. } => ErrorCategory::UserError,
            Self::ModulesFailed { .. } => ErrorCategory::Partial,
            Self::ConfigError { .. } => ErrorCategory::Configuration,
            Self::Core(core) => match core.category() {
                CoreCategory::Validation => ErrorCategory::UserError,
                CoreCategory::Compatibility => ErrorCategory::UserError,
                CoreCategory::NotFound => ErrorCategory::NotFound,
                CoreCategory::Configuration => ErrorCategory::Configuration,
                CoreCategory::Internal => ErrorCategory::Internal,
            },
            Self::IoError { .. } => ErrorCategory::Internal,
            Self::Cancelled => ErrorCategory::UserError,
            Self::Interrupted { .. } => ErrorCategory::Interrupted,
        }
    }

    /// Exit code to pass to the OS.
    ///
    /// | Category      | Code |
    /// |---------------|------|
    /// | User error    |  2   |
    /// | Not found     |  3   |
    /// | Configuration |  4   |
    /// | Partial run   |  5   |
    /// | Interrupted   | 130  |
    /// | Internal      |  1   |
    pub fn exit_code(&self) -> u8 {
        match self.category() {
            ErrorCategory::UserError => 2,
            ErrorCategory::NotFound => 3,
            ErrorCategory::Configuration => 4,
            ErrorCategory::Partial => 5,
            ErrorCategory::Interrupted => crate::interrupt::INTERRUPTED_EXIT_CODE,
            ErrorCategory::Internal => 1,
        }
    }

    /// Format the error for display with colors and suggestions.
    pub fn format_colored(&self, verbose: bool) -> String {
        let mut output = String::new();

        output.push_str(&format!("\n{} {}\n\n", "✗".red().bold(), "Error:".red().bold()));
        output.push_str(&format!("  {}\n", self.to_string().red()));

        if verbose {
            let mut source = self.source();
            while let Some(err) = source {
                output.push_str(&format!("\n  {} {}\n", "→".dimmed(), err.to_string().dimmed()));
                source = err.source();
            }
        }

        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            output.push_str(&format!("\n{}\n", "Suggestions:".yellow().bold()));
            for suggestion in suggestions {
                output.push_str(&format!("  {}\n", suggestion));
            }
        }

        if !verbose {
            output.push('\n');
            output.push_str(&format!(
                "{} {}\n",
                "\u{2139}".blue(), // ℹ
                "Use -v / --verbose for more details.".dimmed(),
            ));
        }

        output
    }

    /// Plain-text version of [`Self::format_colored`] with no ANSI codes.
    pub fn format_plain(&self, verbose: bool) -> String {
        let mut out = String::new();
        out.push_str(&format!("\nError: {}\n", self));

        if verbose {
            let mut src = std::error::Error::source(self);
            while let Some(err) = src {
                out.push_str(&format!("  Caused by: {err}\n"));
                src = err.source();
            }
        }

        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            out.push_str("\nSuggestions:\n");
            for s in &suggestions {
                out.push_str(&format!("  {s}\n"));
            }
        }

        if !verbose {
            out.push_str("\nUse -v / --verbose for more details.\n");
        }

        out
    }

    /// Log the error using tracing.
    pub fn log(&self) {
        match self.category() {
            ErrorCategory::UserError => tracing::warn!("User error: {}", self),
            ErrorCategory::NotFound => tracing::warn!("Not found: {}", self),
            ErrorCategory::Partial => tracing::warn!("Partial run: {}", self),
            ErrorCategory::Interrupted => tracing::warn!("Interrupted: {}", self),
            ErrorCategory::Configuration => tracing::error!("Configuration error: {}", self),
            ErrorCategory::Internal => tracing::error!("Internal error: {}", self),
        }

        if let Some(source) = self.source() {
            tracing::debug!("Caused by: {}", source);
        }
    }
}

/// Error categories for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// User input error (validation, invalid arguments).
    UserError,
    /// Resource not found.
    NotFound,
    /// Configuration error.
    Configuration,
    /// The run completed with failed or skipped modules.
    Partial,
    /// Ctrl-C stopped the run.
    Interrupted,
    /// Internal/system error.
    Internal,
}

// ── IntoCli trait ─────────────────────────────────────────────────────────────

/// Extension trait to convert foreign error types into [`CliError`] at
/// call-sites with a descriptive context message.
///
/// Two concrete impls are provided:
/// - `Result<T, std::io::Error>` → `CliError::IoError`
/// - `Result<T, StrataError>`    → `CliError::Core`
pub trait IntoCli<T> {
    /// Convert to `CliResult` attaching a human-readable context message.
    fn with_cli_context<F, S>(self, f: F) -> CliResult<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> IntoCli<T> for Result<T, std::io::Error> {
    fn with_cli_context<F, S>(self, f: F) -> CliResult<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| CliError::IoError {
            message: f().into(),
            source: e,
        })
    }
}

impl<T> IntoCli<T> for Result<T, StrataError> {
    /// Core errors already carry their own context, so the message is unused.
    fn with_cli_context<F, S>(self, _f: F) -> CliResult<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(CliError::Core)
    }
}
