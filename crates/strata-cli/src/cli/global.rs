//! Flags shared by every `strata` subcommand, flattened into [`super::Cli`].
//!
//! Each of them also has a home in the config file (`output.*`,
//! `logging.file`); a flag given here wins over the file.

use std::path::PathBuf;

use clap::Args;

#[derive(Debug, Args)]
#[command(next_help_heading = "Global options")]
pub struct GlobalArgs {
    /// Show what the orchestrator is doing on stderr.
    ///
    /// `-v` logs each module as it runs, `-vv` every action and smart path
    /// override, `-vvv` everything. `RUST_LOG` takes precedence.
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        global = true,
        help = "Log progress (-v modules, -vv actions, -vvv everything)"
    )]
    pub verbose: u8,

    /// Print errors only: no plan, no progress bar, no confirmation prompt.
    #[arg(short = 'q', long = "quiet", global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Plain text instead of coloured output. Honours `NO_COLOR`.
    #[arg(long = "no-color", global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Read settings from FILE instead of the per-user `config.toml`.
    #[arg(short = 'c', long = "config", global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Mirror every log event to FILE as JSON lines, at full verbosity of
    /// the chosen level.
    #[arg(long = "log-file", global = true, value_name = "FILE", env = "STRATA_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// How plans, reports and listings are rendered.
    #[arg(long = "output-format", global = true, value_enum, default_value = "auto")]
    pub output_format: OutputFormat,
}

impl GlobalArgs {
    /// Filter level for the strata crates.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// Whether the user is watching a human-oriented rendering and may be
    /// asked to confirm a run.
    pub fn is_interactive(&self, resolved: OutputFormat) -> bool {
        !self.quiet && resolved != OutputFormat::Json
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// `output.format` from the config, else human on a terminal and plain
    /// when piped.
    #[default]
    Auto,
    /// Coloured plan, progress bar and report.
    Human,
    /// The same text without colour or progress bar.
    Plain,
    /// The execution report (or listing) as a single JSON document.
    Json,
}
