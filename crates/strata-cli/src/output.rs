//! Output management and formatting.

use std::io::{self, IsTerminal};

use clap::ValueEnum;
use console::Term;
use owo_colors::OwoColorize;
use serde::Serialize;

use strata_core::application::{ModuleStatus, RecipeExecutionReport};

use crate::cli::global::{GlobalArgs, OutputFormat};
use crate::config::AppConfig;

/// Manages CLI output based on configuration.
pub struct OutputManager {
    resolved_format: OutputFormat,
    quiet: bool,
    no_color: bool,
    term: Term,
}

impl OutputManager {
    /// Build an `OutputManager` from parsed CLI flags and loaded config.
    pub fn new(args: &GlobalArgs, config: &AppConfig) -> Self {
        // The config file only applies when the flag was left at auto.
        let requested = match args.output_format {
            OutputFormat::Auto => {
                OutputFormat::from_str(&config.output.format, true).unwrap_or(OutputFormat::Auto)
            }
            explicit => explicit,
        };

        // Resolve Auto → Human (TTY) or Plain (piped/redirected).
        let resolved_format = if requested == OutputFormat::Auto {
            if io::stdout().is_terminal() {
                OutputFormat::Human
            } else {
                OutputFormat::Plain
            }
        } else {
            requested
        };

        Self {
            resolved_format,
            quiet: args.quiet,
            no_color: args.no_color
                || config.output.no_color
                || resolved_format != OutputFormat::Human,
            term: Term::stdout(),
        }
    }

    // ── Public write methods ───────────────────────────────────────────────

    /// Generic message; suppressed in quiet mode.
    pub fn print(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.term.write_line(msg)
    }

    /// Success indicator: `✓ <msg>`.
    pub fn success(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let line = if self.no_color {
            format!("\u{2713} {msg}") // ✓
        } else {
            format!("{} {}", "\u{2713}".green().bold(), msg.green())
        };
        self.term.write_line(&line)
    }

    /// Error indicator: `✗ <msg>`.  Not suppressed in quiet mode.
    pub fn error(&self, msg: &str) -> io::Result<()> {
        let line = if self.no_color {
            format!("\u{2717} {msg}") // ✗
        } else {
            format!("{} {}", "\u{2717}".red().bold(), msg.red())
        };
        self.term.write_line(&line)
    }

    /// Warning indicator: `⚠ <msg>`.
    pub fn warning(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let line = if self.no_color {
            format!("\u{26a0} {msg}") // ⚠
        } else {
            format!("{} {}", "\u{26a0}".yellow().bold(), msg.yellow())
        };
        self.term.write_line(&line)
    }

    /// Informational indicator: `ℹ <msg>`.
    pub fn info(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let line = if self.no_color {
            format!("\u{2139} {msg}") // ℹ
        } else {
            format!("{} {}", "\u{2139}".blue().bold(), msg.blue())
        };
        self.term.write_line(&line)
    }

    /// Bold cyan header line.
    pub fn header(&self, text: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let line = if self.no_color {
            text.to_owned()
        } else {
            text.cyan().bold().to_string()
        };
        self.term.write_line(&line)
    }

    /// Pretty JSON on stdout.  Written even in quiet mode since it is the
    /// requested result, not chatter.
    pub fn json<T: Serialize + ?Sized>(&self, value: &T) -> io::Result<()> {
        let text = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        self.term.write_line(&text)
    }

    // ── Reports ────────────────────────────────────────────────────────────

    /// Render a run report in the resolved format.
    pub fn report(&self, report: &RecipeExecutionReport) -> io::Result<()> {
        if self.resolved_format == OutputFormat::Json {
            return self.json(report);
        }

        for line in report_lines(report) {
            match line {
                ReportLine::Ok(text) => self.success(&text)?,
                ReportLine::Failed(text) => self.error(&text)?,
                ReportLine::Skipped(text) | ReportLine::Warning(text) => self.warning(&text)?,
                ReportLine::Detail(text) => self.print(&text)?,
            }
        }
        Ok(())
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    /// `true` if ANSI colours are enabled.
    pub fn supports_color(&self) -> bool {
        !self.no_color
    }

    /// `true` if quiet mode suppresses most output.
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// The resolved (non-Auto) output format.
    pub fn format(&self) -> OutputFormat {
        self.resolved_format
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ReportLine {
    Ok(String),
    Failed(String),
    Skipped(String),
    Warning(String),
    Detail(String),
}

fn report_lines(report: &RecipeExecutionReport) -> Vec<ReportLine> {
    let mut lines = Vec::new();

    for error in &report.fatal_errors {
        lines.push(ReportLine::Failed(error.to_string()));
    }

    for result in &report.modules {
        let files = result.files_written.len();
        match &result.status {
            ModuleStatus::Succeeded => lines.push(ReportLine::Ok(format!(
                "{} ({files} file{}, {} ms)",
                result.module,
                if files == 1 { "" } else { "s" },
                result.duration_ms
            ))),
            ModuleStatus::Failed => {
                lines.push(ReportLine::Failed(format!("{} failed", result.module)))
            }
            ModuleStatus::Skipped { reason } => {
                lines.push(ReportLine::Skipped(format!("{} skipped: {reason}", result.module)))
            }
        }
        for error in &result.errors {
            let mut text = String::from("    ");
            if let Some(index) = error.action_index {
                text.push_str(&format!("action #{index} "));
            }
            if let Some(target) = &error.target {
                text.push_str(&format!("({target}) "));
            }
            text.push_str(&error.error.to_string());
            lines.push(ReportLine::Detail(text));
        }
        for warning in &result.warnings {
            lines.push(ReportLine::Warning(format!("{}: {warning}", result.module)));
        }
    }

    for warning in &report.warnings {
        lines.push(ReportLine::Warning(warning.clone()));
    }

    lines
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    use strata_core::application::{ApplicationError, ExecutionResult};
    use strata_core::domain::{ModuleCategory, ModuleKey};

    use crate::config::AppConfig;

    fn make_manager(quiet: bool, no_color: bool, output_format: OutputFormat) -> OutputManager {
        let args = GlobalArgs {
            verbose: 0,
            quiet,
            no_color,
            config: None,
            log_file: None,
            output_format,
        };
        OutputManager::new(&args, &AppConfig::default())
    }

    fn sample_report() -> RecipeExecutionReport {
        let mut report = RecipeExecutionReport::new("demo", "/tmp/demo");

        let mut ok = ExecutionResult::new(ModuleKey::new(ModuleCategory::Framework, "nextjs"));
        ok.file_written("/tmp/demo/package.json");
        ok.finalize();
        report.push(ok);

        let mut broken = ExecutionResult::new(ModuleKey::new(ModuleCategory::Database, "drizzle"));
        broken.record_error(
            Some(2),
            Some("src/lib/env.ts".into()),
            ApplicationError::TargetFileMissing {
                path: "/tmp/demo/src/lib/env.ts".into(),
            },
        );
        broken.finalize();
        report.push(broken);

        report.push(ExecutionResult::skipped(
            ModuleKey::new(ModuleCategory::Auth, "better-auth"),
            "dependency 'database:drizzle' did not complete",
        ));
        report.warnings.push("smart path 'db_schema' overridden twice".into());
        report
    }

    #[test]
    fn quiet_suppresses_print() {
        let out = make_manager(true, true, OutputFormat::Plain);
        assert!(out.print("hello").is_ok());
    }

    #[test]
    fn error_not_suppressed_in_quiet_mode() {
        let out = make_manager(true, true, OutputFormat::Plain);
        assert!(out.error("something went wrong").is_ok());
    }

    #[test]
    fn plain_format_disables_color() {
        assert!(!make_manager(false, false, OutputFormat::Plain).supports_color());
        assert!(make_manager(false, false, OutputFormat::Human).supports_color());
        assert!(!make_manager(false, true, OutputFormat::Human).supports_color());
    }

    #[test]
    fn format_accessor_returns_resolved() {
        let out = make_manager(false, false, OutputFormat::Json);
        assert_eq!(out.format(), OutputFormat::Json);
    }

    #[test]
    fn config_format_applies_when_flag_is_auto() {
        let mut config = AppConfig::default();
        config.output.format = "json".into();
        let args = GlobalArgs {
            verbose: 0,
            quiet: false,
            no_color: false,
            config: None,
            log_file: None,
            output_format: OutputFormat::Auto,
        };
        assert_eq!(OutputManager::new(&args, &config).format(), OutputFormat::Json);

        let explicit = GlobalArgs {
            output_format: OutputFormat::Plain,
            ..args
        };
        assert_eq!(OutputManager::new(&explicit, &config).format(), OutputFormat::Plain);
    }

    #[test]
    fn report_lines_cover_every_outcome() {
        let lines = report_lines(&sample_report());

        assert_eq!(lines[0], ReportLine::Ok("framework:nextjs (1 file, 0 ms)".into()));
        assert_eq!(lines[1], ReportLine::Failed("database:drizzle failed".into()));
        let ReportLine::Detail(detail) = &lines[2] else {
            panic!("expected a detail line, got {:?}", lines[2]);
        };
        assert!(detail.starts_with("    action #2 (src/lib/env.ts) "), "{detail}");
        let ReportLine::Skipped(skipped) = &lines[3] else {
            panic!("expected a skipped line, got {:?}", lines[3]);
        };
        assert!(skipped.contains("auth:better-auth skipped"), "{skipped}");
        assert_eq!(
            lines.last(),
            Some(&ReportLine::Warning("smart path 'db_schema' overridden twice".into()))
        );
    }

    #[test]
    fn fatal_errors_come_first() {
        let mut report = RecipeExecutionReport::new("demo", "/tmp/demo");
        report.fatal_errors.push(strata_core::error::StrataError::Configuration {
            message: "bad".into(),
        });
        assert!(matches!(&report_lines(&report)[0], ReportLine::Failed(t) if t.contains("bad")));
    }
}
