//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the application needs from external systems.
//! The `strata-adapters` crate provides implementations.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::application::report::ExecutionResult;
use crate::domain::{AdapterMetadata, LoadedAdapter, ModuleKey};
use crate::error::StrataResult;

/// Port for filesystem operations.
///
/// Implemented by:
/// - `strata_adapters::filesystem::LocalFilesystem` (production)
/// - `strata_adapters::filesystem::MemoryFilesystem` (testing, dry runs)
pub trait Filesystem: Send + Sync {
    /// Create a directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> StrataResult<()>;

    /// Write content to a file, replacing it if present.
    fn write_file(&self, path: &Path, content: &str) -> StrataResult<()>;

    /// Read a whole file as UTF-8.
    fn read_file(&self, path: &Path) -> StrataResult<String>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;
}

/// A fully split command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// Fed to the child's stdin, then stdin is closed.
    pub stdin: Option<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
            stdin: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) {
                write!(f, " \"{arg}\"")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success() -> Self {
        Self {
            exit_code: Some(0),
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Port for running external commands to completion.
///
/// An `Err` means the process could not be started; a non-zero exit is an
/// `Ok` output the caller inspects.
pub trait CommandRunner: Send + Sync {
    fn run(&self, spec: &CommandSpec) -> StrataResult<CommandOutput>;
}

/// Port for adapter lookup.
///
/// Implemented by:
/// - `strata_adapters::InMemoryAdapterRegistry` (built-in and manifest adapters)
///
/// Lookups are by exact, case-sensitive `(category, id)`. Neither method
/// may touch the filesystem or network.
#[cfg_attr(test, mockall::automock)]
pub trait AdapterRegistry: Send + Sync {
    /// Metadata only; used for planning.
    fn metadata(&self, key: &ModuleKey) -> Option<AdapterMetadata>;

    /// Metadata, parameter schema and blueprint. Fails with `AdapterNotFound`.
    fn load(&self, key: &ModuleKey) -> StrataResult<LoadedAdapter>;

    /// Every registered adapter, ordered by `(category, id)`.
    fn list(&self) -> Vec<AdapterMetadata>;
}

/// Progress notifications from the orchestrator.
pub trait ExecutionObserver {
    fn run_started(&self, _total: usize) {}

    fn module_started(&self, _key: &ModuleKey, _position: usize) {}

    fn module_finished(&self, _result: &ExecutionResult) {}

    fn run_finished(&self) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ExecutionObserver for NoopObserver {}
