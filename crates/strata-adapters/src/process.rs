//! Command runner adapters.

use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};

use tracing::{debug, instrument};

use strata_core::{
    application::{
        ApplicationError,
        ports::{CommandOutput, CommandRunner, CommandSpec},
    },
    error::StrataResult,
};

const POISONED: ApplicationError = ApplicationError::LockPoisoned {
    resource: "command recorder",
};

/// Runs commands as child processes, blocking until they exit.
///
/// Output is captured, not streamed. When the command carries stdin it is written
/// up front and the pipe is closed, so prompting tools see EOF afterwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for ProcessRunner {
    #[instrument(skip_all, fields(command = %spec, cwd = %spec.cwd.display()))]
    fn run(&self, spec: &CommandSpec) -> StrataResult<CommandOutput> {
        let spawn_error = |reason: String| ApplicationError::CommandSpawn {
            command: spec.to_string(),
            reason,
        };

        let mut child = Command::new(&spec.program)
            .args(&spec.args)
            .current_dir(&spec.cwd)
            .stdin(if spec.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| spawn_error(e.to_string()))?;

        if let (Some(input), Some(mut stdin)) = (&spec.stdin, child.stdin.take()) {
            // A tool that exits without reading closes the pipe; that is not an error.
            if let Err(e) = stdin.write_all(input.as_bytes()) {
                debug!(error = %e, "stdin not fully consumed");
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|e| spawn_error(format!("wait error: {e}")))?;

        let result = CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };
        debug!(exit_code = ?result.exit_code, "command finished");
        Ok(result)
    }
}

/// Records commands instead of running them. Every command succeeds.
#[derive(Debug, Clone, Default)]
pub struct RecordingRunner {
    calls: Arc<Mutex<Vec<CommandSpec>>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded commands, in order.
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, spec: &CommandSpec) -> StrataResult<CommandOutput> {
        self.calls
            .lock()
            .map_err(|_| POISONED)?
            .push(spec.clone());
        Ok(CommandOutput::success())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn captures_stdout_and_exit_code() {
        let temp = TempDir::new().unwrap();
        let spec = CommandSpec::new("sh", temp.path()).args(["-c", "echo hello; exit 3"]);

        let out = ProcessRunner::new().run(&spec).unwrap();

        assert_eq!(out.stdout.trim(), "hello");
        assert_eq!(out.exit_code, Some(3));
        assert!(!out.is_success());
    }

    #[test]
    fn runs_in_the_given_directory() {
        let temp = TempDir::new().unwrap();
        let spec = CommandSpec::new("sh", temp.path()).args(["-c", "touch marker"]);

        ProcessRunner::new().run(&spec).unwrap();

        assert!(temp.path().join("marker").exists());
    }

    #[test]
    fn feeds_stdin() {
        let temp = TempDir::new().unwrap();
        let spec = CommandSpec::new("sh", temp.path())
            .args(["-c", "read answer; echo got-$answer"])
            .stdin("y\n");

        let out = ProcessRunner::new().run(&spec).unwrap();

        assert_eq!(out.stdout.trim(), "got-y");
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let temp = TempDir::new().unwrap();
        let spec = CommandSpec::new("definitely-not-a-real-program-xyz", temp.path());

        let err = ProcessRunner::new().run(&spec).unwrap_err();

        assert!(err.to_string().contains("Could not run"));
    }

    #[test]
    fn recording_runner_never_spawns() {
        let runner = RecordingRunner::new();
        let spec = CommandSpec::new("rm", "/").args(["-rf", "/"]);

        assert!(runner.run(&spec).unwrap().is_success());
        assert_eq!(runner.calls(), vec![spec]);
    }

    #[test]
    fn poisoned_recorder_names_itself() {
        let runner = RecordingRunner::new();
        let calls = runner.calls.clone();
        let _ = std::thread::spawn(move || {
            let _held = calls.lock().unwrap();
            panic!("panic while recording");
        })
        .join();

        let err = runner.run(&CommandSpec::new("git", "/tmp")).unwrap_err();

        assert!(matches!(
            err,
            strata_core::error::StrataError::Application(ApplicationError::LockPoisoned {
                resource: "command recorder"
            })
        ));
    }
}
