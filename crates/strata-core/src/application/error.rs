//! Application layer errors.
//!
//! These errors represent failures in orchestration and I/O, not business
//! rules. Business rule violations are `DomainError` from `crate::domain`.

use std::path::PathBuf;
use thiserror::Error;

use crate::error::ErrorCategory;

/// Errors that occur while loading adapters and executing blueprints.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApplicationError {
    /// No adapter registered for the exact `(category, id)` pair.
    #[error("No adapter registered for '{category}:{id}'")]
    AdapterNotFound { category: String, id: String },

    /// `ENHANCE_FILE` target does not exist.
    #[error("Cannot enhance {path}: file does not exist")]
    TargetFileMissing { path: PathBuf },

    /// Filesystem operation failed.
    #[error("Filesystem error at {path}: {reason}")]
    FilesystemError { path: PathBuf, reason: String },

    /// External command exited unsuccessfully.
    #[error("Command `{command}` failed with {}: {stderr}", exit_status(.exit_code))]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// External command could not be started at all.
    #[error("Could not run `{command}`: {reason}")]
    CommandSpawn { command: String, reason: String },

    /// A later action required an earlier one that failed.
    #[error("Blueprint halted at action #{action_index}: required action '{requires}' failed")]
    BlueprintHalted { action_index: usize, requires: String },

    /// A shared in-process store was poisoned by a panic while locked.
    #[error("The {resource} is unusable: a previous operation panicked while holding its lock")]
    LockPoisoned { resource: &'static str },

    /// The caller cancelled the run before this module started.
    #[error("Run cancelled before this module started")]
    Cancelled,
}

impl ApplicationError {
    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::AdapterNotFound { category, id } => vec![
                format!("Nothing is registered as '{category}:{id}' (names are case-sensitive)"),
                "Try: strata list to see available adapters".into(),
            ],
            Self::TargetFileMissing { path } => vec![
                format!("{} must be created before it can be enhanced", path.display()),
                "Check the module order or add the framework module first".into(),
            ],
            Self::FilesystemError { path, .. } => vec![
                format!("Failed to access: {}", path.display()),
                "Check that you have write permissions".into(),
                "Ensure there is enough disk space".into(),
            ],
            Self::CommandFailed { command, .. } => vec![
                format!("Run `{command}` by hand inside the project to see the full output"),
            ],
            Self::CommandSpawn { command, .. } => vec![
                format!("Make sure the program in `{command}` is installed and on PATH"),
            ],
            Self::LockPoisoned { resource } => vec![
                format!("The {resource} cannot be trusted after the earlier panic"),
                "Re-run the command; files written before the panic are left in place".into(),
            ],
            _ => vec!["Check the error details above".into()],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::AdapterNotFound { .. } | Self::TargetFileMissing { .. } => {
                ErrorCategory::NotFound
            }
            Self::FilesystemError { .. } | Self::LockPoisoned { .. } => ErrorCategory::Internal,
            Self::CommandFailed { .. } | Self::CommandSpawn { .. } => ErrorCategory::Internal,
            Self::BlueprintHalted { .. } | Self::Cancelled => ErrorCategory::Internal,
        }
    }
}

fn exit_status(code: &Option<i32>) -> String {
    code.map_or_else(|| "a signal".to_string(), |c| format!("exit code {c}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_failure_message_includes_exit_code() {
        let err = ApplicationError::CommandFailed {
            command: "npm install".into(),
            exit_code: Some(1),
            stderr: "ENOENT".into(),
        };
        assert_eq!(err.to_string(), "Command `npm install` failed with exit code 1: ENOENT");

        let killed = ApplicationError::CommandFailed {
            command: "x".into(),
            exit_code: None,
            stderr: String::new(),
        };
        assert!(killed.to_string().contains("a signal"));
    }

    #[test]
    fn poisoned_lock_names_the_resource() {
        let err = ApplicationError::LockPoisoned {
            resource: "command recorder",
        };
        assert!(err.to_string().starts_with("The command recorder is unusable"));
        assert_eq!(err.category(), ErrorCategory::Internal);
    }

    #[test]
    fn adapter_not_found_is_not_found() {
        let err = ApplicationError::AdapterNotFound {
            category: "payment".into(),
            id: "Stripe".into(),
        };
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert!(err.suggestions()[0].contains("case-sensitive"));
    }
}
