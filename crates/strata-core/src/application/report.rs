//! Execution results: one [`ExecutionResult`] per module, folded into a
//! [`RecipeExecutionReport`] for the whole run.
//!
//! Results are append-only. Every error and warning keeps the module it came
//! from, and action-level entries also keep the action index and target.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::domain::{ModuleKey, smart_path::PathOverrideWarning};
use crate::error::StrataError;

fn display<T: fmt::Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

fn display_all<T: fmt::Display, S: Serializer>(
    values: &[T],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(values.iter().map(ToString::to_string))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ModuleStatus {
    Succeeded,
    Failed,
    Skipped { reason: String },
}

/// An error attributed to a module and, when it came from an action, to
/// that action's index and target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionError {
    pub module: ModuleKey,
    pub action_index: Option<usize>,
    pub target: Option<String>,
    #[serde(serialize_with = "display")]
    pub error: StrataError,
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.module)?;
        if let Some(index) = self.action_index {
            write!(f, " action #{index}")?;
        }
        if let Some(target) = &self.target {
            write!(f, " ({target})")?;
        }
        write!(f, ": {}", self.error)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub action_index: Option<usize>,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.action_index {
            Some(index) => write!(f, "action #{index}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Outcome of one module.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionResult {
    #[serde(serialize_with = "display")]
    pub module: ModuleKey,
    pub status: ModuleStatus,
    pub files_written: Vec<PathBuf>,
    pub dependencies_to_install: Vec<String>,
    pub scripts_to_register: Vec<String>,
    pub errors: Vec<ActionError>,
    pub warnings: Vec<Warning>,
    /// Informational entries such as actions skipped by their condition.
    pub notes: Vec<String>,
    /// Every smart path override in effect for this module.
    pub path_overrides: Vec<PathOverrideWarning>,
    pub duration_ms: u64,
}

impl ExecutionResult {
    pub fn new(module: ModuleKey) -> Self {
        Self {
            module,
            status: ModuleStatus::Succeeded,
            files_written: Vec::new(),
            dependencies_to_install: Vec::new(),
            scripts_to_register: Vec::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            notes: Vec::new(),
            path_overrides: Vec::new(),
            duration_ms: 0,
        }
    }

    /// A module that failed before its blueprint ran.
    pub fn failed(module: ModuleKey, error: impl Into<StrataError>) -> Self {
        let mut result = Self::new(module);
        result.record_error(None, None, error);
        result.finalize();
        result
    }

    pub fn skipped(module: ModuleKey, reason: impl Into<String>) -> Self {
        let mut result = Self::new(module);
        result.status = ModuleStatus::Skipped {
            reason: reason.into(),
        };
        result
    }

    pub fn record_error(
        &mut self,
        action_index: Option<usize>,
        target: Option<String>,
        error: impl Into<StrataError>,
    ) {
        self.errors.push(ActionError {
            module: self.module.clone(),
            action_index,
            target,
            error: error.into(),
        });
    }

    pub fn warn(&mut self, action_index: Option<usize>, message: impl Into<String>) {
        self.warnings.push(Warning {
            action_index,
            message: message.into(),
        });
    }

    pub fn note(&mut self, message: impl Into<String>) {
        self.notes.push(message.into());
    }

    pub fn file_written(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if !self.files_written.contains(&path) {
            self.files_written.push(path);
        }
    }

    /// Settle the status from the recorded errors. Skipped results stay skipped.
    pub fn finalize(&mut self) {
        if self.is_skipped() {
            return;
        }
        self.status = if self.errors.is_empty() {
            ModuleStatus::Succeeded
        } else {
            ModuleStatus::Failed
        };
    }

    pub fn is_success(&self) -> bool {
        self.status == ModuleStatus::Succeeded
    }

    pub fn is_failed(&self) -> bool {
        self.status == ModuleStatus::Failed
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.status, ModuleStatus::Skipped { .. })
    }
}

/// Cumulative report for one recipe run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeExecutionReport {
    pub run_id: Uuid,
    pub project: String,
    pub project_root: PathBuf,
    pub started_at: DateTime<Utc>,
    #[serde(serialize_with = "display_all")]
    pub order: Vec<ModuleKey>,
    pub modules: Vec<ExecutionResult>,
    /// Errors that stopped the run as a whole (recipe shape, planning).
    #[serde(serialize_with = "display_all")]
    pub fatal_errors: Vec<StrataError>,
    pub warnings: Vec<String>,
    /// The run was interrupted; modules after the interruption were skipped.
    pub cancelled: bool,
    pub duration_ms: u64,
}

impl RecipeExecutionReport {
    pub fn new(project: impl Into<String>, project_root: impl Into<PathBuf>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            project: project.into(),
            project_root: project_root.into(),
            started_at: Utc::now(),
            order: Vec::new(),
            modules: Vec::new(),
            fatal_errors: Vec::new(),
            warnings: Vec::new(),
            cancelled: false,
            duration_ms: 0,
        }
    }

    pub fn push(&mut self, result: ExecutionResult) {
        self.modules.push(result);
    }

    /// No fatal error and every module succeeded.
    pub fn is_success(&self) -> bool {
        self.fatal_errors.is_empty() && self.modules.iter().all(ExecutionResult::is_success)
    }

    pub fn has_fatal_errors(&self) -> bool {
        !self.fatal_errors.is_empty()
    }

    pub fn result(&self, key: &ModuleKey) -> Option<&ExecutionResult> {
        self.modules.iter().find(|r| &r.module == key)
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &ExecutionResult> {
        self.modules.iter().filter(|r| r.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &ExecutionResult> {
        self.modules.iter().filter(|r| r.is_failed())
    }

    pub fn skipped(&self) -> impl Iterator<Item = &ExecutionResult> {
        self.modules.iter().filter(|r| r.is_skipped())
    }

    /// Every action error across modules, in execution order.
    pub fn errors(&self) -> impl Iterator<Item = &ActionError> {
        self.modules.iter().flat_map(|r| r.errors.iter())
    }

    pub fn files_written(&self) -> BTreeSet<&PathBuf> {
        self.modules.iter().flat_map(|r| r.files_written.iter()).collect()
    }

    /// De-duplicated packages requested by all modules, in first-seen order.
    pub fn dependencies_to_install(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.modules
            .iter()
            .flat_map(|r| r.dependencies_to_install.iter())
            .filter(|d| seen.insert(d.as_str()))
            .map(String::as_str)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ApplicationError;
    use crate::domain::ModuleCategory;

    fn key(id: &str) -> ModuleKey {
        ModuleKey::new(ModuleCategory::Tooling, id)
    }

    #[test]
    fn errors_fail_a_module_warnings_do_not() {
        let mut result = ExecutionResult::new(key("a"));
        result.warn(Some(0), "heads up");
        result.finalize();
        assert!(result.is_success());

        result.record_error(
            Some(1),
            Some("README.md".into()),
            ApplicationError::FilesystemError {
                path: "README.md".into(),
                reason: "denied".into(),
            },
        );
        result.finalize();
        assert!(result.is_failed());
        assert_eq!(
            result.errors[0].to_string(),
            "[tooling:a] action #1 (README.md): Filesystem error at README.md: denied"
        );
    }

    #[test]
    fn skipped_status_survives_finalize() {
        let mut result = ExecutionResult::skipped(key("b"), "dependency failed");
        result.finalize();
        assert!(result.is_skipped());
    }

    #[test]
    fn report_aggregates_dependencies_without_duplicates() {
        let mut report = RecipeExecutionReport::new("demo", "/tmp/demo");
        let mut a = ExecutionResult::new(key("a"));
        a.dependencies_to_install = vec!["zod@^3".into(), "drizzle-orm@^0.30".into()];
        let mut b = ExecutionResult::new(key("b"));
        b.dependencies_to_install = vec!["zod@^3".into()];
        report.push(a);
        report.push(b);

        assert_eq!(report.dependencies_to_install(), vec!["zod@^3", "drizzle-orm@^0.30"]);
        assert!(report.is_success());
    }

    #[test]
    fn report_serializes_errors_as_messages() {
        let mut report = RecipeExecutionReport::new("demo", "/tmp/demo");
        report.push(ExecutionResult::failed(
            key("x"),
            ApplicationError::AdapterNotFound {
                category: "tooling".into(),
                id: "x".into(),
            },
        ));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["modules"][0]["module"], "tooling:x");
        assert_eq!(json["modules"][0]["status"]["state"], "failed");
        assert_eq!(
            json["modules"][0]["errors"][0]["error"],
            "No adapter registered for 'tooling:x'"
        );
        assert!(!report.is_success());
    }
}
