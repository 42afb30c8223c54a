//! Progress bar for recipe runs.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use strata_core::application::{ExecutionObserver, ExecutionResult, ModuleStatus};
use strata_core::domain::ModuleKey;

/// Drives an `indicatif` bar from orchestrator callbacks.  Hidden when
/// `visible` is false (quiet, JSON or non-TTY output).
pub struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    pub fn new(visible: bool) -> Self {
        let bar = ProgressBar::with_draw_target(Some(0), Self::target(visible));
        let style = ProgressStyle::with_template("{spinner:.cyan} [{pos}/{len}] {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ");
        bar.set_style(style);
        Self { bar }
    }

    fn target(visible: bool) -> ProgressDrawTarget {
        if visible {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        }
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl ExecutionObserver for ProgressObserver {
    fn run_started(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
    }

    fn module_started(&self, key: &ModuleKey, _position: usize) {
        self.bar.set_message(format!("{key}"));
    }

    fn module_finished(&self, result: &ExecutionResult) {
        if let ModuleStatus::Failed = result.status {
            self.bar.println(format!("\u{2717} {}", result.module));
        }
        self.bar.inc(1);
    }

    fn run_finished(&self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::domain::ModuleCategory;

    #[test]
    fn counts_finished_modules() {
        let observer = ProgressObserver::new(false);
        let key = ModuleKey::new(ModuleCategory::Framework, "nextjs");

        observer.run_started(2);
        observer.module_started(&key, 0);
        observer.module_finished(&ExecutionResult::new(key.clone()));
        observer.module_finished(&ExecutionResult::skipped(key, "cancelled"));

        assert_eq!(observer.position(), 2);
        observer.run_finished();
    }
}
