//! Ctrl-C handling for recipe runs.
//!
//! The first interrupt sets the run's cancellation flag: the module in
//! progress finishes, the rest are skipped and project state is still saved.
//! A second interrupt exits immediately.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

use strata_core::application::CancellationFlag;

/// Conventional exit status for a process stopped by SIGINT.
pub const INTERRUPTED_EXIT_CODE: u8 = 130;

static FLAG: OnceLock<CancellationFlag> = OnceLock::new();

/// The process-wide flag Ctrl-C sets. The handler is installed on first use;
/// if that fails the run simply cannot be interrupted gracefully.
pub fn cancellation_flag() -> CancellationFlag {
    FLAG.get_or_init(|| {
        let flag = CancellationFlag::default();
        let handler_flag = flag.clone();
        match ctrlc::set_handler(move || on_interrupt(&handler_flag)) {
            Ok(()) => debug!("Ctrl-C handler installed"),
            Err(e) => warn!(error = %e, "Could not install Ctrl-C handler"),
        }
        flag
    })
    .clone()
}

/// Returns whether this was the first interrupt.
fn request_stop(flag: &AtomicBool) -> bool {
    !flag.swap(true, Ordering::SeqCst)
}

fn on_interrupt(flag: &AtomicBool) {
    if request_stop(flag) {
        eprintln!("\nInterrupted: stopping after the current module (Ctrl-C again to abort)");
    } else {
        std::process::exit(i32::from(INTERRUPTED_EXIT_CODE));
    }
}
