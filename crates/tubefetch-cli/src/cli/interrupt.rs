//! Ctrl-C handling.
//!
//! A blocked prompt read cannot be woken, so the handler does not try to
//! unwind the session: it deletes whatever scratch the running job holds,
//! prints the cancellation line and exits from the handler thread.

use std::io::{self, Write};
use tubefetch_core::job::ScratchRegistry;

use super::session::{SessionOutcome, CANCELLED_LINE};

/// Install the process-wide Ctrl-C handler. Failure only loses the cleanup on interrupt.
pub fn install(scratch: ScratchRegistry) {
    let result = ctrlc::set_handler(move || {
        let code = on_interrupt(&scratch, &mut io::stdout().lock());
        std::process::exit(code);
    });
    if let Err(e) = result {
        tracing::warn!("could not install Ctrl-C handler: {}", e);
    }
}

/// Removes live scratch files, reports the cancellation and returns the exit code.
pub(super) fn on_interrupt(scratch: &ScratchRegistry, out: &mut impl Write) -> i32 {
    tracing::info!("interrupted by user");
    for warning in scratch.remove_all() {
        tracing::warn!("{}", warning);
        let _ = writeln!(out, "\nWarning: {warning}");
    }
    let _ = writeln!(out, "{CANCELLED_LINE}");
    let _ = out.flush();
    SessionOutcome::Cancelled.exit_code()
}
