use tubefetch_core::logging;

mod cli;

use crate::cli::Cli;

fn main() {
    // Initialize logging as early as possible; prompts must stay readable either way.
    if let Err(err) = logging::init_logging() {
        logging::init_logging_stderr();
        tracing::warn!("file logging unavailable, using stderr: {:#}", err);
    }

    match Cli::run_from_args() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("tubefetch error: {:#}", err);
            std::process::exit(1);
        }
    }
}
