use glaunch_core::logging;

mod cli;

use crate::cli::Cli;

fn main() {
    // Initialize logging as early as possible; fall back to stderr when the
    // state dir is unwritable.
    if logging::init_logging().is_err() {
        logging::init_logging_stderr();
    }

    match Cli::run_from_args() {
        // The process exit code equals the wrapped Gradle's exit code.
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("glaunch error: {:#}", err);
            std::process::exit(1);
        }
    }
}
