//! ledgerfile CLI entry point
//!
//! A minimal entrypoint: parse arguments, dispatch to the CLI
//! module, exit non-zero on failure. All logic lives in `cli`.

use ledgerfile::cli;

fn main() {
    if cli::run().is_err() {
        std::process::exit(1);
    }
}
