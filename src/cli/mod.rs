//! CLI module for ledgerfile
//!
//! Provides the command-line interface:
//! - init: create or reset a seeded ledger file
//! - inspect / withdraw / deposit / delete / attribute: one ledger
//!   operation per invocation

mod args;
mod commands;
mod errors;
mod io;

pub use args::{AttributeArg, Cli, Command};
pub use commands::{run_command, Config};
pub use errors::{CliError, CliResult};
pub use io::{write_error, write_response};

use crate::observability::{Logger, Severity};

/// Parse arguments, run the selected command, and render failures as
/// a JSON error line plus a log event. The caller decides the exit
/// code.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();

    match run_command(cli) {
        Ok(()) => Ok(()),
        Err(e) => {
            Logger::log(
                Severity::Warn,
                "operation_failed",
                &[("code", e.code()), ("message", &e.to_string())],
            );
            write_error(e.code(), &e.to_string())?;
            Err(e)
        }
    }
}
