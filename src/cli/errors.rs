//! CLI-specific error types

use std::io;

use thiserror::Error;

use crate::store::StoreError;

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

/// CLI errors: configuration problems, terminal I/O problems, and
/// store failures bubbling up from an operation.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CliError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        CliError::Config(msg.into())
    }

    /// Stable error code string for structured output.
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Config(_) => "LEDGER_CLI_CONFIG_ERROR",
            CliError::Io(_) => "LEDGER_CLI_IO_ERROR",
            CliError::Store(e) => e.code(),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Io(io::Error::new(io::ErrorKind::InvalidData, e))
    }
}
