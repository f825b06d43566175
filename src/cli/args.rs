//! CLI argument definitions using clap
//!
//! Each invocation performs exactly one ledger operation:
//! - ledgerfile init [--config <path>] [--file <path>]
//! - ledgerfile inspect <file> --key K
//! - ledgerfile withdraw <file> --key K --amount A
//! - ledgerfile deposit <file> --key K --amount A
//! - ledgerfile delete <file> --key K
//! - ledgerfile attribute <file> --key K --field name|surname|balance

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::store::Attribute;

/// ledgerfile - a concurrent flat-file account ledger
#[derive(Parser, Debug)]
#[command(name = "ledgerfile")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create (or reset) a ledger file seeded with fixture accounts
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./ledgerfile.json")]
        config: PathBuf,

        /// Ledger file path, overriding the configured one
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Show a full account record
    Inspect {
        /// Ledger file path
        file: PathBuf,

        /// Account key
        #[arg(long)]
        key: u32,
    },

    /// Withdraw an amount under a record-level lock
    Withdraw {
        /// Ledger file path
        file: PathBuf,

        /// Account key
        #[arg(long)]
        key: u32,

        /// Amount to withdraw
        #[arg(long)]
        amount: f64,
    },

    /// Deposit an amount under a balance-attribute lock
    Deposit {
        /// Ledger file path
        file: PathBuf,

        /// Account key
        #[arg(long)]
        key: u32,

        /// Amount to deposit
        #[arg(long)]
        amount: f64,
    },

    /// Delete an account under a whole-file lock
    Delete {
        /// Ledger file path
        file: PathBuf,

        /// Account key
        #[arg(long)]
        key: u32,
    },

    /// Show a single attribute of an account
    Attribute {
        /// Ledger file path
        file: PathBuf,

        /// Account key
        #[arg(long)]
        key: u32,

        /// Attribute to display
        #[arg(long, value_enum)]
        field: AttributeArg,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum AttributeArg {
    Name,
    Surname,
    Balance,
}

impl From<AttributeArg> for Attribute {
    fn from(arg: AttributeArg) -> Self {
        match arg {
            AttributeArg::Name => Attribute::Name,
            AttributeArg::Surname => Attribute::Surname,
            AttributeArg::Balance => Attribute::Balance,
        }
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
