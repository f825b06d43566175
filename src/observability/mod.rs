//! Observability for the ledger CLI

mod logger;

pub use logger::{Logger, Severity};
