//! ledgerfile - a concurrent flat-file account ledger
//!
//! One mutable text file, one record per line, shared by independent
//! processes and arbitrated by advisory byte-range locks at three
//! granularities: whole file, full record, single attribute.

pub mod cli;
pub mod fixtures;
pub mod lock;
pub mod observability;
pub mod record;
pub mod store;
