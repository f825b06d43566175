//! Store error taxonomy
//!
//! Nothing here is fatal to the process: every variant is reported to
//! the caller, who decides whether to retry, re-prompt, or exit.

use std::io;

use thiserror::Error;

use crate::lock::{ByteRange, LockError};
use crate::record::CodecError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Store operation failures
#[derive(Debug, Error)]
pub enum StoreError {
    /// Key absent from the scanned file. Recoverable.
    #[error("account {0} not found")]
    NotFound(u32),

    /// An overlapping range is held by another owner at probe or
    /// acquire time. Recoverable; the caller should retry later.
    #[error("byte range {0} is held by another owner, try again later")]
    Busy(ByteRange),

    /// Non-positive amount, or a withdrawal exceeding the balance.
    /// No mutation was performed.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// The record decoded but its balance byte span could not be
    /// determined, so an attribute-granular operation cannot proceed.
    #[error("record for account {0} is malformed: balance span unavailable")]
    MalformedRecord(u32),

    /// Encode failure while rewriting a record.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Read, write, or open failure on the underlying file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl StoreError {
    /// Stable error code string for structured output.
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::NotFound(_) => "LEDGER_NOT_FOUND",
            StoreError::Busy(_) => "LEDGER_BUSY",
            StoreError::InvalidAmount(_) => "LEDGER_INVALID_AMOUNT",
            StoreError::MalformedRecord(_) => "LEDGER_MALFORMED_RECORD",
            StoreError::Codec(_) => "LEDGER_CODEC_ERROR",
            StoreError::Io(_) => "LEDGER_IO_ERROR",
        }
    }

    /// Whether the caller can retry the operation unchanged and
    /// expect it to succeed once the conflicting owner releases.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Busy(_))
    }
}

impl From<LockError> for StoreError {
    fn from(e: LockError) -> Self {
        match e {
            LockError::Busy(range) => StoreError::Busy(range),
            LockError::Io(io) => StoreError::Io(io),
            LockError::NotHeld(range) => StoreError::Io(io::Error::new(
                io::ErrorKind::Other,
                format!("released byte range {} which this handle does not hold", range),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_busy_is_retryable() {
        assert!(StoreError::Busy(ByteRange::whole_file()).is_retryable());
        assert!(!StoreError::NotFound(10).is_retryable());
        assert!(!StoreError::InvalidAmount("negative".into()).is_retryable());
    }

    #[test]
    fn test_lock_busy_maps_to_store_busy() {
        let mapped: StoreError = LockError::Busy(ByteRange::new(4, 8)).into();
        assert!(matches!(mapped, StoreError::Busy(_)));
        assert_eq!(mapped.code(), "LEDGER_BUSY");
    }
}
