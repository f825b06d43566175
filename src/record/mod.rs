//! Account record codec
//!
//! One ledger line holds one account in the form:
//!
//! ```text
//! key,name,surname,kind,balance\n
//! ```
//!
//! The codec is pure: it maps between a line of text and an
//! [`Account`], with no I/O. Lines beginning with `#` are structural
//! comments (including tombstones) and are never handed to the codec
//! by the scan layer.

mod kind;

pub use kind::AccountKind;

use thiserror::Error;

/// Field delimiter within a record line.
pub const FIELD_DELIMITER: char = ',';

/// Byte that marks a comment or tombstone line.
pub const COMMENT_BYTE: u8 = b'#';

/// Prefix of a tombstone line; the full form is `#DELETED,<key>`.
pub const TOMBSTONE_PREFIX: &str = "#DELETED,";

/// Fixed line buffer bound. A serialized record, terminator included,
/// must fit in this many bytes.
pub const MAX_LINE_LEN: usize = 256;

const FIELD_COUNT: usize = 5;

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Codec failures. A decode failure marks the line as malformed; the
/// scan layer skips such lines rather than aborting a lookup.
#[derive(Debug, Clone, Error)]
pub enum CodecError {
    #[error("expected {FIELD_COUNT} fields, found {0}")]
    FieldCount(usize),

    #[error("key is not an integer: {0:?}")]
    BadKey(String),

    #[error("balance is not a decimal amount: {0:?}")]
    BadBalance(String),

    #[error("field contains the delimiter: {0:?}")]
    DelimiterInField(String),

    #[error("serialized line is {0} bytes, exceeds the {MAX_LINE_LEN}-byte line buffer")]
    LineTooLong(usize),
}

/// One decoded ledger record.
///
/// Key uniqueness is not enforced by the store; a duplicate key
/// resolves to the first match in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub key: u32,
    pub name: String,
    pub surname: String,
    pub kind: AccountKind,
    pub balance: f64,
}

impl Account {
    pub fn new(
        key: u32,
        name: impl Into<String>,
        surname: impl Into<String>,
        kind: AccountKind,
        balance: f64,
    ) -> Self {
        Self {
            key,
            name: name.into(),
            surname: surname.into(),
            kind,
            balance,
        }
    }

    /// Decodes one line (without its terminator) into an account.
    ///
    /// The line must split on exactly four delimiters into five
    /// fields, and the key and balance fields must parse as their
    /// numeric types. The kind token never fails the decode: an
    /// unrecognized token becomes [`AccountKind::Unknown`].
    pub fn decode(line: &str) -> CodecResult<Self> {
        let fields: Vec<&str> = line.split(FIELD_DELIMITER).collect();
        if fields.len() != FIELD_COUNT {
            return Err(CodecError::FieldCount(fields.len()));
        }

        let key = fields[0]
            .trim()
            .parse::<u32>()
            .map_err(|_| CodecError::BadKey(fields[0].to_string()))?;

        let balance = fields[4]
            .trim()
            .parse::<f64>()
            .map_err(|_| CodecError::BadBalance(fields[4].to_string()))?;

        Ok(Self {
            key,
            name: fields[1].to_string(),
            surname: fields[2].to_string(),
            kind: AccountKind::from_token(fields[3]),
            balance,
        })
    }

    /// Encodes the account as a newline-terminated ledger line, with
    /// the balance formatted to exactly two fraction digits.
    ///
    /// Fails if a string field contains the delimiter or the line
    /// would overflow the fixed line buffer.
    pub fn encode(&self) -> CodecResult<String> {
        for field in [&self.name, &self.surname] {
            if field.contains(FIELD_DELIMITER) {
                return Err(CodecError::DelimiterInField(field.clone()));
            }
        }

        let line = format!(
            "{},{},{},{},{:.2}\n",
            self.key,
            self.name,
            self.surname,
            self.kind.wire_token(),
            self.balance
        );

        if line.len() > MAX_LINE_LEN {
            return Err(CodecError::LineTooLong(line.len()));
        }

        Ok(line)
    }
}

/// Formats the tombstone line written over a deleted record.
pub fn tombstone_line(key: u32) -> String {
    format!("{}{}\n", TOMBSTONE_PREFIX, key)
}
