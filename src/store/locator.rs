//! Record locator: linear scan with explicit offsets
//!
//! Finds a record by key in the unindexed byte stream and reports the
//! exact byte range of its line plus the sub-range of its balance
//! token, so callers can lock at record or attribute granularity.
//!
//! The scan reads fixed-size chunks at explicit offsets (`read_at`,
//! no shared cursor) into a line-reassembly buffer. Lines that fail
//! to decode are skipped without aborting the lookup; comment and
//! tombstone lines (`#` prefix) are never key-matched. Every lookup
//! is a full linear pass up to the match point; there is no index.

use std::fs::File;
use std::io;
use std::os::unix::fs::FileExt;

use crate::lock::ByteRange;
use crate::record::{Account, COMMENT_BYTE, FIELD_DELIMITER, MAX_LINE_LEN};

const CHUNK_SIZE: usize = 8192;

/// Byte addresses of a located record.
///
/// Valid only immediately after the lookup that produced it: another
/// process may mutate the file at any time, so every mutation
/// re-validates through its own lock acquisition before writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Offset of the line's first byte.
    pub record_offset: u64,
    /// Length of the full line, terminator included.
    pub record_len: u64,
    /// Byte sub-range of the balance token, `None` when it cannot be
    /// determined.
    pub balance: Option<ByteRange>,
}

impl Span {
    /// The record-granularity lock range: the full line.
    pub fn record_range(&self) -> ByteRange {
        ByteRange::new(self.record_offset, self.record_len)
    }
}

/// A record found by the scan, with its byte addresses.
#[derive(Debug, Clone)]
pub struct ScanHit {
    pub account: Account,
    pub span: Span,
}

/// Scans `file` from byte 0 for the first record whose key equals
/// `key`. Returns `None` when no line matches.
pub fn find_by_key(file: &File, key: u32) -> io::Result<Option<ScanHit>> {
    let mut chunk = [0u8; CHUNK_SIZE];
    let mut pending: Vec<u8> = Vec::new();
    let mut read_pos: u64 = 0;
    let mut line_start: u64 = 0;

    loop {
        let n = file.read_at(&mut chunk, read_pos)?;
        if n == 0 {
            // Final line may lack a terminator.
            if !pending.is_empty() {
                if let Some(hit) = match_line(&pending, false, line_start, key) {
                    return Ok(Some(hit));
                }
            }
            return Ok(None);
        }
        read_pos += n as u64;
        pending.extend_from_slice(&chunk[..n]);

        while let Some(newline) = pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = pending.drain(..=newline).collect();
            if let Some(hit) = match_line(&line, true, line_start, key) {
                return Ok(Some(hit));
            }
            line_start += line.len() as u64;
        }
    }
}

/// Decodes one reassembled line and matches it against the target
/// key. Comment lines, undecodable lines, oversized lines, and
/// non-UTF-8 lines all return `None`; the scan tolerates them and
/// moves on.
fn match_line(line: &[u8], terminated: bool, line_start: u64, key: u32) -> Option<ScanHit> {
    let body = if terminated {
        &line[..line.len() - 1]
    } else {
        line
    };

    if body.is_empty() || body[0] == COMMENT_BYTE || line.len() > MAX_LINE_LEN {
        return None;
    }

    let text = std::str::from_utf8(body).ok()?;
    let account = Account::decode(text).ok()?;
    if account.key != key {
        return None;
    }

    // Balance token runs from the byte after the last delimiter to
    // end-of-line, terminator excluded.
    let balance = text.rfind(FIELD_DELIMITER).map(|delim| {
        let start = delim + 1;
        ByteRange::new(line_start + start as u64, (body.len() - start) as u64)
    });

    Some(ScanHit {
        account,
        span: Span {
            record_offset: line_start,
            record_len: line.len() as u64,
            balance,
        },
    })
}
