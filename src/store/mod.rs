//! Account store: operation protocols over the shared ledger file
//!
//! Orchestrates the locator, the lock manager, and the codec. Every
//! operation is a short state sequence: probe, acquire, mutate,
//! release. A path that acquires a lock releases it exactly once on
//! every exit, including validation failures, lookup failures after
//! acquisition, and write failures (the guard drop is the backstop).
//!
//! Lock scopes:
//! - Inspect and attribute reads hold nothing; they only probe.
//! - Withdraw locks the full record line.
//! - Deposit locks only the balance byte sub-range. The rewrite still
//!   touches bytes outside that sub-range; this is an accepted
//!   limitation, not true attribute isolation.
//! - Delete locks the whole file.
//!
//! The probe/acquire pair is racy by construction: another owner can
//! take the range between the two calls. The store tolerates this by
//! always performing the real non-blocking acquire and treating its
//! denial as authoritative.

mod errors;
mod locator;

pub use errors::{StoreError, StoreResult};
pub use locator::{find_by_key, ScanHit, Span};

use std::fs::{File, OpenOptions};
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::lock::{ByteRange, LockManager, Probe};
use crate::record::{tombstone_line, Account};

/// A record attribute addressable by the attribute-read operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Name,
    Surname,
    Balance,
}

/// Store over one open handle to the shared ledger file.
///
/// The handle doubles as the lock owner: all locks taken through this
/// store die with it. Offsets are threaded explicitly through every
/// read and write; no operation depends on a prior operation's cursor
/// state.
pub struct AccountStore {
    file: Arc<File>,
    locks: LockManager,
    path: PathBuf,
}

impl AccountStore {
    /// Opens (or creates) the ledger file for shared read/write use.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        let file = Arc::new(file);

        Ok(Self {
            locks: LockManager::new(Arc::clone(&file)),
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read-only snapshot of a record. Takes no lock; only probes the
    /// whole file for a foreign exclusive hold.
    pub fn inspect(&self, key: u32) -> StoreResult<Account> {
        self.ensure_file_free()?;
        Ok(self.find(key)?.account)
    }

    /// Withdraws `amount` under a record-granularity lock.
    ///
    /// Succeeds iff `0 < amount <= balance`; on success the full line
    /// is rewritten at its existing offset with the new balance.
    pub fn withdraw(&self, key: u32, amount: f64) -> StoreResult<Account> {
        self.ensure_file_free()?;
        let hit = self.find(key)?;

        self.with_lock(hit.span.record_range(), || {
            if amount <= 0.0 {
                return Err(StoreError::InvalidAmount(format!(
                    "withdrawal must be positive, got {:.2}",
                    amount
                )));
            }
            if amount > hit.account.balance {
                return Err(StoreError::InvalidAmount(format!(
                    "insufficient funds: balance {:.2}, requested {:.2}",
                    hit.account.balance, amount
                )));
            }

            let mut account = hit.account.clone();
            account.balance -= amount;
            self.rewrite(&account, hit.span.record_offset)?;
            Ok(account)
        })
    }

    /// Deposits `amount` under an attribute-granularity lock on the
    /// balance byte sub-range.
    ///
    /// Succeeds iff `amount > 0`; on success the full line is
    /// rewritten at its existing offset.
    pub fn deposit(&self, key: u32, amount: f64) -> StoreResult<Account> {
        self.ensure_file_free()?;
        let hit = self.find(key)?;
        let balance_range = hit
            .span
            .balance
            .ok_or(StoreError::MalformedRecord(key))?;

        self.with_lock(balance_range, || {
            if amount <= 0.0 {
                return Err(StoreError::InvalidAmount(format!(
                    "deposit must be positive, got {:.2}",
                    amount
                )));
            }

            let mut account = hit.account.clone();
            account.balance += amount;
            self.rewrite(&account, hit.span.record_offset)?;
            Ok(account)
        })
    }

    /// Deletes a record under a whole-file lock by overwriting its
    /// line with the `#DELETED,<key>` tombstone.
    ///
    /// The acquire itself is the gate; there is no prior probe. The
    /// record's bytes stay on disk permanently, and when the
    /// tombstone's length differs from the line's, byte offsets of
    /// later records go stale until those records are rewritten. No
    /// offset reconciliation is performed.
    pub fn delete(&self, key: u32) -> StoreResult<()> {
        self.with_lock(ByteRange::whole_file(), || {
            let hit = find_by_key(&self.file, key)?.ok_or(StoreError::NotFound(key))?;
            self.file
                .write_all_at(tombstone_line(key).as_bytes(), hit.span.record_offset)?;
            Ok(())
        })
    }

    /// Reads one attribute of a record without taking any lock.
    ///
    /// The balance attribute additionally probes its own byte
    /// sub-range, since a depositor may hold it; name and surname are
    /// gated only by the whole-file probe.
    pub fn attribute(&self, key: u32, attribute: Attribute) -> StoreResult<String> {
        self.ensure_file_free()?;
        let hit = self.find(key)?;

        match attribute {
            Attribute::Name => Ok(hit.account.name),
            Attribute::Surname => Ok(hit.account.surname),
            Attribute::Balance => {
                let range = hit
                    .span
                    .balance
                    .ok_or(StoreError::MalformedRecord(key))?;
                match self.locks.probe(range)? {
                    Probe::Available => Ok(format!("{:.2}", hit.account.balance)),
                    Probe::HeldByOther => Err(StoreError::Busy(range)),
                }
            }
        }
    }

    /// Appends a well-formed record line at end-of-file. Used by the
    /// fixture loader; not part of the interactive surface.
    pub fn append(&self, account: &Account) -> StoreResult<u64> {
        let line = account.encode()?;
        let offset = self.file.metadata()?.len();
        self.file.write_all_at(line.as_bytes(), offset)?;
        Ok(offset)
    }

    /// Exposes the lock manager for callers that need raw range
    /// probes or holds (tests, external collaborators).
    pub fn locks(&self) -> &LockManager {
        &self.locks
    }

    fn find(&self, key: u32) -> StoreResult<ScanHit> {
        find_by_key(&self.file, key)?.ok_or(StoreError::NotFound(key))
    }

    /// Whole-file probe performed before lookups: if another owner
    /// holds any byte exclusively, report Busy and stop.
    fn ensure_file_free(&self) -> StoreResult<()> {
        match self.locks.probe(ByteRange::whole_file())? {
            Probe::Available => Ok(()),
            Probe::HeldByOther => Err(StoreError::Busy(ByteRange::whole_file())),
        }
    }

    /// Runs `body` under an exclusive lock on `range`.
    ///
    /// On success the lock is released explicitly so a release
    /// failure surfaces; on error the guard drop releases before the
    /// error propagates.
    fn with_lock<T>(
        &self,
        range: ByteRange,
        body: impl FnOnce() -> StoreResult<T>,
    ) -> StoreResult<T> {
        let guard = self.locks.acquire(range)?;
        match body() {
            Ok(value) => {
                guard.release()?;
                Ok(value)
            }
            Err(e) => {
                drop(guard);
                Err(e)
            }
        }
    }

    /// Rewrites a record's full line at its existing offset with the
    /// balance formatted to two fraction digits.
    fn rewrite(&self, account: &Account, offset: u64) -> StoreResult<()> {
        let line = account.encode()?;
        self.file.write_all_at(line.as_bytes(), offset)?;
        Ok(())
    }
}
