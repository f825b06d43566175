//! Advisory byte-range lock manager
//!
//! Wraps non-blocking `fcntl` open-file-description locks (via the
//! `nix` crate, no `unsafe` needed). OFD locks make the open handle
//! the lock owner: two handles to the same file conflict exactly like
//! two processes, and closing the handle drops everything it holds.
//!
//! That handle coupling is modeled explicitly rather than assumed:
//! the manager keeps a table of ranges it currently holds, releasing
//! a range it does not hold is reported as an error, and dropping the
//! manager releases every range still in the table before the handle
//! closes.
//!
//! Granularity is purely the caller's choice of range. A whole-file
//! lock is `ByteRange::whole_file()`, a record lock covers one line,
//! an attribute lock covers one field's bytes; the kernel treats any
//! byte overlap between different owners as a conflict regardless of
//! nesting.

use std::fs::File;
use std::io;
use std::os::fd::AsRawFd;
use std::sync::{Arc, Mutex};

use nix::errno::Errno;
use nix::fcntl::FcntlArg;
use thiserror::Error;

const WRITE_LOCK: i16 = libc::F_WRLCK as i16;
const UNLOCK: i16 = libc::F_UNLCK as i16;

/// Result type for lock operations
pub type LockResult<T> = Result<T, LockError>;

/// Lock failures. `Busy` is a retryable denial, never a wait.
#[derive(Debug, Error)]
pub enum LockError {
    #[error("byte range {0} is held by another owner")]
    Busy(ByteRange),

    #[error("released byte range {0} which this handle does not hold")]
    NotHeld(ByteRange),

    #[error("lock syscall failed: {0}")]
    Io(#[from] io::Error),
}

/// A byte range of the ledger file. `len == 0` means "to end of
/// file", matching the underlying `fcntl` convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub offset: u64,
    pub len: u64,
}

impl ByteRange {
    pub fn new(offset: u64, len: u64) -> Self {
        Self { offset, len }
    }

    /// The whole-file range: every byte from 0 to end of file.
    pub fn whole_file() -> Self {
        Self { offset: 0, len: 0 }
    }
}

impl std::fmt::Display for ByteRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.len == 0 {
            write!(f, "[{}..eof]", self.offset)
        } else {
            write!(f, "[{}..{}]", self.offset, self.offset + self.len)
        }
    }
}

/// Outcome of a side-effect-free probe of a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// No other owner holds an overlapping exclusive lock.
    Available,
    /// An overlapping byte is exclusively held by a different owner.
    HeldByOther,
}

/// Non-blocking advisory lock manager over one open ledger handle.
pub struct LockManager {
    file: Arc<File>,
    held: Mutex<Vec<ByteRange>>,
}

impl LockManager {
    /// Creates a manager owning locks on behalf of `file`.
    ///
    /// The handle must stay open for as long as any lock matters;
    /// locks die with it.
    pub fn new(file: Arc<File>) -> Self {
        Self {
            file,
            held: Mutex::new(Vec::new()),
        }
    }

    /// Probes `range` for locks held by other owners, without
    /// acquiring anything and without side effects.
    ///
    /// A probe is advisory twice over: another owner may take the
    /// range between this call and a later `acquire`, so callers must
    /// treat the later `acquire` result as authoritative.
    pub fn probe(&self, range: ByteRange) -> LockResult<Probe> {
        let mut probe = flock_for(WRITE_LOCK, range);
        nix::fcntl::fcntl(self.file.as_raw_fd(), FcntlArg::F_OFD_GETLK(&mut probe))
            .map_err(|e| LockError::Io(e.into()))?;

        if probe.l_type == UNLOCK {
            Ok(Probe::Available)
        } else {
            Ok(Probe::HeldByOther)
        }
    }

    /// Attempts to take an exclusive lock over `range`; never blocks.
    ///
    /// Returns `LockError::Busy` immediately if any overlapping byte
    /// is exclusively held by a different owner. On success the range
    /// is recorded in the held table and a guard is returned; the
    /// guard releases on drop, so every exit path from a locked
    /// section releases exactly once.
    pub fn acquire(&self, range: ByteRange) -> LockResult<LockGuard<'_>> {
        let lock = flock_for(WRITE_LOCK, range);
        match nix::fcntl::fcntl(self.file.as_raw_fd(), FcntlArg::F_OFD_SETLK(&lock)) {
            Ok(_) => {
                self.held_table().push(range);
                Ok(LockGuard {
                    manager: self,
                    range,
                    released: false,
                })
            }
            Err(Errno::EACCES | Errno::EAGAIN) => Err(LockError::Busy(range)),
            Err(e) => Err(LockError::Io(e.into())),
        }
    }

    /// Releases a previously acquired lock over exactly `range`.
    ///
    /// Releasing a range this handle does not hold is a programming
    /// error and is reported as `LockError::NotHeld`.
    pub fn release(&self, range: ByteRange) -> LockResult<()> {
        let index = self
            .held_table()
            .iter()
            .position(|held| *held == range)
            .ok_or(LockError::NotHeld(range))?;

        let unlock = flock_for(UNLOCK, range);
        nix::fcntl::fcntl(self.file.as_raw_fd(), FcntlArg::F_OFD_SETLK(&unlock))
            .map_err(|e| LockError::Io(e.into()))?;

        self.held_table().remove(index);
        Ok(())
    }

    /// Ranges currently held through this handle.
    pub fn held_ranges(&self) -> Vec<ByteRange> {
        self.held_table().clone()
    }

    fn held_table(&self) -> std::sync::MutexGuard<'_, Vec<ByteRange>> {
        self.held
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for LockManager {
    fn drop(&mut self) {
        // Teardown releases whatever is still held before the handle
        // closes; the kernel would drop these anyway when the last
        // descriptor of the description goes, but the table must not
        // outlive its locks.
        let remaining = std::mem::take(&mut *self.held_table());
        for range in remaining {
            let unlock = flock_for(UNLOCK, range);
            let _ = nix::fcntl::fcntl(self.file.as_raw_fd(), FcntlArg::F_OFD_SETLK(&unlock));
        }
    }
}

/// Exclusive hold on a byte range, released exactly once: explicitly
/// via [`LockGuard::release`], or on drop as the backstop for error
/// paths.
pub struct LockGuard<'a> {
    manager: &'a LockManager,
    range: ByteRange,
    released: bool,
}

impl LockGuard<'_> {
    pub fn range(&self) -> ByteRange {
        self.range
    }

    /// Releases the lock, surfacing any syscall failure.
    pub fn release(mut self) -> LockResult<()> {
        self.released = true;
        self.manager.release(self.range)
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        if !self.released {
            let _ = self.manager.release(self.range);
        }
    }
}

/// Builds the `flock` argument for a non-blocking byte-range
/// operation. `l_pid` must be 0 for OFD locks.
#[allow(clippy::cast_possible_wrap)]
fn flock_for(lock_type: i16, range: ByteRange) -> libc::flock {
    libc::flock {
        l_type: lock_type,
        l_whence: libc::SEEK_SET as i16,
        l_start: range.offset as libc::off_t,
        l_len: range.len as libc::off_t,
        l_pid: 0,
    }
}
