//! Cross-owner locking behavior: every store operation against a
//! ledger range held by a foreign owner is denied immediately, and
//! a denial never leaves anything locked behind.
//!
//! Open-file-description locks make each open handle its own owner,
//! so a second handle in this process stands in for a second process.

use std::fs;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;

use ledgerfile::lock::{ByteRange, LockManager};
use ledgerfile::store::{find_by_key, AccountStore, Attribute, StoreError};

const LEDGER: &str = "10,Hamad,Ammar,Chèque,1000.00\n20,Zadoud,Massil,Épargne,2500.00\n";

/// A lock owner distinct from the store under test.
fn foreign_owner(path: &Path) -> LockManager {
    let file = OpenOptions::new().read(true).write(true).open(path).unwrap();
    LockManager::new(Arc::new(file))
}

/// Byte addresses of a record as a foreign process would compute them.
fn span_of(path: &Path, key: u32) -> ledgerfile::store::Span {
    let file = fs::File::open(path).unwrap();
    find_by_key(&file, key).unwrap().unwrap().span
}

fn seeded(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("accounts.txt");
    fs::write(&path, LEDGER).unwrap();
    path
}

#[test]
fn test_inspect_denied_while_whole_file_is_held() {
    let dir = TempDir::new().unwrap();
    let path = seeded(&dir);
    let store = AccountStore::open(&path).unwrap();
    let foreign = foreign_owner(&path);

    let guard = foreign.acquire(ByteRange::whole_file()).unwrap();
    assert!(matches!(store.inspect(10), Err(StoreError::Busy(_))));

    guard.release().unwrap();
    assert!(store.inspect(10).is_ok());
}

#[test]
fn test_withdraw_denied_while_record_is_held() {
    let dir = TempDir::new().unwrap();
    let path = seeded(&dir);
    let store = AccountStore::open(&path).unwrap();
    let foreign = foreign_owner(&path);

    let span = span_of(&path, 10);
    let _guard = foreign.acquire(span.record_range()).unwrap();

    let denied = store.withdraw(10, 100.0);
    assert!(matches!(denied, Err(StoreError::Busy(_))));
    assert!(denied.unwrap_err().is_retryable());

    // Nothing mutated, nothing left held.
    assert!(store.locks().held_ranges().is_empty());
    assert_eq!(fs::read_to_string(&path).unwrap(), LEDGER);
}

#[test]
fn test_whole_file_precheck_denies_even_disjoint_records() {
    let dir = TempDir::new().unwrap();
    let path = seeded(&dir);
    let store = AccountStore::open(&path).unwrap();
    let foreign = foreign_owner(&path);

    let span = span_of(&path, 10);
    let guard = foreign.acquire(span.record_range()).unwrap();

    // The pre-check probes the whole file, so a hold on record 10
    // denies an operation on record 20 as well.
    assert!(matches!(
        store.withdraw(20, 500.0),
        Err(StoreError::Busy(_))
    ));

    guard.release().unwrap();
    let account = store.withdraw(20, 500.0).unwrap();
    assert_eq!(account.balance, 2000.0);
}

#[test]
fn test_deposit_denied_while_balance_attribute_is_held() {
    let dir = TempDir::new().unwrap();
    let path = seeded(&dir);
    let store = AccountStore::open(&path).unwrap();
    let foreign = foreign_owner(&path);

    let span = span_of(&path, 20);
    let _guard = foreign.acquire(span.balance.unwrap()).unwrap();

    assert!(matches!(
        store.deposit(20, 10.0),
        Err(StoreError::Busy(_))
    ));
    assert_eq!(store.locks().held_ranges().len(), 0);
}

#[test]
fn test_deposit_denied_while_enclosing_record_is_held() {
    let dir = TempDir::new().unwrap();
    let path = seeded(&dir);
    let store = AccountStore::open(&path).unwrap();
    let foreign = foreign_owner(&path);

    // A record hold encloses its balance sub-range; nesting is still
    // a byte overlap between different owners.
    let span = span_of(&path, 20);
    let _guard = foreign.acquire(span.record_range()).unwrap();

    assert!(matches!(
        store.deposit(20, 10.0),
        Err(StoreError::Busy(_))
    ));
}

#[test]
fn test_delete_denied_while_any_record_is_held() {
    let dir = TempDir::new().unwrap();
    let path = seeded(&dir);
    let store = AccountStore::open(&path).unwrap();
    let foreign = foreign_owner(&path);

    // The whole-file acquire overlaps every held range, even one for
    // a different record than the delete target.
    let span = span_of(&path, 20);
    let guard = foreign.acquire(span.balance.unwrap()).unwrap();

    assert!(matches!(store.delete(10), Err(StoreError::Busy(_))));
    assert_eq!(fs::read_to_string(&path).unwrap(), LEDGER);

    guard.release().unwrap();
    store.delete(10).unwrap();
}

#[test]
fn test_balance_attribute_read_denied_while_attribute_is_held() {
    let dir = TempDir::new().unwrap();
    let path = seeded(&dir);
    let store = AccountStore::open(&path).unwrap();
    let foreign = foreign_owner(&path);

    let span = span_of(&path, 10);
    let guard = foreign.acquire(span.balance.unwrap()).unwrap();

    // The whole-file pre-check fires before the attribute-specific
    // probe, so every attribute read is denied while the balance is
    // held, name and surname included.
    assert!(matches!(
        store.attribute(10, Attribute::Balance),
        Err(StoreError::Busy(_))
    ));
    assert!(matches!(
        store.attribute(10, Attribute::Name),
        Err(StoreError::Busy(_))
    ));

    guard.release().unwrap();
    assert_eq!(store.attribute(10, Attribute::Balance).unwrap(), "1000.00");
    assert_eq!(store.attribute(10, Attribute::Name).unwrap(), "Hamad");
}

#[test]
fn test_overlapping_acquires_have_at_most_one_winner() {
    let dir = TempDir::new().unwrap();
    let path = seeded(&dir);
    let first = foreign_owner(&path);
    let second = foreign_owner(&path);

    let range = ByteRange::new(0, 16);
    let winner = first.acquire(range).unwrap();
    let loser = second.acquire(ByteRange::new(8, 16));
    assert!(loser.is_err());

    // The denial is immediate and the loser can win after release.
    winner.release().unwrap();
    assert!(second.acquire(ByteRange::new(8, 16)).is_ok());
}

#[test]
fn test_closing_the_owning_handle_frees_its_locks() {
    let dir = TempDir::new().unwrap();
    let path = seeded(&dir);
    let store = AccountStore::open(&path).unwrap();

    {
        let foreign = foreign_owner(&path);
        let _guard = foreign.acquire(ByteRange::whole_file()).unwrap();
        assert!(matches!(store.inspect(10), Err(StoreError::Busy(_))));
        // Dropped without an explicit release.
    }

    assert!(store.inspect(10).is_ok());
}
