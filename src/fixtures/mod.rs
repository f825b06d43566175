//! Fixture loader
//!
//! One-shot generator that (re)creates a ledger file with a known set
//! of well-formed accounts. This is the only producer of fresh
//! ledgers; the interactive operations only mutate lines in place.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::record::{Account, AccountKind};
use crate::store::StoreResult;

/// The classic seed rows.
pub fn seed_accounts() -> Vec<Account> {
    vec![
        Account::new(10, "Hamad", "Ammar", AccountKind::Checking, 1000.0),
        Account::new(20, "Zadoud", "Massil", AccountKind::Savings, 2500.0),
        Account::new(30, "Achek", "Momo", AccountKind::Checking, 750.0),
        Account::new(40, "Feham", "Ismail", AccountKind::Savings, 5000.0),
        Account::new(50, "Anes", "Abdel", AccountKind::Checking, 1200.0),
    ]
}

/// Truncates `path` and writes one line per account, newline
/// terminated, synced once at the end.
pub fn write_fixture(path: &Path, accounts: &[Account]) -> StoreResult<()> {
    let mut file = File::create(path)?;
    for account in accounts {
        file.write_all(account.encode()?.as_bytes())?;
    }
    file.sync_all()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::AccountStore;
    use tempfile::TempDir;

    #[test]
    fn test_fixture_rows_are_locatable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("accounts.txt");
        write_fixture(&path, &seed_accounts()).unwrap();

        let store = AccountStore::open(&path).unwrap();
        for account in seed_accounts() {
            assert_eq!(store.inspect(account.key).unwrap(), account);
        }
    }

    #[test]
    fn test_fixture_truncates_previous_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("accounts.txt");
        std::fs::write(&path, "99,Old,Row,Chèque,9.99\n").unwrap();

        write_fixture(&path, &seed_accounts()).unwrap();

        let store = AccountStore::open(&path).unwrap();
        assert!(store.inspect(99).is_err());
        assert!(store.inspect(10).is_ok());
    }
}
