//! CLI command implementations
//!
//! Each command opens the store, performs one operation, and renders
//! the `(status, record)` result as a JSON line. Denials (`Busy`,
//! `InvalidAmount`, `NotFound`) are ordinary outcomes for the caller
//! to act on, not process failures, but they still exit non-zero so
//! scripts can branch on them.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::fixtures;
use crate::observability::{Logger, Severity};
use crate::record::{Account, AccountKind, FIELD_DELIMITER};
use crate::store::AccountStore;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::write_response;

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Ledger file path (optional, default "./accounts.txt")
    #[serde(default = "default_ledger_path")]
    pub ledger_path: String,

    /// Seed rows for `init` (optional, defaults to the classic set)
    #[serde(default)]
    pub seed_accounts: Vec<SeedAccount>,
}

/// One seed row in the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedAccount {
    pub key: u32,
    pub name: String,
    pub surname: String,
    pub kind: String,
    pub balance: f64,
}

fn default_ledger_path() -> String {
    "./accounts.txt".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ledger_path: default_ledger_path(),
            seed_accounts: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from file; a missing file yields the
    /// defaults so `init` works out of the box.
    pub fn load_or_default(path: &Path) -> CliResult<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Config::default());
            }
            Err(e) => {
                return Err(CliError::config_error(format!(
                    "Failed to read config: {}",
                    e
                )))
            }
        };

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.ledger_path.is_empty() {
            return Err(CliError::config_error("ledger_path must not be empty"));
        }

        for seed in &self.seed_accounts {
            if seed.name.contains(FIELD_DELIMITER) || seed.surname.contains(FIELD_DELIMITER) {
                return Err(CliError::config_error(format!(
                    "seed account {}: names must not contain '{}'",
                    seed.key, FIELD_DELIMITER
                )));
            }
        }

        Ok(())
    }

    /// Seed rows as accounts, falling back to the classic fixture set
    /// when the config lists none.
    pub fn seed_rows(&self) -> Vec<Account> {
        if self.seed_accounts.is_empty() {
            return fixtures::seed_accounts();
        }
        self.seed_accounts
            .iter()
            .map(|seed| {
                Account::new(
                    seed.key,
                    seed.name.clone(),
                    seed.surname.clone(),
                    AccountKind::from_token(&seed.kind),
                    seed.balance,
                )
            })
            .collect()
    }
}

/// Dispatch a parsed command.
pub fn run_command(cli: Cli) -> CliResult<()> {
    match cli.command {
        Command::Init { config, file } => init(&config, file),
        Command::Inspect { file, key } => inspect(&file, key),
        Command::Withdraw { file, key, amount } => withdraw(&file, key, amount),
        Command::Deposit { file, key, amount } => deposit(&file, key, amount),
        Command::Delete { file, key } => delete(&file, key),
        Command::Attribute { file, key, field } => attribute(&file, key, field.into()),
    }
}

/// `init`: truncate and seed the ledger file.
pub fn init(config_path: &Path, file_override: Option<PathBuf>) -> CliResult<()> {
    let config = Config::load_or_default(config_path)?;
    let path = file_override.unwrap_or_else(|| PathBuf::from(&config.ledger_path));
    let accounts = config.seed_rows();

    fixtures::write_fixture(&path, &accounts)?;

    Logger::log(
        Severity::Info,
        "ledger_seeded",
        &[
            ("file", &path.display().to_string()),
            ("accounts", &accounts.len().to_string()),
        ],
    );

    write_response(json!({
        "file": path.display().to_string(),
        "accounts": accounts.len(),
    }))
}

/// `inspect`: read-only snapshot of one record.
pub fn inspect(file: &Path, key: u32) -> CliResult<()> {
    let store = AccountStore::open(file)?;
    let account = store.inspect(key)?;
    write_response(account_json(&account))
}

/// `withdraw`: record-level lock, then rewrite.
pub fn withdraw(file: &Path, key: u32, amount: f64) -> CliResult<()> {
    let store = AccountStore::open(file)?;
    let account = store.withdraw(key, amount)?;

    Logger::log(
        Severity::Info,
        "withdraw_applied",
        &[
            ("key", &key.to_string()),
            ("amount", &format!("{:.2}", amount)),
            ("balance", &format!("{:.2}", account.balance)),
        ],
    );

    write_response(account_json(&account))
}

/// `deposit`: balance-attribute lock, then rewrite.
pub fn deposit(file: &Path, key: u32, amount: f64) -> CliResult<()> {
    let store = AccountStore::open(file)?;
    let account = store.deposit(key, amount)?;

    Logger::log(
        Severity::Info,
        "deposit_applied",
        &[
            ("key", &key.to_string()),
            ("amount", &format!("{:.2}", amount)),
            ("balance", &format!("{:.2}", account.balance)),
        ],
    );

    write_response(account_json(&account))
}

/// `delete`: whole-file lock, then tombstone overwrite.
pub fn delete(file: &Path, key: u32) -> CliResult<()> {
    let store = AccountStore::open(file)?;
    store.delete(key)?;

    Logger::log(Severity::Info, "account_deleted", &[("key", &key.to_string())]);

    write_response(json!({ "deleted": key }))
}

/// `attribute`: read one field of a record.
pub fn attribute(file: &Path, key: u32, field: crate::store::Attribute) -> CliResult<()> {
    let store = AccountStore::open(file)?;
    let value = store.attribute(key, field)?;
    write_response(json!({
        "key": key,
        "field": format!("{:?}", field).to_lowercase(),
        "value": value,
    }))
}

fn account_json(account: &Account) -> Value {
    json!({
        "key": account.key,
        "name": account.name,
        "surname": account.surname,
        "kind": account.kind.wire_token(),
        "balance": format!("{:.2}", account.balance),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_yields_defaults() {
        let config = Config::load_or_default(Path::new("/nonexistent/ledgerfile.json")).unwrap();
        assert_eq!(config.ledger_path, "./accounts.txt");
        assert_eq!(config.seed_rows().len(), 5);
    }

    #[test]
    fn test_config_rejects_delimiter_in_seed_name() {
        let raw = r#"{
            "ledger_path": "ledger.txt",
            "seed_accounts": [
                {"key": 1, "name": "A,B", "surname": "C", "kind": "Cheque", "balance": 1.0}
            ]
        }"#;
        let config: Config = serde_json::from_str(raw).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_seed_rows_parse_kinds() {
        let raw = r#"{
            "seed_accounts": [
                {"key": 1, "name": "A", "surname": "B", "kind": "epargne", "balance": 10.0},
                {"key": 2, "name": "C", "surname": "D", "kind": "whatever", "balance": 20.0}
            ]
        }"#;
        let config: Config = serde_json::from_str(raw).unwrap();
        let rows = config.seed_rows();
        assert_eq!(rows[0].kind, AccountKind::Savings);
        assert_eq!(rows[1].kind, AccountKind::Unknown);
    }
}
