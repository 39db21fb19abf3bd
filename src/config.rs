//! Command line and environment configuration.

use crate::ledger::engine::EngineConfig;
use crate::logging::LogFormat;

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Apply deposits and withdrawals from a CSV file to a set of savings
/// accounts, and print the committed transactions as CSV.
#[derive(Debug, Parser)]
#[command(name = "savings_ledger", version, about)]
pub struct Args {
    /// Deposit types CSV: `id,name,yearly_rate`.
    #[arg(long, env = "SAVINGS_LEDGER_DEPOSIT_TYPES")]
    pub deposit_types: PathBuf,

    /// Accounts CSV: `account,customer,deposit_type,balance`.
    #[arg(long, env = "SAVINGS_LEDGER_ACCOUNTS")]
    pub accounts: PathBuf,

    /// Operations CSV: `type,account,amount,date`.
    pub operations: PathBuf,

    /// Number of worker threads. Accounts are spread over them.
    #[arg(
        long,
        env = "SAVINGS_LEDGER_WORKERS",
        default_value_t = 4,
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub workers: u16,

    /// How long an operation waits for another one on the same account.
    #[arg(long, env = "SAVINGS_LEDGER_LOCK_TIMEOUT_MS", default_value_t = 5000)]
    pub lock_timeout_ms: u64,

    #[arg(long, env = "SAVINGS_LEDGER_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

impl Args {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            lock_timeout: Duration::from_millis(self.lock_timeout_ms),
        }
    }

    pub fn workers(&self) -> usize {
        usize::from(self.workers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from([
            "savings_ledger",
            "--deposit-types",
            "types.csv",
            "--accounts",
            "accounts.csv",
            "operations.csv",
        ])
        .unwrap();

        assert_eq!(PathBuf::from("types.csv"), args.deposit_types);
        assert_eq!(PathBuf::from("accounts.csv"), args.accounts);
        assert_eq!(PathBuf::from("operations.csv"), args.operations);
        assert_eq!(4, args.workers());
        assert_eq!(LogFormat::Pretty, args.log_format);
        assert_eq!(EngineConfig::default(), args.engine_config());
    }

    #[test]
    fn test_overrides() {
        let args = Args::try_parse_from([
            "savings_ledger",
            "--deposit-types=types.csv",
            "--accounts=accounts.csv",
            "--workers=2",
            "--lock-timeout-ms=250",
            "--log-format=json",
            "operations.csv",
        ])
        .unwrap();

        assert_eq!(2, args.workers());
        assert_eq!(LogFormat::Json, args.log_format);
        assert_eq!(Duration::from_millis(250), args.engine_config().lock_timeout);
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert!(Args::try_parse_from([
            "savings_ledger",
            "--deposit-types=types.csv",
            "--accounts=accounts.csv",
            "--workers=0",
            "operations.csv",
        ])
        .is_err());
    }

    #[test]
    fn test_missing_seed_files_rejected() {
        assert!(Args::try_parse_from(["savings_ledger", "operations.csv"]).is_err());
    }
}
