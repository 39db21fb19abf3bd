use super::interest::InterestError;
use super::{AccountId, Amount};

use chrono::NaiveDate;
use std::time::Duration;

/// Everything that can go wrong while applying a deposit or a withdrawal.
///
/// All variants but [LedgerError::Infrastructure] are detected before
/// anything is written, so the ledger is left untouched.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum LedgerError {
    /// The request itself is malformed (amount ≤ 0, bad date...).
    /// The caller should fix the request; it is never retried.
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("account {0} not found")]
    AccountNotFound(AccountId),

    /// A withdrawal needs a deposit to anchor its interest period.
    #[error("no deposit found for account {0}, please deposit first")]
    NoDepositFound(AccountId),

    /// The withdrawal is dated before the deposit it accrues from.
    #[error("withdrawal date {withdrawal_date} is before the last deposit date {deposit_date}")]
    InvalidDateOrder {
        deposit_date: NaiveDate,
        withdrawal_date: NaiveDate,
    },

    /// The balance with interest does not cover the withdrawal.
    #[error("insufficient balance: {available} available, {requested} requested")]
    InsufficientBalance { available: Amount, requested: Amount },

    /// The commit could not be guaranteed. Nothing was written, and the
    /// whole operation can safely be retried by the caller.
    #[error("infrastructure error: {0}")]
    Infrastructure(#[from] StoreError),
}

impl From<InterestError> for LedgerError {
    fn from(err: InterestError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Failures of the storage layer, or of the per-account serialization point.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The account changed between the read and the commit.
    #[error("account {account_id} changed concurrently (expected version {expected}, found {found})")]
    VersionConflict {
        account_id: AccountId,
        expected: u64,
        found: u64,
    },

    /// The commit would have left a negative balance.
    #[error("refusing to commit a negative balance on account {account_id}")]
    NegativeBalance { account_id: AccountId },

    /// The balance update and the transaction disagree on the account or
    /// on the resulting balance.
    #[error("balance update and transaction of account {account_id} don't match")]
    InconsistentCommit { account_id: AccountId },

    /// The commit references an account the store doesn't know.
    #[error("account {account_id} does not exist in the store")]
    MissingAccount { account_id: AccountId },

    #[error("timed out after {waited:?} waiting for account {account_id}")]
    LockTimeout {
        account_id: AccountId,
        waited: Duration,
    },

    /// A thread panicked while holding a lock.
    #[error("a storage lock is poisoned")]
    Poisoned,
}

impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        Self::Poisoned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_insufficient_balance_message() {
        let err = LedgerError::InsufficientBalance {
            available: dec!(1060.00),
            requested: dec!(2000.00),
        };
        assert_eq!(
            "insufficient balance: 1060.00 available, 2000.00 requested",
            err.to_string()
        );
    }

    #[test]
    fn test_interest_error_is_a_validation_error() {
        let err: LedgerError = InterestError::InvalidDate("2023-1-1".to_string()).into();
        assert_eq!(
            LedgerError::Validation(
                "invalid date \"2023-1-1\", expected a calendar date formatted as YYYY-MM-DD"
                    .to_string()
            ),
            err
        );
    }

    #[test]
    fn test_store_error_propagates_as_infrastructure() {
        fn commit() -> Result<(), StoreError> {
            Err(StoreError::Unavailable("disk full".to_string()))
        }
        fn operation() -> Result<(), LedgerError> {
            commit()?;
            Ok(())
        }

        assert_eq!(
            Err(LedgerError::Infrastructure(StoreError::Unavailable(
                "disk full".to_string()
            ))),
            operation()
        );
    }
}
