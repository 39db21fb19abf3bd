use super::account::{AccountSnapshot, AccountUpdate};
use super::error::StoreError;
use super::transaction::{NewTransaction, Transaction};
use super::AccountId;

/// What the engine needs from persistence.
///
/// Implementations must be shareable between threads: the engine is called
/// concurrently, and serializes operations per account itself.
pub trait LedgerStore: Send + Sync {
    /// The account's balance, with the *current* yearly rate of its deposit type.
    fn get_account(&self, id: AccountId) -> Result<Option<AccountSnapshot>, StoreError>;

    /// The most recent deposit by `transaction_date`, ties broken by
    /// creation order (most recent first).
    fn get_last_deposit(&self, account_id: AccountId) -> Result<Option<Transaction>, StoreError>;

    /// Apply the balance update and append the transaction, all or nothing.
    ///
    /// Must fail closed: if `update.expected_version` doesn't match the stored
    /// version, or if both writes can't be applied together, nothing is
    /// written and an error is returned.
    fn commit(&self, update: AccountUpdate, tx: NewTransaction) -> Result<Transaction, StoreError>;

    /// Every transaction of an account, most recent `transaction_date` first,
    /// ties broken by creation order (most recent first).
    fn transactions(&self, account_id: AccountId) -> Result<Vec<Transaction>, StoreError>;
}

impl<S: LedgerStore + ?Sized> LedgerStore for std::sync::Arc<S> {
    fn get_account(&self, id: AccountId) -> Result<Option<AccountSnapshot>, StoreError> {
        (**self).get_account(id)
    }

    fn get_last_deposit(&self, account_id: AccountId) -> Result<Option<Transaction>, StoreError> {
        (**self).get_last_deposit(account_id)
    }

    fn commit(&self, update: AccountUpdate, tx: NewTransaction) -> Result<Transaction, StoreError> {
        (**self).commit(update, tx)
    }

    fn transactions(&self, account_id: AccountId) -> Result<Vec<Transaction>, StoreError> {
        (**self).transactions(account_id)
    }
}
