//! An in-memory [LedgerStore].
//!
//! Both halves of a commit are applied under one write lock, after every
//! check has passed, so readers never observe a balance without its
//! transaction (or the opposite).

use super::account::{Account, AccountSnapshot, AccountUpdate, DepositType};
use super::error::{LedgerError, StoreError};
use super::store::LedgerStore;
use super::transaction::{Kind, NewTransaction, Transaction};
use super::{AccountId, DepositTypeId, Rate, TransactionId};

use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Default)]
struct State {
    deposit_types: HashMap<DepositTypeId, DepositType>,
    accounts: HashMap<AccountId, Account>,

    // Per account, in creation order.
    transactions: HashMap<AccountId, Vec<Transaction>>,
    last_tx_id: TransactionId,
}

#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_deposit_type(&self, deposit_type: DepositType) -> Result<(), LedgerError> {
        let mut state = self.state.write().map_err(StoreError::from)?;
        if state.deposit_types.contains_key(&deposit_type.id) {
            return Err(LedgerError::Validation(format!(
                "deposit type {} already exists",
                deposit_type.id
            )));
        }

        state.deposit_types.insert(deposit_type.id, deposit_type);
        Ok(())
    }

    /// Change the rate of a deposit type. Withdrawals read the current rate,
    /// so the new rate applies to the whole period they accrue over.
    pub fn set_yearly_rate(&self, id: DepositTypeId, yearly_rate: Rate) -> Result<(), LedgerError> {
        let mut state = self.state.write().map_err(StoreError::from)?;
        let current = state
            .deposit_types
            .get_mut(&id)
            .ok_or_else(|| LedgerError::Validation(format!("unknown deposit type {}", id)))?;

        *current = DepositType::new(id, &current.name, yearly_rate)?;
        Ok(())
    }

    pub fn open_account(&self, account: Account) -> Result<(), LedgerError> {
        let mut state = self.state.write().map_err(StoreError::from)?;
        if !state.deposit_types.contains_key(&account.deposit_type_id) {
            return Err(LedgerError::Validation(format!(
                "unknown deposit type {}",
                account.deposit_type_id
            )));
        }
        if state.accounts.contains_key(&account.id) {
            return Err(LedgerError::Validation(format!(
                "account {} already exists",
                account.id
            )));
        }
        if account.balance < Decimal::ZERO {
            return Err(LedgerError::Validation(
                "balance cannot be negative".to_string(),
            ));
        }

        state.accounts.insert(account.id, account);
        Ok(())
    }
}

impl LedgerStore for InMemoryStore {
    fn get_account(&self, id: AccountId) -> Result<Option<AccountSnapshot>, StoreError> {
        let state = self.state.read()?;
        let account = match state.accounts.get(&id) {
            Some(account) => account,
            None => return Ok(None),
        };

        // Accounts can only be opened with a known deposit type, and deposit
        // types are never removed.
        let deposit_type = state
            .deposit_types
            .get(&account.deposit_type_id)
            .ok_or_else(|| {
                StoreError::Unavailable(format!(
                    "deposit type {} of account {} is missing",
                    account.deposit_type_id, id
                ))
            })?;

        Ok(Some(AccountSnapshot {
            id,
            balance: account.balance,
            yearly_rate: deposit_type.yearly_rate,
            version: account.version,
        }))
    }

    fn get_last_deposit(&self, account_id: AccountId) -> Result<Option<Transaction>, StoreError> {
        let state = self.state.read()?;
        let last = state.transactions.get(&account_id).and_then(|txs| {
            txs.iter()
                .filter(|tx| tx.kind == Kind::Deposit)
                .max_by_key(|tx| (tx.transaction_date, tx.id))
                .cloned()
        });

        Ok(last)
    }

    fn commit(&self, update: AccountUpdate, tx: NewTransaction) -> Result<Transaction, StoreError> {
        let mut state = self.state.write()?;

        if tx.account_id != update.account_id || tx.balance_after != update.balance {
            return Err(StoreError::InconsistentCommit {
                account_id: update.account_id,
            });
        }
        if update.balance < Decimal::ZERO {
            return Err(StoreError::NegativeBalance {
                account_id: update.account_id,
            });
        }

        let account = state
            .accounts
            .get(&update.account_id)
            .ok_or(StoreError::MissingAccount {
                account_id: update.account_id,
            })?;
        if account.version != update.expected_version {
            return Err(StoreError::VersionConflict {
                account_id: update.account_id,
                expected: update.expected_version,
                found: account.version,
            });
        }

        // Every check passed: nothing below can fail.
        state.last_tx_id += 1;
        let recorded = Transaction::record(tx, state.last_tx_id, Utc::now());

        if let Some(account) = state.accounts.get_mut(&update.account_id) {
            account.balance = update.balance;
            account.version += 1;
        }
        state
            .transactions
            .entry(update.account_id)
            .or_default()
            .push(recorded.clone());

        Ok(recorded)
    }

    fn transactions(&self, account_id: AccountId) -> Result<Vec<Transaction>, StoreError> {
        let state = self.state.read()?;
        let mut txs = state
            .transactions
            .get(&account_id)
            .cloned()
            .unwrap_or_default();

        txs.sort_by(|a, b| {
            b.transaction_date
                .cmp(&a.transaction_date)
                .then(b.id.cmp(&a.id))
        });

        Ok(txs)
    }
}
