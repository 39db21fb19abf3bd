//! The ledger engine: deposits and withdrawals.
//!
//! Every operation goes through the same steps:
//! 1. validate the request (no state involved),
//! 2. take the account's gate, so nobody else reads or writes it meanwhile,
//! 3. read the account (and, for withdrawals, the anchoring deposit),
//! 4. compute the new balance and the transaction record,
//! 5. commit both at once through the store.
//!
//! Any failure before step 5 returns without writing anything.

use super::account::{AccountSnapshot, AccountUpdate};
use super::error::LedgerError;
use super::interest::{accrue, months_between, parse_date, sufficient_funds};
use super::lock::AccountLocks;
use super::store::LedgerStore;
use super::transaction::{Kind, NewTransaction, Transaction};
use super::{round_currency, AccountId, Amount, Rate};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// How long an operation waits for another operation on the same account.
    pub lock_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(5),
        }
    }
}

/// A deposit or withdrawal request, as parsed by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub account_id: AccountId,
    pub amount: Amount,

    /// `YYYY-MM-DD`.
    pub transaction_date: String,
}

impl Request {
    pub fn new(account_id: AccountId, amount: Amount, transaction_date: &str) -> Self {
        Self {
            account_id,
            amount,
            transaction_date: transaction_date.to_string(),
        }
    }
}

/// A request paired with what to do with it.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub kind: Kind,
    pub request: Request,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DepositReceipt {
    pub transaction: Transaction,

    /// The account balance once the deposit is committed.
    pub balance: Amount,
}

/// How a withdrawal's final balance was reached.
#[derive(Debug, Clone, PartialEq)]
pub struct InterestBreakdown {
    pub balance_before: Amount,
    pub months_held: u32,
    pub yearly_rate: Rate,
    pub monthly_rate: Rate,
    pub interest_earned: Amount,
    pub balance_with_interest: Amount,
    pub withdraw_amount: Amount,
    pub balance_after: Amount,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WithdrawalReceipt {
    pub transaction: Transaction,
    pub breakdown: InterestBreakdown,

    /// The account balance once the withdrawal is committed.
    pub balance: Amount,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Receipt {
    Deposit(DepositReceipt),
    Withdrawal(WithdrawalReceipt),
}

impl Receipt {
    pub fn transaction(&self) -> &Transaction {
        match self {
            Receipt::Deposit(receipt) => &receipt.transaction,
            Receipt::Withdrawal(receipt) => &receipt.transaction,
        }
    }
}

/// A request whose amount and date have been checked.
struct Validated {
    account_id: AccountId,
    amount: Amount,
    date: NaiveDate,
}

impl Validated {
    // Amounts are brought to currency precision before anything else, so
    // that 0.001 is rejected as a zero amount rather than stored as one.
    fn from_request(request: &Request) -> Result<Self, LedgerError> {
        let amount = round_currency(request.amount);
        if amount <= Decimal::ZERO {
            return Err(LedgerError::Validation(
                "amount must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            account_id: request.account_id,
            amount,
            date: parse_date(&request.transaction_date)?,
        })
    }
}

/// Both halves of a commit, computed but not written yet.
struct Computed {
    update: AccountUpdate,
    tx: NewTransaction,
}

/// Applies deposits and withdrawals to the accounts held by a [LedgerStore].
///
/// The ledger is meant to be shared between threads: operations on the same
/// account are serialized, operations on different accounts run in parallel.
pub struct Ledger<S> {
    store: S,
    locks: AccountLocks,
    config: EngineConfig,
}

impl<S: LedgerStore> Ledger<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    pub fn with_config(store: S, config: EngineConfig) -> Self {
        Self {
            store,
            locks: AccountLocks::new(),
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn apply(&self, operation: &Operation) -> Result<Receipt, LedgerError> {
        match operation.kind {
            Kind::Deposit => self.deposit(&operation.request).map(Receipt::Deposit),
            Kind::Withdraw => self.withdraw(&operation.request).map(Receipt::Withdrawal),
        }
    }

    #[tracing::instrument(
        skip(self, request),
        fields(account_id = request.account_id, amount = %request.amount, date = %request.transaction_date)
    )]
    pub fn deposit(&self, request: &Request) -> Result<DepositReceipt, LedgerError> {
        let result = self.try_deposit(request);
        trace_outcome(&result);
        result
    }

    #[tracing::instrument(
        skip(self, request),
        fields(account_id = request.account_id, amount = %request.amount, date = %request.transaction_date)
    )]
    pub fn withdraw(&self, request: &Request) -> Result<WithdrawalReceipt, LedgerError> {
        let result = self.try_withdraw(request);
        trace_outcome(&result);
        result
    }

    /// The account's transactions, most recent first.
    pub fn history(&self, account_id: AccountId) -> Result<Vec<Transaction>, LedgerError> {
        self.load_account(account_id)?;
        Ok(self.store.transactions(account_id)?)
    }

    pub fn balance(&self, account_id: AccountId) -> Result<Amount, LedgerError> {
        Ok(self.load_account(account_id)?.balance)
    }

    fn try_deposit(&self, request: &Request) -> Result<DepositReceipt, LedgerError> {
        let validated = Validated::from_request(request)?;
        let _guard = self
            .locks
            .acquire(validated.account_id, self.config.lock_timeout)?;

        let account = self.load_account(validated.account_id)?;
        let balance_after = account
            .balance
            .checked_add(validated.amount)
            .ok_or_else(overflow)?;

        let transaction = self.commit(Computed {
            update: AccountUpdate {
                account_id: account.id,
                expected_version: account.version,
                balance: balance_after,
            },
            tx: NewTransaction {
                account_id: account.id,
                kind: Kind::Deposit,
                amount: validated.amount,
                balance_before: account.balance,
                balance_after,
                transaction_date: validated.date,
                interest_earned: round_currency(Decimal::ZERO),
                months_held: 0,
            },
        })?;

        Ok(DepositReceipt {
            balance: transaction.balance_after,
            transaction,
        })
    }

    fn try_withdraw(&self, request: &Request) -> Result<WithdrawalReceipt, LedgerError> {
        let validated = Validated::from_request(request)?;
        let _guard = self
            .locks
            .acquire(validated.account_id, self.config.lock_timeout)?;

        let account = self.load_account(validated.account_id)?;

        // Only the most recent deposit anchors the interest period: earlier
        // deposits are not tracked separately.
        let last_deposit = self
            .store
            .get_last_deposit(account.id)?
            .ok_or(LedgerError::NoDepositFound(account.id))?;

        let date_order_error = || LedgerError::InvalidDateOrder {
            deposit_date: last_deposit.transaction_date,
            withdrawal_date: validated.date,
        };
        let months = months_between(last_deposit.transaction_date, validated.date);
        let months_held = u32::try_from(months).map_err(|_| date_order_error())?;

        // The deposit type's current rate applies to the whole period.
        let accrual = accrue(account.balance, account.yearly_rate, months)?;

        if !sufficient_funds(accrual.ending_balance, validated.amount) {
            return Err(LedgerError::InsufficientBalance {
                available: accrual.ending_balance,
                requested: validated.amount,
            });
        }
        let balance_after = accrual.ending_balance - validated.amount;

        let transaction = self.commit(Computed {
            update: AccountUpdate {
                account_id: account.id,
                expected_version: account.version,
                balance: balance_after,
            },
            tx: NewTransaction {
                account_id: account.id,
                kind: Kind::Withdraw,
                amount: validated.amount,
                balance_before: account.balance,
                balance_after,
                transaction_date: validated.date,
                interest_earned: accrual.interest_earned,
                months_held,
            },
        })?;

        Ok(WithdrawalReceipt {
            breakdown: InterestBreakdown {
                balance_before: account.balance,
                months_held,
                yearly_rate: accrual.yearly_rate,
                monthly_rate: accrual.monthly_rate,
                interest_earned: accrual.interest_earned,
                balance_with_interest: accrual.ending_balance,
                withdraw_amount: validated.amount,
                balance_after,
            },
            balance: transaction.balance_after,
            transaction,
        })
    }

    fn load_account(&self, account_id: AccountId) -> Result<AccountSnapshot, LedgerError> {
        self.store
            .get_account(account_id)?
            .ok_or(LedgerError::AccountNotFound(account_id))
    }

    fn commit(&self, computed: Computed) -> Result<Transaction, LedgerError> {
        Ok(self.store.commit(computed.update, computed.tx)?)
    }
}

fn overflow() -> LedgerError {
    LedgerError::Validation("amount overflows the account balance".to_string())
}

fn trace_outcome<T>(result: &Result<T, LedgerError>) {
    match result {
        Ok(_) => tracing::info!("committed"),
        Err(err @ LedgerError::Infrastructure(_)) => tracing::error!(%err, "aborted"),
        Err(err) => tracing::warn!(%err, "rejected"),
    }
}
