use super::{AccountId, Amount, TransactionId};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Deposit,  // Credit the balance, no interest.
    Withdraw, // Accrue interest since the last deposit, then debit the balance.
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Deposit => f.write_str("deposit"),
            Kind::Withdraw => f.write_str("withdraw"),
        }
    }
}

/// A transaction the engine has computed but not committed yet.
/// The store assigns the id and the creation timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub account_id: AccountId,
    pub kind: Kind,
    pub amount: Amount,
    pub balance_before: Amount,
    pub balance_after: Amount,
    pub transaction_date: NaiveDate,

    /// Always zero for deposits.
    pub interest_earned: Amount,

    /// Always zero for deposits.
    pub months_held: u32,
}

/// An immutable ledger record. Once committed, it is never changed.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: TransactionId,
    pub account_id: AccountId,
    pub kind: Kind,
    pub amount: Amount,
    pub balance_before: Amount,
    pub balance_after: Amount,
    pub transaction_date: NaiveDate,
    pub interest_earned: Amount,
    pub months_held: u32,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn record(new: NewTransaction, id: TransactionId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            account_id: new.account_id,
            kind: new.kind,
            amount: new.amount,
            balance_before: new.balance_before,
            balance_after: new.balance_after,
            transaction_date: new.transaction_date,
            interest_earned: new.interest_earned,
            months_held: new.months_held,
            created_at,
        }
    }
}

#[test]
fn test_kind_display() {
    assert_eq!("deposit", Kind::Deposit.to_string());
    assert_eq!("withdraw", Kind::Withdraw.to_string());
}

#[test]
fn test_record_keeps_computed_values() {
    use rust_decimal_macros::dec;

    let new = NewTransaction {
        account_id: 7,
        kind: Kind::Withdraw,
        amount: dec!(1060.00),
        balance_before: dec!(1000.00),
        balance_after: dec!(0.00),
        transaction_date: NaiveDate::from_ymd_opt(2023, 7, 10).unwrap(),
        interest_earned: dec!(60.00),
        months_held: 6,
    };
    let now = Utc::now();

    let tx = Transaction::record(new.clone(), 42, now);
    assert_eq!(42, tx.id);
    assert_eq!(now, tx.created_at);
    assert_eq!(new.account_id, tx.account_id);
    assert_eq!(new.kind, tx.kind);
    assert_eq!(new.amount, tx.amount);
    assert_eq!(new.balance_before, tx.balance_before);
    assert_eq!(new.balance_after, tx.balance_after);
    assert_eq!(new.transaction_date, tx.transaction_date);
    assert_eq!(new.interest_earned, tx.interest_earned);
    assert_eq!(new.months_held, tx.months_held);
}
