use crate::ledger::engine::Receipt;
use crate::ledger::transaction::{Kind, Transaction};
use crate::ledger::{AccountId, Amount};

use chrono::NaiveDate;
use serde::Serialize;
use std::sync::mpsc::Receiver;

#[derive(Serialize)]
struct TransactionRecord {
    #[serde(rename = "account")]
    account_id: AccountId,

    #[serde(rename = "type")]
    kind: Kind,

    amount: Amount,
    balance_before: Amount,
    balance_after: Amount,

    #[serde(rename = "date")]
    transaction_date: NaiveDate,

    interest_earned: Amount,
    months_held: u32,
}

impl From<&Transaction> for TransactionRecord {
    fn from(tx: &Transaction) -> Self {
        Self {
            account_id: tx.account_id,
            kind: tx.kind,
            amount: tx.amount,
            balance_before: tx.balance_before,
            balance_after: tx.balance_after,
            transaction_date: tx.transaction_date,
            interest_earned: tx.interest_earned,
            months_held: tx.months_held,
        }
    }
}

/// Writes one CSV row per committed transaction to the given stream, and
/// returns how many were written.
pub fn write(
    output_stream: impl std::io::Write,
    receipts: Receiver<Receipt>,
) -> Result<usize, std::io::Error> {
    let mut writer = csv::Writer::from_writer(output_stream);
    let mut written = 0;

    for receipt in receipts {
        writer.serialize(TransactionRecord::from(receipt.transaction()))?;
        written += 1;
    }
    writer.flush()?;

    Ok(written)
}
