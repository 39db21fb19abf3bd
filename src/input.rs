use crate::ledger::account::{Account, DepositType};
use crate::ledger::engine::{Operation, Request};
use crate::ledger::transaction::Kind;
use crate::ledger::{AccountId, CustomerId, DepositTypeId};

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::mpsc::{self, Receiver, Sender};

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("malformed CSV: {0}")]
    Csv(String), // CSV is malformed

    #[error("invalid record: {0}")]
    Format(String), // Data format is incorrect
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err.to_string())
    }
}

fn csv_reader<R: std::io::Read>(input_stream: R) -> csv::Reader<std::io::BufReader<R>> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(std::io::BufReader::new(input_stream))
}

/// Stream operations out of a CSV with a `type,account,amount,date` header.
///
/// Rows are parsed on their own thread, so the ledger can start applying
/// operations right away. A bad row doesn't stop the stream: it is sent on
/// the error channel and parsing goes on.
pub fn parse_operations(
    input_stream: (impl std::io::Read + Send + 'static),
) -> (Receiver<Operation>, Receiver<Error>) {
    let (operation_tx, operation_rx): (Sender<Operation>, Receiver<Operation>) = mpsc::channel();
    let (error_tx, error_rx): (Sender<Error>, Receiver<Error>) = mpsc::channel();

    let mut reader = csv_reader(input_stream);

    std::thread::spawn(move || {
        for record in reader.deserialize::<OperationRecord>() {
            // Sending only fails once the receiver is gone, i.e. nobody
            // wants the rest of the stream anymore.
            let sent = match convert(record) {
                Ok(operation) => operation_tx.send(operation).is_ok(),
                Err(err) => error_tx.send(err).is_ok(),
            };
            if !sent {
                break;
            }
        }
    });

    (operation_rx, error_rx)
}

fn convert(record: Result<OperationRecord, csv::Error>) -> Result<Operation, Error> {
    Operation::try_from(record?).map_err(|err| Error::Format(err.to_string()))
}

// Seed files are small and must be entirely correct: the first bad row
// aborts the load.
fn load<R: DeserializeOwned, T>(
    input_stream: impl std::io::Read,
    convert: impl Fn(R) -> Result<T, Error>,
) -> Result<Vec<T>, Error> {
    csv_reader(input_stream)
        .deserialize::<R>()
        .map(|record| convert(record?))
        .collect()
}

/// Read deposit types from a CSV with an `id,name,yearly_rate` header.
pub fn load_deposit_types(input_stream: impl std::io::Read) -> Result<Vec<DepositType>, Error> {
    load(input_stream, |record: DepositTypeRecord| {
        DepositType::new(record.id, &record.name, record.yearly_rate)
            .map_err(|err| Error::Format(err.to_string()))
    })
}

/// Read accounts from a CSV with an `account,customer,deposit_type,balance` header.
/// A missing balance opens the account empty.
pub fn load_accounts(input_stream: impl std::io::Read) -> Result<Vec<Account>, Error> {
    load(input_stream, |record: AccountRecord| {
        Account::open(
            record.account_id,
            record.customer_id,
            record.deposit_type_id,
            record.balance.unwrap_or_default(),
        )
        .map_err(|err| Error::Format(err.to_string()))
    })
}

// OperationRecord exists because csv can't deserialise straight into the
// domain type (https://github.com/BurntSushi/rust-csv/issues/211). It also
// keeps Operation free of any assumption about the file layout.
#[derive(Debug, Deserialize)]
pub struct OperationRecord {
    #[serde(rename = "type")]
    kind: Kind,

    #[serde(rename = "account")]
    account_id: AccountId,

    amount: Option<Decimal>,

    date: String,
}

impl TryFrom<OperationRecord> for Operation {
    type Error = &'static str;
    fn try_from(record: OperationRecord) -> Result<Self, Self::Error> {
        let amount = match (record.kind, record.amount) {
            (_, Some(amount)) => amount,
            (Kind::Deposit, None) => return Err("missing amount for deposit"),
            (Kind::Withdraw, None) => return Err("missing amount for withdraw"),
        };

        Ok(Self {
            kind: record.kind,
            request: Request {
                account_id: record.account_id,
                amount,
                transaction_date: record.date,
            },
        })
    }
}

#[derive(Debug, Deserialize)]
struct DepositTypeRecord {
    id: DepositTypeId,
    name: String,
    yearly_rate: Decimal,
}

#[derive(Debug, Deserialize)]
struct AccountRecord {
    #[serde(rename = "account")]
    account_id: AccountId,

    #[serde(rename = "customer")]
    customer_id: CustomerId,

    #[serde(rename = "deposit_type")]
    deposit_type_id: DepositTypeId,

    balance: Option<Decimal>,
}
