use crate::config::Args;
use crate::error_handler;
use crate::input;
use crate::ledger::account::{Account, DepositType};
use crate::ledger::engine::Ledger;
use crate::ledger::error::LedgerError;
use crate::ledger::memory::InMemoryStore;
use crate::ledger::store::LedgerStore;
use crate::output;
use crate::process;

use std::fs::File;
use std::sync::{mpsc, Arc};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not load seed file: {0}")]
    Input(#[from] input::Error),

    #[error("could not seed the ledger: {0}")]
    Ledger(#[from] LedgerError),
}

/// What happened to the operations of a batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub committed: usize,
    pub rejected: usize,
    pub malformed: usize,
}

/// Register deposit types, then open accounts, in the store.
pub fn seed(
    store: &InMemoryStore,
    deposit_types: Vec<DepositType>,
    accounts: Vec<Account>,
) -> Result<(), LedgerError> {
    for deposit_type in deposit_types {
        store.add_deposit_type(deposit_type)?;
    }
    for account in accounts {
        store.open_account(account)?;
    }

    Ok(())
}

/// Apply every operation of the CSV stream to the ledger, and write the
/// committed transactions to `output_stream` as CSV.
pub fn run<S: LedgerStore + 'static>(
    ledger: Arc<Ledger<S>>,
    operations: (impl std::io::Read + Send + 'static),
    output_stream: impl std::io::Write,
    workers: usize,
) -> Result<Summary, std::io::Error> {
    let (operations, input_errors) = input::parse_operations(operations);

    let (receipts_tx, receipts) = mpsc::channel();
    let rejections = process::process(ledger, operations, workers, receipts_tx);
    let (malformed, rejected) = error_handler::log(input_errors, rejections);

    let committed = output::write(output_stream, receipts)?;

    // The loggers only count: a panic in one of them loses the count, not
    // any ledger data.
    Ok(Summary {
        committed,
        rejected: rejected.join().unwrap_or_default(),
        malformed: malformed.join().unwrap_or_default(),
    })
}

/// Seed an in-memory ledger from the files named in `args`, then run the
/// operations file through it.
pub fn run_files(args: &Args, output_stream: impl std::io::Write) -> Result<Summary, Error> {
    let store = InMemoryStore::new();
    seed(
        &store,
        input::load_deposit_types(File::open(&args.deposit_types)?)?,
        input::load_accounts(File::open(&args.accounts)?)?,
    )?;
    tracing::info!(
        deposit_types = %args.deposit_types.display(),
        accounts = %args.accounts.display(),
        "ledger seeded"
    );

    let ledger = Arc::new(Ledger::with_config(store, args.engine_config()));
    let summary = run(
        ledger,
        File::open(&args.operations)?,
        output_stream,
        args.workers(),
    )?;

    Ok(summary)
}
