use crate::ledger::engine::{Ledger, Operation, Receipt};
use crate::ledger::error::LedgerError;
use crate::ledger::store::LedgerStore;

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

/// An operation the ledger refused, with the reason why.
#[derive(Debug, PartialEq)]
pub struct Rejected {
    pub operation: Operation,
    pub error: LedgerError,
}

/// Apply a stream of operations to the ledger.
///
/// Operations are sharded by account over `workers` threads: every operation
/// on a given account goes to the same worker, so they are applied in input
/// order, while different accounts are processed in parallel.
/// Committed receipts are sent to `receipts_tx`; rejections are streamed on
/// the returned channel.
pub fn process<S: LedgerStore + 'static>(
    ledger: Arc<Ledger<S>>,
    operations: Receiver<Operation>,
    workers: usize,
    receipts_tx: Sender<Receipt>,
) -> Receiver<Rejected> {
    let (rejected_tx, rejected_rx) = mpsc::channel();
    let workers = workers.max(1);

    let shards: Vec<Sender<Operation>> = (0..workers)
        .map(|_| {
            let (shard_tx, shard_rx) = mpsc::channel::<Operation>();
            let ledger = Arc::clone(&ledger);
            let receipts_tx = receipts_tx.clone();
            let rejected_tx = rejected_tx.clone();

            std::thread::spawn(move || {
                for operation in shard_rx {
                    // Sends only fail once the output side has hung up, in
                    // which case there is nobody left to report to.
                    match ledger.apply(&operation) {
                        Ok(receipt) => {
                            let _ = receipts_tx.send(receipt);
                        }
                        Err(error) => {
                            let _ = rejected_tx.send(Rejected { operation, error });
                        }
                    }
                }
            });

            shard_tx
        })
        .collect();

    // Dispatching happens on its own thread so that results can be consumed
    // while operations are still coming in.
    std::thread::spawn(move || {
        for operation in operations {
            let shard = operation.request.account_id as usize % shards.len();
            if shards[shard].send(operation).is_err() {
                break;
            }
        }
        // Dropping the shards closes every worker's input.
    });

    rejected_rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::account::{Account, DepositType};
    use crate::ledger::engine::Request;
    use crate::ledger::memory::InMemoryStore;
    use crate::ledger::transaction::Kind;
    use crate::ledger::AccountId;
    use rust_decimal_macros::dec;

    fn ledger(accounts: &[AccountId]) -> Arc<Ledger<InMemoryStore>> {
        let store = InMemoryStore::new();
        store
            .add_deposit_type(DepositType::new(1, "Gold", dec!(12)).unwrap())
            .unwrap();
        for id in accounts {
            store
                .open_account(Account::open(*id, 1, 1, dec!(0)).unwrap())
                .unwrap();
        }
        Arc::new(Ledger::new(store))
    }

    fn operation(kind: Kind, account_id: AccountId, amount: rust_decimal::Decimal, date: &str) -> Operation {
        Operation {
            kind,
            request: Request::new(account_id, amount, date),
        }
    }

    #[test]
    fn test_process_keeps_per_account_order() {
        let ledger = ledger(&[1, 2, 3]);
        let (operations_tx, operations) = mpsc::channel();
        let (receipts_tx, receipts) = mpsc::channel();

        for account_id in [1, 2, 3] {
            operations_tx
                .send(operation(Kind::Deposit, account_id, dec!(1000), "2023-01-10"))
                .unwrap();
            // Only succeeds if applied after the deposit.
            operations_tx
                .send(operation(Kind::Withdraw, account_id, dec!(1060), "2023-07-10"))
                .unwrap();
        }
        drop(operations_tx);

        let rejected = process(Arc::clone(&ledger), operations, 2, receipts_tx);

        assert_eq!(6, receipts.iter().count());
        assert_eq!(0, rejected.iter().count());
        for account_id in [1, 2, 3] {
            assert_eq!(Ok(dec!(0)), ledger.balance(account_id));
        }
    }

    #[test]
    fn test_process_streams_rejections() {
        let ledger = ledger(&[1]);
        let (operations_tx, operations) = mpsc::channel();
        let (receipts_tx, receipts) = mpsc::channel();

        operations_tx
            .send(operation(Kind::Withdraw, 1, dec!(10), "2023-01-10"))
            .unwrap();
        operations_tx
            .send(operation(Kind::Deposit, 9, dec!(10), "2023-01-10"))
            .unwrap();
        operations_tx
            .send(operation(Kind::Deposit, 1, dec!(10), "2023-01-10"))
            .unwrap();
        drop(operations_tx);

        let rejected = process(ledger, operations, 4, receipts_tx);

        assert_eq!(1, receipts.iter().count());

        let mut errors: Vec<LedgerError> = rejected.iter().map(|r| r.error).collect();
        errors.sort_by_key(|err| err.to_string());
        assert_eq!(
            vec![
                LedgerError::AccountNotFound(9),
                LedgerError::NoDepositFound(1),
            ],
            errors
        );
    }

    #[test]
    fn test_process_with_zero_workers_still_runs() {
        let ledger = ledger(&[1]);
        let (operations_tx, operations) = mpsc::channel();
        let (receipts_tx, receipts) = mpsc::channel();

        operations_tx
            .send(operation(Kind::Deposit, 1, dec!(10), "2023-01-10"))
            .unwrap();
        drop(operations_tx);

        let rejected = process(ledger, operations, 0, receipts_tx);
        assert_eq!(1, receipts.iter().count());
        assert_eq!(0, rejected.iter().count());
    }
}
