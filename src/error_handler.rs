use crate::input::Error;
use crate::process::Rejected;

use std::sync::mpsc::Receiver;
use std::thread::JoinHandle;

// Bad rows and rejected operations don't stop the batch: they are logged,
// and the other operations keep being processed. Each handle returns how
// many errors it has seen.
//
// Nothing is retried here. A rejected operation is either wrong (fix the
// input and run it again) or hit an infrastructure error, which is safe to
// retry as a whole since nothing was written.
pub fn log(
    input_errors: Receiver<Error>,
    rejections: Receiver<Rejected>,
) -> (JoinHandle<usize>, JoinHandle<usize>) {
    (
        std::thread::spawn(move || {
            let mut count = 0;
            for err in input_errors {
                tracing::warn!(%err, "failed to read record");
                count += 1;
            }
            count
        }),
        std::thread::spawn(move || {
            let mut count = 0;
            for rejected in rejections {
                let request = &rejected.operation.request;
                tracing::warn!(
                    kind = %rejected.operation.kind,
                    account_id = request.account_id,
                    amount = %request.amount,
                    date = %request.transaction_date,
                    err = %rejected.error,
                    "operation rejected"
                );
                count += 1;
            }
            count
        }),
    )
}
