use clap::Parser;
use savings_ledger::config::Args;
use savings_ledger::{logging, run};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.log_format);

    match run::run_files(&args, std::io::stdout().lock()) {
        Ok(summary) => {
            tracing::info!(
                committed = summary.committed,
                rejected = summary.rejected,
                malformed = summary.malformed,
                "batch done"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "batch aborted");
            ExitCode::FAILURE
        }
    }
}
