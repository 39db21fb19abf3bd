//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    /// Human readable, multi-line.
    #[default]
    Pretty,

    /// One JSON object per line.
    Json,
}

/// Initialize tracing for the process.
///
/// Logs go to stderr, stdout carries the CSV output. The filter is read from
/// `RUST_LOG` and defaults to `info`. Subsequent calls are no-ops.
pub fn init(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let _ = match format {
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

#[test]
fn test_init_twice_is_a_noop() {
    init(LogFormat::Json);
    init(LogFormat::Pretty);
    tracing::info!("still logging");
}
