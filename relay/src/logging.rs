//! Development-time tracing for debugging the assistant.
//!
//! Output goes to stderr so stdout stays reserved for results. Delegation
//! diagnostics (command line, stdin payload, raw captured streams) are emitted
//! at debug level and never alter what gets returned or printed as the result.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`; defaults to `warn`, or `relay=debug` when `verbose` is
/// set so `-v` surfaces the delegation diagnostics.
///
/// # Example
/// ```bash
/// RUST_LOG=relay=debug cargo run -- --agent "write a script"
/// ```
pub fn init(verbose: bool) {
    let default_filter = if verbose { "relay=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
