//! Log output for the CLI.
//!
//! Engine crates log through the `log` facade; the subscriber's `tracing-log`
//! bridge picks those records up. Everything goes to stderr so `--json`
//! stdout stays clean.

use std::io::IsTerminal;

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set. Otherwise `warn`, `-v` gives `debug`, `-vv`
/// gives `trace`.
pub fn init(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(verbose > 0)
        .init();
}
