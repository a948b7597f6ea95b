//! Tracing subscriber initialization.
//!
//! Diagnostics go to stderr through `tracing`; command results stay on
//! stdout so they can be piped. `RUST_LOG` wins over the configured level.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub fn init_logger(level: &str, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .with_ansi(atty::is(atty::Stream::Stderr));

    // A second init (tests, embedding callers) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
