//! Console logging for the CLI.
//!
//! Library crates log through the `log` facade; the subscriber installed
//! here also captures those records. `RUST_LOG` overrides the default
//! `info` filter.

use std::io;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

/// Install the global subscriber, writing to stderr.
///
/// # Errors
///
/// Returns an error when a global subscriber or logger is already set.
pub(crate) fn init() -> Result<(), TryInitError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .try_init()
}
