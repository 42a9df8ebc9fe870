//! Tracing initialization for process entry points.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use usagehub_core::{Error, Result};

/// Initializes the tracing subscriber for structured logging.
///
/// The log level is configured via the `RUST_LOG` environment variable and
/// defaults to `info`.
pub fn init_tracing() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| {
            Error::configuration().with_message(format!("invalid RUST_LOG filter: {e}"))
        })?;

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_level(true)
        .with_ansi(true);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .try_init()
        .map_err(|e| {
            Error::configuration().with_message(format!("failed to initialize tracing: {e}"))
        })
}
