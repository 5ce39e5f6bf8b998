//! Logging setup using tracing.
//!
//! Progress goes to stdout. `RUST_LOG` takes precedence over the `-v` count.

use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Maps the `-v` count to a default filter directive.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Installs the global subscriber.
///
/// # Errors
/// Returns an error if a subscriber has already been installed.
pub fn init(verbosity: u8) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stdout)
                .with_target(false),
        )
        .try_init()
        .map_err(|e| anyhow!("failed to initialize tracing: {}", e))?;

    Ok(())
}
