//! Tracing setup for the notifier library.
//!
//! The host application may install its own subscriber; `init_tracing` is a
//! convenience for binaries and tests that embed the queue directly.
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `RUST_LOG` | Tracing filter directives | `info` |

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber with console output.
///
/// Returns an error string if a global subscriber is already installed.
pub fn init_tracing() -> Result<(), String> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| e.to_string())?;

    tracing::info!("Tracing initialized");

    Ok(())
}
