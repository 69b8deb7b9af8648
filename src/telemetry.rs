//! Structured logging initialisation.

use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

/// Installs a JSON `fmt` subscriber filtered by `RUST_LOG`.
///
/// Failure (typically a subscriber that is already installed) is logged and
/// otherwise ignored.
pub fn init_tracing() {
    if let Err(error) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(%error, "tracing init failed");
    }
}
