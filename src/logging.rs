//! Logging setup.
//!
//! cattery emits `tracing` events and spans; nothing is printed unless a subscriber is
//! installed. [`init_logging`] installs a formatted subscriber filtered by `RUST_LOG`
//! (default `info`). Rendered SQL is logged at `info` under the `cattery::sql` target
//! when [`DatabaseConfig::show_sql`](crate::DatabaseConfig) is enabled.

use tracing_subscriber::{fmt, EnvFilter};

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info";

/// Install the global fmt subscriber.
///
/// Safe to call more than once: later calls leave the first subscriber in place.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_test_writer()
        .try_init();
}
