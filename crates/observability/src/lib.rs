//! `vendora-observability` — shared tracing setup.
//!
//! Every binary and every test harness that wants structured logs calls
//! [`init`] once at startup. The store and engine layers emit spans via
//! `#[instrument]`; this crate decides where they go.

use tracing_subscriber::EnvFilter;

/// Install the process-wide subscriber: JSON lines to stderr, filtered by
/// `RUST_LOG` (default `info`, with sqlx chatter capped at `warn`).
///
/// Calling this again after a subscriber is installed is a no-op, so tests
/// may call it freely.
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}
