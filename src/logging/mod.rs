//! Logging initialization.
//!
//! The crate logs through the `log` facade; the server binary installs an
//! `env_logger` backend honoring `RUST_LOG` (default `info`).

use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize the global logger. Safe to call more than once; only the first
/// call installs the backend.
pub fn init() {
    INIT.call_once(|| {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .format_timestamp_millis()
            .init();
    });
}
