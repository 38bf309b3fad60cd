//! Station Configuration Module
//!
//! Per-station configuration loaded from TOML files: server bind address,
//! catalog directory and column keywords, camera geometry, guideline policy
//! and the capture archive location.
//!
//! ## Loading Order
//!
//! 1. `INSPECTA_CONFIG` environment variable (path to TOML file)
//! 2. `station_config.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! Call `config::init()` once at startup, then `config::get()` anywhere:
//!
//! ```ignore
//! // In main():
//! config::init(StationConfig::load());
//!
//! // Anywhere in the codebase:
//! let dir = &config::get().catalog.dir;
//! ```

mod station_config;

pub use station_config::*;

use std::sync::OnceLock;

/// Global station configuration, initialized once at startup.
static STATION_CONFIG: OnceLock<StationConfig> = OnceLock::new();

/// Initialize the global station configuration.
///
/// Must be called exactly once before any calls to `get()`.
pub fn init(config: StationConfig) {
    if STATION_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once - ignoring");
    }
}

/// Get a reference to the global station configuration.
///
/// Panics if `init()` has not been called. A missing config is a fatal
/// startup error, not a recoverable condition.
#[allow(clippy::expect_used)]
pub fn get() -> &'static StationConfig {
    STATION_CONFIG
        .get()
        .expect("config::get() called before config::init() - this is a startup bug")
}

/// Check whether the config has been initialized.
///
/// Useful for tests and optional config paths.
pub fn is_initialized() -> bool {
    STATION_CONFIG.get().is_some()
}
