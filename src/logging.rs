//! Logging initialization
//!
//! The crate itself only emits `tracing` events; binaries and tests pick a
//! subscriber here.

use std::sync::Once;
use tracing_subscriber::EnvFilter;

/// Logging profile configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable output with debug level
    Development,
    /// JSON structured output with info level
    Production,
    /// Output routed through the test harness so it is captured per test
    Test,
}

static INIT_ONCE: Once = Once::new();

/// Install a global subscriber for the given profile.
///
/// Only the first call has any effect. `RUST_LOG` overrides the default filter.
pub fn init(profile: Profile) {
    INIT_ONCE.call_once(|| {
        let filter = |default: &str| {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
        };
        // try_init: another subscriber may already be installed by the host
        let _ = match profile {
            Profile::Development => tracing_subscriber::fmt()
                .with_env_filter(filter("sqlite_accessor=debug"))
                .try_init(),
            Profile::Production => tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter("sqlite_accessor=info"))
                .try_init(),
            Profile::Test => tracing_subscriber::fmt()
                .with_test_writer()
                .with_env_filter(filter("sqlite_accessor=debug"))
                .try_init(),
        };
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init(Profile::Test);
        init(Profile::Test);
        init(Profile::Development);
    }
}
