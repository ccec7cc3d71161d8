//! Logging initialization.
//!
//! Logs go to stderr so that a changelog printed to stdout can be piped or
//! redirected untouched.

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT_ONCE: Once = Once::new();

/// Filter used when `RUST_LOG` is not set.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "modpack_changelog=debug"
    } else {
        "modpack_changelog=info"
    }
}

/// Installs the global tracing subscriber. Only the first call has an effect.
///
/// `RUST_LOG` takes precedence over `verbose`.
pub fn init(verbose: bool) {
    INIT_ONCE.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
