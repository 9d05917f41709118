// Tracing setup
//
// Logs go to stderr; stdout is reserved for translations, CSV and JSON.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "backtranslate=debug"
    } else {
        "backtranslate=info"
    }
}

/// Install the global fmt subscriber. `RUST_LOG` takes precedence over
/// `verbose`. Calling this twice is harmless; the second call is ignored.
pub fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
