//! Structured logging setup.
//!
//! stdout carries protocol traffic exclusively, so every subscriber built
//! here writes to stderr.

/// Level used when `--verbose` is passed.
pub const VERBOSE_LEVEL: &str = "debug";

/// Level used before settings are loaded.
pub const BOOTSTRAP_LEVEL: &str = "warn";

fn stderr_subscriber(level: &str) -> impl tracing::Subscriber + Send + Sync + 'static {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact()
        .finish()
}

/// Initialize the global tracing subscriber with stderr output only.
///
/// `RUST_LOG` takes precedence over `level` when set. Subsequent calls are
/// no-ops.
pub fn init_subscriber(level: &str) {
    use tracing_subscriber::util::SubscriberInitExt;

    // try_init fails if a global subscriber is already installed
    let _ = stderr_subscriber(level).try_init();
}

/// Run `f` with a temporary stderr subscriber at `level`.
///
/// Covers the window before the configured level is known, so warnings
/// raised while loading settings still reach stderr. No global state is set.
pub fn with_bootstrap_subscriber<T>(level: &str, f: impl FnOnce() -> T) -> T {
    tracing::subscriber::with_default(stderr_subscriber(level), f)
}

/// Pick the effective log level from the verbosity flag and configured level.
pub fn effective_level(verbose: bool, configured: &str) -> &str {
    if verbose { VERBOSE_LEVEL } else { configured }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_subscriber_does_not_panic() {
        init_subscriber("warn");
        init_subscriber("debug");
    }

    #[test]
    fn bootstrap_subscriber_returns_the_closure_value() {
        let value = with_bootstrap_subscriber(BOOTSTRAP_LEVEL, || {
            tracing::warn!("emitted before settings are loaded");
            42
        });
        assert_eq!(value, 42);
        init_subscriber("warn");
    }

    #[test]
    fn verbose_overrides_configured_level() {
        assert_eq!(effective_level(true, "warn"), "debug");
        assert_eq!(effective_level(false, "info"), "info");
    }
}
