//! Process-wide log setup for binaries and tests embedding the engine.

use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

/// Installs a global `tracing` subscriber filtered by `RUST_LOG`, falling back
/// to `default_filter` (e.g. `"docsync=info"`), and forwards `log` records
/// from the storage layer into it.
///
/// Returns `false` if a subscriber was already installed; calling this more
/// than once is harmless.
pub fn init_tracing(default_filter: &str) -> bool {
    let _ = tracing_log::LogTracer::init();

    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer());

    tracing::subscriber::set_global_default(subscriber).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_repeatable() {
        init_tracing("docsync=debug");
        assert!(!init_tracing("docsync=debug"));
        log::info!("bridged through tracing");
    }
}
