use tracing_subscriber::{fmt, EnvFilter};

/// Initialize structured logging with environment filter, tolerating an
/// already-installed subscriber.
///
/// Layer entry points run inside an arbitrary host process that may have set
/// up its own subscriber; in that case the host wins. `default_filter` is
/// used when VKLENS_LOG is unset (it comes from the layer config). Set
/// VKLENS_LOG=debug (or trace, info, warn, error) for verbosity control.
pub fn try_init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_env("VKLENS_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .try_init();
}
