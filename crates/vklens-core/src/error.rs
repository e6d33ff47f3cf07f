//! Error taxonomy for the layer.
//!
//! Two kinds of failure exist and they never mix:
//!
//! - Recoverable failures ([`CoreError`], plus Vulkan result codes forwarded
//!   verbatim by the layer) are reported to the caller.
//! - Lifecycle contract violations ([`contract_violation`]) are programming
//!   errors in the application or the layer chain and terminate the process.

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fail-fast path for lifecycle contract violations.
///
/// Presenting or destroying an untracked swapchain, registering a dispatch
/// key twice, or erasing one twice means the caller broke the ordering the
/// API guarantees; there is no meaningful way to continue. The panic aborts
/// the process when it unwinds out of an `extern "system"` entry point,
/// which is exactly the behavior callers rely on: this must never surface
/// as a recoverable error code.
#[track_caller]
pub fn contract_violation(msg: &str) -> ! {
    tracing::error!("contract violation: {}", msg);
    panic!("contract violation: {}", msg);
}
