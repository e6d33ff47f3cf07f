//! Process-wide layer context.
//!
//! One `LayerContext` exists per process, constructed lazily on first use.
//! It owns every registry the entry points consult, replacing the file-scope
//! globals a classic layer would use: registry insertion/erasure goes through
//! concurrent maps, and one-time setup is guarded by `OnceLock` so it is
//! safe under concurrent first use.

use std::sync::OnceLock;

use parking_lot::Mutex;
use tracing::debug;

use vklens_core::config::LensConfig;
use vklens_core::registry::DispatchRegistry;

use crate::device::DeviceRecord;
use crate::dispatch::{DeviceTable, InstanceTable};
use crate::instance::InstanceRecord;

static CONTEXT: OnceLock<LayerContext> = OnceLock::new();

/// All mutable layer state, keyed by dispatch key.
pub struct LayerContext {
    pub instance_tables: DispatchRegistry<InstanceTable>,
    pub instance_records: DispatchRegistry<InstanceRecord>,
    pub device_tables: DispatchRegistry<DeviceTable>,
    pub device_records: DispatchRegistry<DeviceRecord>,
    pub config: LensConfig,
    /// Process-wide lock, initialized during the first successful instance
    /// creation and never torn down. Currently a placeholder for
    /// per-instance locking; the per-device state carries its own locks.
    process_lock: OnceLock<Mutex<()>>,
}

impl LayerContext {
    fn new() -> Self {
        Self {
            instance_tables: DispatchRegistry::new(),
            instance_records: DispatchRegistry::new(),
            device_tables: DispatchRegistry::new(),
            device_records: DispatchRegistry::new(),
            config: LensConfig::load_default(),
            process_lock: OnceLock::new(),
        }
    }

    /// One-time process setup: logging and the process-wide lock. Called
    /// after every successful instance creation; only the first call does
    /// anything, and concurrent first calls are safe.
    pub fn ensure_process_init(&self) {
        self.process_lock.get_or_init(|| {
            vklens_common::logging::try_init_logging(&self.config.layer.log_filter);
            debug!("layer process state initialized");
            Mutex::new(())
        });
    }

    pub fn process_initialized(&self) -> bool {
        self.process_lock.get().is_some()
    }
}

/// The process-wide context.
pub fn context() -> &'static LayerContext {
    CONTEXT.get_or_init(LayerContext::new)
}
