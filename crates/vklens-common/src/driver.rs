//! Dynamic loading of the platform's Vulkan driver/loader library.
//!
//! Uses `libloading` to load `vulkan-1.dll` (Windows) or `libvulkan.so.1`
//! (Linux) and resolve the driver's instance-level entry-point resolver.
//! This is the bootstrap path a host shell uses to reach the driver below
//! the layer chain; the layer itself only ever forwards through tables
//! primed by the loader handshake.

use std::ffi::c_char;

use libloading::Library;
use tracing::info;

use crate::platform;

/// Signature of `vkGetInstanceProcAddr` as exported by the driver.
/// The instance handle is opaque here; the caller passes it through untouched.
pub type PfnGetInstanceProcAddr =
    unsafe extern "system" fn(instance: u64, p_name: *const c_char) -> Option<unsafe extern "system" fn()>;

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("failed to load driver library '{name}': {source}")]
    LibraryNotFound {
        name: String,
        #[source]
        source: libloading::Error,
    },

    #[error("driver library '{name}' does not export '{symbol}': {source}")]
    SymbolMissing {
        name: String,
        symbol: String,
        #[source]
        source: libloading::Error,
    },
}

/// A loaded driver library together with its entry-point resolver.
///
/// The library handle is kept alive for the lifetime of this struct; the
/// resolver pointer is only valid while it is.
pub struct DriverResolver {
    _lib: Library,
    get_instance_proc_addr: PfnGetInstanceProcAddr,
}

impl DriverResolver {
    /// Load the platform's driver library by its fixed name.
    pub fn load() -> Result<Self, DriverError> {
        Self::load_from(platform::driver_library_name())
    }

    /// Load a driver library by explicit name and resolve its
    /// `vkGetInstanceProcAddr` symbol.
    pub fn load_from(name: &str) -> Result<Self, DriverError> {
        let lib = unsafe { Library::new(name) }.map_err(|source| DriverError::LibraryNotFound {
            name: name.to_string(),
            source,
        })?;

        let get_instance_proc_addr = unsafe {
            lib.get::<PfnGetInstanceProcAddr>(b"vkGetInstanceProcAddr\0")
                .map(|sym| *sym)
                .map_err(|source| DriverError::SymbolMissing {
                    name: name.to_string(),
                    symbol: "vkGetInstanceProcAddr".to_string(),
                    source,
                })?
        };

        info!("loaded driver library '{}'", name);
        Ok(Self {
            _lib: lib,
            get_instance_proc_addr,
        })
    }

    /// The driver's instance-level entry-point resolver.
    pub fn get_instance_proc_addr(&self) -> PfnGetInstanceProcAddr {
        self.get_instance_proc_addr
    }
}
