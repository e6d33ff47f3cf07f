//! Device lifecycle hooks and the per-device state record.

use std::collections::HashMap;

use ash::vk;
use ash::vk::Handle;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::context::context;
use crate::dispatch::{handle_key, DeviceTable};
use crate::swapchain::SwapchainState;

/// Per-device state: the originating handles, the four forwarded swapchain
/// entry points captured at creation, and the tracked swapchain collection.
///
/// The swapchain map is the layer's hot shared state; it is guarded by a
/// per-record reader/writer lock so presentation on one thread can overlap
/// tracking changes on another.
pub struct DeviceRecord {
    pub physical_device: vk::PhysicalDevice,
    pub device: vk::Device,
    pub(crate) create_swapchain: vk::PFN_vkCreateSwapchainKHR,
    pub(crate) get_swapchain_images: vk::PFN_vkGetSwapchainImagesKHR,
    pub(crate) queue_present: vk::PFN_vkQueuePresentKHR,
    pub(crate) destroy_swapchain: vk::PFN_vkDestroySwapchainKHR,
    pub(crate) swapchains: RwLock<HashMap<u64, SwapchainState>>,
}

impl DeviceRecord {
    /// Capture the forwarded swapchain entry points for a freshly created
    /// device and start with an empty swapchain collection.
    ///
    /// # Safety
    /// `device` must be the live handle `table` was primed for.
    pub unsafe fn capture(
        physical_device: vk::PhysicalDevice,
        device: vk::Device,
        table: &DeviceTable,
    ) -> Self {
        unsafe {
            Self {
                physical_device,
                device,
                create_swapchain: std::mem::transmute::<unsafe extern "system" fn(), _>(
                    table.require(device, b"vkCreateSwapchainKHR\0"),
                ),
                get_swapchain_images: std::mem::transmute::<unsafe extern "system" fn(), _>(
                    table.require(device, b"vkGetSwapchainImagesKHR\0"),
                ),
                queue_present: std::mem::transmute::<unsafe extern "system" fn(), _>(
                    table.require(device, b"vkQueuePresentKHR\0"),
                ),
                destroy_swapchain: std::mem::transmute::<unsafe extern "system" fn(), _>(
                    table.require(device, b"vkDestroySwapchainKHR\0"),
                ),
                swapchains: RwLock::new(HashMap::new()),
            }
        }
    }

    /// Structural cleanup at device destruction. Swapchains are expected to
    /// have been destroyed individually by the application; anything still
    /// tracked here has driver-side state the layer never saw released.
    pub fn cleanup(&self) {
        let remaining = self.swapchains.read().len();
        if remaining > 0 {
            warn!(
                remaining,
                "device destroyed with swapchains still tracked; driver-side state leaks"
            );
        }
    }
}

#[no_mangle]
pub unsafe extern "system" fn vkCreateDevice(
    physical_device: vk::PhysicalDevice,
    p_create_info: *const vk::DeviceCreateInfo<'_>,
    p_allocator: *const vk::AllocationCallbacks<'_>,
    p_device: *mut vk::Device,
) -> vk::Result {
    if p_create_info.is_null() || p_device.is_null() {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }

    let ctx = context();
    // Table primed under the loader-seeded handle during the handshake.
    let table = ctx.device_tables.get(unsafe { handle_key(*p_device) });

    let result =
        unsafe { (table.create_device)(physical_device, p_create_info, p_allocator, p_device) };
    if result != vk::Result::SUCCESS {
        return result;
    }

    let device = unsafe { *p_device };
    let record = unsafe { DeviceRecord::capture(physical_device, device, &table) };
    // Registration completes before returning so any later call on this
    // device observes the record.
    ctx.device_records
        .insert(unsafe { handle_key(device) }, record);

    debug!(device = device.as_raw(), "device created and registered");
    result
}

#[no_mangle]
pub unsafe extern "system" fn vkDestroyDevice(
    device: vk::Device,
    p_allocator: *const vk::AllocationCallbacks<'_>,
) {
    if device == vk::Device::null() {
        return;
    }

    let ctx = context();
    let key = unsafe { handle_key(device) };

    ctx.device_records.get(key).cleanup();

    let table = ctx.device_tables.get(key);
    unsafe { (table.destroy_device)(device, p_allocator) };

    let _ = ctx.device_records.remove(key);
    let _ = ctx.device_tables.remove(key);

    debug!(device = device.as_raw(), "device destroyed and unregistered");
}

#[no_mangle]
pub unsafe extern "system" fn vkQueueSubmit(
    queue: vk::Queue,
    submit_count: u32,
    p_submits: *const vk::SubmitInfo<'_>,
    fence: vk::Fence,
) -> vk::Result {
    // Pure passthrough; interception point reserved for frame-timing
    // instrumentation. Queues share their device's dispatch key.
    let table = context().device_tables.get(unsafe { handle_key(queue) });
    unsafe { (table.queue_submit)(queue, submit_count, p_submits, fence) }
}
