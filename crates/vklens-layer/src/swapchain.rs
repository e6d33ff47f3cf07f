//! Swapchain shadow-state tracking and the intercepted WSI entry points.
//!
//! Each tracked swapchain mirrors the dimensions, pixel format and
//! presentable-image list of the driver-side object. The shadow state is
//! mutated only at the lifecycle hooks below; forwarded failures leave it
//! untouched.

use ash::vk;
use ash::vk::Handle;
use tracing::{debug, trace};

use vklens_core::error::contract_violation;

use crate::context::context;
use crate::device::DeviceRecord;
use crate::dispatch::handle_key;

/// Bookkeeping wrapper for one presentable image. The image itself is owned
/// by the underlying implementation; dropping the wrapper frees only the
/// wrapper.
pub struct PresentableImage {
    pub image: vk::Image,
}

/// Shadow state for one swapchain. Extent and format are set once at
/// creation and never change; the image list stays empty until the first
/// fetch with a non-null output buffer.
pub struct SwapchainState {
    pub width: u32,
    pub height: u32,
    pub format: vk::Format,
    pub images: Vec<PresentableImage>,
}

/// Owned copy of a swapchain's tracked state, for inspection without holding
/// the record's lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapchainSnapshot {
    pub width: u32,
    pub height: u32,
    pub format: vk::Format,
    pub images: Vec<vk::Image>,
}

impl DeviceRecord {
    /// Begin tracking a successfully created swapchain.
    pub fn track_swapchain(&self, swapchain: u64, create_info: &vk::SwapchainCreateInfoKHR) {
        let state = SwapchainState {
            width: create_info.image_extent.width,
            height: create_info.image_extent.height,
            format: create_info.image_format,
            images: Vec::new(),
        };
        if self.swapchains.write().insert(swapchain, state).is_some() {
            contract_violation(&format!("swapchain {:#x} tracked twice", swapchain));
        }
    }

    /// Append the images reported by the underlying implementation, in its
    /// order. A second fetch appends again; the duplication is a documented
    /// limitation of the reference layer and is preserved, not fixed.
    pub fn append_images(&self, swapchain: u64, images: &[vk::Image]) {
        let mut map = self.swapchains.write();
        match map.get_mut(&swapchain) {
            Some(state) => state
                .images
                .extend(images.iter().map(|&image| PresentableImage { image })),
            None => contract_violation(&format!("swapchain {:#x} is not tracked", swapchain)),
        }
    }

    /// Presentation-time lookup: the swapchain must be tracked, otherwise
    /// the application broke the lifecycle ordering. The frame hook runs
    /// under the read guard; presentation is per-frame, so no copy of the
    /// shadow state is made here.
    pub fn expect_tracked(&self, swapchain: u64) {
        match self.swapchains.read().get(&swapchain) {
            Some(state) => inspect_frame(swapchain, state),
            None => contract_violation(&format!(
                "presenting untracked swapchain {:#x}",
                swapchain
            )),
        }
    }

    /// Stop tracking a swapchain, releasing its image wrappers. Untracking
    /// twice is a contract violation.
    pub fn untrack_swapchain(&self, swapchain: u64) -> SwapchainState {
        match self.swapchains.write().remove(&swapchain) {
            Some(state) => state,
            None => contract_violation(&format!(
                "destroying untracked swapchain {:#x}",
                swapchain
            )),
        }
    }

    pub fn tracked(&self, swapchain: u64) -> Option<SwapchainSnapshot> {
        self.swapchains.read().get(&swapchain).map(|state| SwapchainSnapshot {
            width: state.width,
            height: state.height,
            format: state.format,
            images: state.images.iter().map(|wrapper| wrapper.image).collect(),
        })
    }

    pub fn tracked_count(&self) -> usize {
        self.swapchains.read().len()
    }
}

/// Frame-content hook, run per swapchain immediately before the present is
/// forwarded. No content is generated here; this is the seam where an
/// overlay would scribble into the presentable image.
fn inspect_frame(swapchain: u64, state: &SwapchainState) {
    if context().config.layer.trace_present {
        trace!(
            swapchain,
            width = state.width,
            height = state.height,
            images = state.images.len(),
            "presenting"
        );
    }
}

#[no_mangle]
pub unsafe extern "system" fn vkCreateSwapchainKHR(
    device: vk::Device,
    p_create_info: *const vk::SwapchainCreateInfoKHR<'_>,
    p_allocator: *const vk::AllocationCallbacks<'_>,
    p_swapchain: *mut vk::SwapchainKHR,
) -> vk::Result {
    if p_create_info.is_null() || p_swapchain.is_null() {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }

    let record = context().device_records.get(unsafe { handle_key(device) });

    let result =
        unsafe { (record.create_swapchain)(device, p_create_info, p_allocator, p_swapchain) };
    if result == vk::Result::SUCCESS {
        let create_info = unsafe { &*p_create_info };
        let swapchain = unsafe { *p_swapchain }.as_raw();
        record.track_swapchain(swapchain, create_info);
        debug!(
            swapchain,
            width = create_info.image_extent.width,
            height = create_info.image_extent.height,
            format = ?create_info.image_format,
            "tracking swapchain"
        );
    }
    result
}

#[no_mangle]
pub unsafe extern "system" fn vkGetSwapchainImagesKHR(
    device: vk::Device,
    swapchain: vk::SwapchainKHR,
    p_count: *mut u32,
    p_images: *mut vk::Image,
) -> vk::Result {
    if p_count.is_null() {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }

    let record = context().device_records.get(unsafe { handle_key(device) });

    let result =
        unsafe { (record.get_swapchain_images)(device, swapchain, p_count, p_images) };

    // A null image buffer is the capacity query and has no side effect; only
    // the actual fetch populates the shadow list.
    if !p_images.is_null() {
        let images = unsafe { std::slice::from_raw_parts(p_images, *p_count as usize) };
        record.append_images(swapchain.as_raw(), images);
        debug!(
            swapchain = swapchain.as_raw(),
            count = images.len(),
            "captured presentable images"
        );
    }
    result
}

#[no_mangle]
pub unsafe extern "system" fn vkQueuePresentKHR(
    queue: vk::Queue,
    p_present_info: *const vk::PresentInfoKHR<'_>,
) -> vk::Result {
    if p_present_info.is_null() {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }

    let record = context().device_records.get(unsafe { handle_key(queue) });
    let present_info = unsafe { &*p_present_info };

    if !present_info.p_swapchains.is_null() {
        let swapchains = unsafe {
            std::slice::from_raw_parts(
                present_info.p_swapchains,
                present_info.swapchain_count as usize,
            )
        };
        for swapchain in swapchains {
            record.expect_tracked(swapchain.as_raw());
        }
    }

    unsafe { (record.queue_present)(queue, p_present_info) }
}

#[no_mangle]
pub unsafe extern "system" fn vkDestroySwapchainKHR(
    device: vk::Device,
    swapchain: vk::SwapchainKHR,
    p_allocator: *const vk::AllocationCallbacks<'_>,
) {
    if swapchain == vk::SwapchainKHR::null() {
        return;
    }

    let record = context().device_records.get(unsafe { handle_key(device) });

    let state = record.untrack_swapchain(swapchain.as_raw());
    debug!(
        swapchain = swapchain.as_raw(),
        images = state.images.len(),
        "released swapchain shadow state"
    );
    drop(state);

    unsafe { (record.destroy_swapchain)(device, swapchain, p_allocator) };
}
