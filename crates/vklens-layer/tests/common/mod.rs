//! Fake next-layer driver for exercising the layer entry points in-process.
//!
//! Dispatchable handles are leaked allocations whose first pointer-sized
//! word carries the dispatch key, mirroring what the loader does with its
//! dispatch-table pointer. The fake driver records the calls the layer
//! forwards to it so tests can assert passthrough behavior.
#![allow(dead_code)]

use std::ffi::{c_char, CStr};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use ash::vk;
use ash::vk::Handle;

use vklens_layer::dispatch::{BaseDeviceLayerObject, BaseInstanceLayerObject};
use vklens_layer::{device, instance, proc_address, swapchain};

static NEXT_KEY: AtomicUsize = AtomicUsize::new(0x1000);
static NEXT_SWAPCHAIN: AtomicU64 = AtomicU64::new(0x9000);

/// Image handles the fake driver reports per swapchain.
pub const IMAGE_COUNT: u32 = 3;

/// Swapchains the layer forwarded a present for.
pub static PRESENTED: Mutex<Vec<u64>> = Mutex::new(Vec::new());
/// Swapchains the layer forwarded a destroy for.
pub static DESTROYED_SWAPCHAINS: Mutex<Vec<u64>> = Mutex::new(Vec::new());
/// Devices the layer forwarded a destroy for.
pub static DESTROYED_DEVICES: Mutex<Vec<u64>> = Mutex::new(Vec::new());
/// Queues the layer forwarded a submit for.
pub static SUBMITTED: Mutex<Vec<u64>> = Mutex::new(Vec::new());

/// A fresh dispatch-key value, unique within the test binary.
pub fn next_key() -> usize {
    NEXT_KEY.fetch_add(0x10, Ordering::Relaxed)
}

/// Allocate a dispatchable handle whose first word is `key`.
fn fake_dispatchable(key: usize) -> u64 {
    Box::leak(Box::new([key, 0usize])) as *mut [usize; 2] as u64
}

pub fn fake_instance(key: usize) -> vk::Instance {
    vk::Instance::from_raw(fake_dispatchable(key))
}

pub fn fake_physical_device(key: usize) -> vk::PhysicalDevice {
    vk::PhysicalDevice::from_raw(fake_dispatchable(key))
}

pub fn fake_device(key: usize) -> vk::Device {
    vk::Device::from_raw(fake_dispatchable(key))
}

/// Queues share their device's dispatch key.
pub fn fake_queue(key: usize) -> vk::Queue {
    vk::Queue::from_raw(fake_dispatchable(key))
}

fn as_pfn(f: *const ()) -> vk::PFN_vkVoidFunction {
    Some(unsafe { std::mem::transmute::<*const (), unsafe extern "system" fn()>(f) })
}

// ── Fake driver entry points ────────────────────────────────

pub unsafe extern "system" fn fake_gipa(
    _instance: vk::Instance,
    p_name: *const c_char,
) -> vk::PFN_vkVoidFunction {
    let name = CStr::from_ptr(p_name).to_str().ok()?;
    match name {
        "vkGetInstanceProcAddr" => as_pfn(fake_gipa as *const ()),
        "vkCreateInstance" => as_pfn(fake_create_instance as *const ()),
        "vkDestroyInstance" => as_pfn(fake_destroy_instance as *const ()),
        // Not intercepted by the layer; resolved via fall-through.
        "vkEnumeratePhysicalDevices" => as_pfn(fake_enumerate_physical_devices as *const ()),
        _ => None,
    }
}

pub unsafe extern "system" fn fake_gdpa(
    _device: vk::Device,
    p_name: *const c_char,
) -> vk::PFN_vkVoidFunction {
    let name = CStr::from_ptr(p_name).to_str().ok()?;
    match name {
        "vkGetDeviceProcAddr" => as_pfn(fake_gdpa as *const ()),
        "vkCreateDevice" => as_pfn(fake_create_device as *const ()),
        "vkDestroyDevice" => as_pfn(fake_destroy_device as *const ()),
        "vkQueueSubmit" => as_pfn(fake_queue_submit as *const ()),
        "vkCreateSwapchainKHR" => as_pfn(fake_create_swapchain as *const ()),
        "vkGetSwapchainImagesKHR" => as_pfn(fake_get_swapchain_images as *const ()),
        "vkQueuePresentKHR" => as_pfn(fake_queue_present as *const ()),
        "vkDestroySwapchainKHR" => as_pfn(fake_destroy_swapchain as *const ()),
        // Not intercepted by the layer; resolved via fall-through.
        "vkDeviceWaitIdle" => as_pfn(fake_device_wait_idle as *const ()),
        _ => None,
    }
}

pub unsafe extern "system" fn fake_create_instance(
    _p_create_info: *const vk::InstanceCreateInfo<'_>,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
    _p_instance: *mut vk::Instance,
) -> vk::Result {
    // Loader semantics: *p_instance already carries the handle.
    vk::Result::SUCCESS
}

pub unsafe extern "system" fn fake_destroy_instance(
    _instance: vk::Instance,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
) {
}

pub unsafe extern "system" fn fake_enumerate_physical_devices(
    _instance: vk::Instance,
    _p_count: *mut u32,
    _p_devices: *mut vk::PhysicalDevice,
) -> vk::Result {
    vk::Result::SUCCESS
}

pub unsafe extern "system" fn fake_create_device(
    _physical_device: vk::PhysicalDevice,
    _p_create_info: *const vk::DeviceCreateInfo<'_>,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
    _p_device: *mut vk::Device,
) -> vk::Result {
    vk::Result::SUCCESS
}

pub unsafe extern "system" fn fake_destroy_device(
    device: vk::Device,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
) {
    DESTROYED_DEVICES
        .lock()
        .expect("lock")
        .push(device.as_raw());
}

pub unsafe extern "system" fn fake_device_wait_idle(_device: vk::Device) -> vk::Result {
    vk::Result::SUCCESS
}

pub unsafe extern "system" fn fake_queue_submit(
    queue: vk::Queue,
    _submit_count: u32,
    _p_submits: *const vk::SubmitInfo<'_>,
    _fence: vk::Fence,
) -> vk::Result {
    SUBMITTED.lock().expect("lock").push(queue.as_raw());
    vk::Result::SUCCESS
}

/// Fails (without writing a handle) when the requested extent width is zero;
/// tests use that as the failure trigger.
pub unsafe extern "system" fn fake_create_swapchain(
    _device: vk::Device,
    p_create_info: *const vk::SwapchainCreateInfoKHR<'_>,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
    p_swapchain: *mut vk::SwapchainKHR,
) -> vk::Result {
    if (*p_create_info).image_extent.width == 0 {
        return vk::Result::ERROR_DEVICE_LOST;
    }
    let raw = NEXT_SWAPCHAIN.fetch_add(1, Ordering::Relaxed);
    *p_swapchain = vk::SwapchainKHR::from_raw(raw);
    vk::Result::SUCCESS
}

pub unsafe extern "system" fn fake_get_swapchain_images(
    _device: vk::Device,
    swapchain: vk::SwapchainKHR,
    p_count: *mut u32,
    p_images: *mut vk::Image,
) -> vk::Result {
    *p_count = IMAGE_COUNT;
    if !p_images.is_null() {
        for i in 0..IMAGE_COUNT {
            *p_images.add(i as usize) =
                vk::Image::from_raw((swapchain.as_raw() << 8) | u64::from(i));
        }
    }
    vk::Result::SUCCESS
}

pub unsafe extern "system" fn fake_queue_present(
    _queue: vk::Queue,
    p_present_info: *const vk::PresentInfoKHR<'_>,
) -> vk::Result {
    let info = &*p_present_info;
    let swapchains =
        std::slice::from_raw_parts(info.p_swapchains, info.swapchain_count as usize);
    let mut presented = PRESENTED.lock().expect("lock");
    for swapchain in swapchains {
        presented.push(swapchain.as_raw());
    }
    vk::Result::SUCCESS
}

pub unsafe extern "system" fn fake_destroy_swapchain(
    _device: vk::Device,
    swapchain: vk::SwapchainKHR,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
) {
    DESTROYED_SWAPCHAINS
        .lock()
        .expect("lock")
        .push(swapchain.as_raw());
}

// ── Handshake + lifecycle helpers ───────────────────────────

pub const GIPA_NAME: &[u8] = b"vkGetInstanceProcAddr\0";
pub const GDPA_NAME: &[u8] = b"vkGetDeviceProcAddr\0";

/// Run the instance-scope handshake for a fresh fake instance and return it.
pub unsafe fn prime_instance(key: usize) -> vk::Instance {
    let instance = fake_instance(key);
    let wrap = Box::leak(Box::new(BaseInstanceLayerObject {
        next_get_instance_proc_addr: fake_gipa,
        base_object: instance,
        next_object: instance,
    }));
    let resolver = proc_address::vkGetInstanceProcAddr(
        vk::Instance::from_raw(wrap as *const BaseInstanceLayerObject as u64),
        GIPA_NAME.as_ptr().cast(),
    );
    assert!(resolver.is_some(), "handshake must return the layer resolver");
    instance
}

/// Run the device-scope handshake for a fresh fake device and return it.
pub unsafe fn prime_device(key: usize) -> vk::Device {
    let device = fake_device(key);
    let wrap = Box::leak(Box::new(BaseDeviceLayerObject {
        next_get_device_proc_addr: fake_gdpa,
        base_object: device,
        next_object: device,
    }));
    let resolver = proc_address::vkGetDeviceProcAddr(
        vk::Device::from_raw(wrap as *const BaseDeviceLayerObject as u64),
        GDPA_NAME.as_ptr().cast(),
    );
    assert!(resolver.is_some(), "handshake must return the layer resolver");
    device
}

/// Handshake plus vkCreateInstance through the layer.
pub unsafe fn create_instance(key: usize) -> vk::Instance {
    let mut handle = prime_instance(key);
    let create_info = vk::InstanceCreateInfo::default();
    let result = instance::vkCreateInstance(&create_info, std::ptr::null(), &mut handle);
    assert_eq!(result, vk::Result::SUCCESS);
    handle
}

/// Handshake plus vkCreateDevice through the layer.
pub unsafe fn create_device(key: usize) -> vk::Device {
    let mut handle = prime_device(key);
    let create_info = vk::DeviceCreateInfo::default();
    let result = device::vkCreateDevice(
        fake_physical_device(key),
        &create_info,
        std::ptr::null(),
        &mut handle,
    );
    assert_eq!(result, vk::Result::SUCCESS);
    handle
}

/// vkCreateSwapchainKHR through the layer with the given extent/format.
pub unsafe fn create_swapchain(
    device: vk::Device,
    width: u32,
    height: u32,
    format: vk::Format,
) -> (vk::Result, vk::SwapchainKHR) {
    let create_info = vk::SwapchainCreateInfoKHR::default()
        .image_extent(vk::Extent2D { width, height })
        .image_format(format);
    let mut handle = vk::SwapchainKHR::null();
    let result =
        swapchain::vkCreateSwapchainKHR(device, &create_info, std::ptr::null(), &mut handle);
    (result, handle)
}

/// The populate call: fetch images into a buffer through the layer.
pub unsafe fn fetch_images(device: vk::Device, handle: vk::SwapchainKHR) -> Vec<vk::Image> {
    let mut count = 0u32;
    let result =
        swapchain::vkGetSwapchainImagesKHR(device, handle, &mut count, std::ptr::null_mut());
    assert_eq!(result, vk::Result::SUCCESS);
    let mut images = vec![vk::Image::null(); count as usize];
    let result =
        swapchain::vkGetSwapchainImagesKHR(device, handle, &mut count, images.as_mut_ptr());
    assert_eq!(result, vk::Result::SUCCESS);
    images
}

/// Present `handle` on a queue sharing `device`'s dispatch key.
pub unsafe fn present_one(key: usize, handle: vk::SwapchainKHR) -> vk::Result {
    let queue = fake_queue(key);
    let swapchains = [handle];
    let present_info = vk::PresentInfoKHR::default().swapchains(&swapchains);
    swapchain::vkQueuePresentKHR(queue, &present_info)
}
