//! Entry-point resolution: the exported per-scope resolvers and the closed
//! set of intercepted functions.
//!
//! The loader (or the layer above) calls a scope's resolver with the
//! resolver's own name once per object to run the layer-chain handshake;
//! the layer primes its forwarding table for that object and returns its own
//! resolver so the chain discovers this layer. Every other name is either an
//! intercepted function or falls through to the next layer's resolver.

use std::ffi::{c_char, CStr};

use ash::vk;
use ash::vk::Handle;

use crate::context::context;
use crate::device;
use crate::dispatch::{
    handle_key, BaseDeviceLayerObject, BaseInstanceLayerObject, DeviceTable, InstanceTable,
};
use crate::instance;
use crate::swapchain;

/// Bootstrap name of the instance-scope resolver.
pub const INSTANCE_BOOTSTRAP: &str = "vkGetInstanceProcAddr";
/// Bootstrap name of the device-scope resolver.
pub const DEVICE_BOOTSTRAP: &str = "vkGetDeviceProcAddr";

/// Instance-scope interception set. Name matching is case-sensitive
/// full-string equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceHook {
    CreateInstance,
    DestroyInstance,
}

impl InstanceHook {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "vkCreateInstance" => Some(Self::CreateInstance),
            "vkDestroyInstance" => Some(Self::DestroyInstance),
            _ => None,
        }
    }

    pub fn pointer(self) -> vk::PFN_vkVoidFunction {
        let pfn = match self {
            Self::CreateInstance => instance::vkCreateInstance as *const (),
            Self::DestroyInstance => instance::vkDestroyInstance as *const (),
        };
        Some(unsafe { std::mem::transmute::<*const (), unsafe extern "system" fn()>(pfn) })
    }
}

/// Device-scope interception set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceHook {
    CreateDevice,
    DestroyDevice,
    CreateSwapchain,
    GetSwapchainImages,
    QueuePresent,
    DestroySwapchain,
    QueueSubmit,
}

impl DeviceHook {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "vkCreateDevice" => Some(Self::CreateDevice),
            "vkDestroyDevice" => Some(Self::DestroyDevice),
            "vkCreateSwapchainKHR" => Some(Self::CreateSwapchain),
            "vkGetSwapchainImagesKHR" => Some(Self::GetSwapchainImages),
            "vkQueuePresentKHR" => Some(Self::QueuePresent),
            "vkDestroySwapchainKHR" => Some(Self::DestroySwapchain),
            "vkQueueSubmit" => Some(Self::QueueSubmit),
            _ => None,
        }
    }

    pub fn pointer(self) -> vk::PFN_vkVoidFunction {
        let pfn = match self {
            Self::CreateDevice => device::vkCreateDevice as *const (),
            Self::DestroyDevice => device::vkDestroyDevice as *const (),
            Self::CreateSwapchain => swapchain::vkCreateSwapchainKHR as *const (),
            Self::GetSwapchainImages => swapchain::vkGetSwapchainImagesKHR as *const (),
            Self::QueuePresent => swapchain::vkQueuePresentKHR as *const (),
            Self::DestroySwapchain => swapchain::vkDestroySwapchainKHR as *const (),
            Self::QueueSubmit => device::vkQueueSubmit as *const (),
        };
        Some(unsafe { std::mem::transmute::<*const (), unsafe extern "system" fn()>(pfn) })
    }
}

/// Instance-scope resolver exported to the loader.
#[no_mangle]
pub unsafe extern "system" fn vkGetInstanceProcAddr(
    instance: vk::Instance,
    p_name: *const c_char,
) -> vk::PFN_vkVoidFunction {
    if instance == vk::Instance::null() || p_name.is_null() {
        return None;
    }
    let name = unsafe { CStr::from_ptr(p_name) }.to_str().ok()?;

    if name == INSTANCE_BOOTSTRAP {
        // Handshake: `instance` is the loader's wrap object, not a real
        // handle. Prime the forwarding table and hand back this resolver so
        // the chain discovers the layer.
        let wrap = instance.as_raw() as usize as *const BaseInstanceLayerObject;
        unsafe { init_instance_table(wrap) };
        return Some(unsafe {
            std::mem::transmute::<*const (), unsafe extern "system" fn()>(
                vkGetInstanceProcAddr as *const (),
            )
        });
    }

    if let Some(hook) = InstanceHook::from_name(name) {
        return hook.pointer();
    }

    let table = context().instance_tables.get(unsafe { handle_key(instance) });
    match table.get_instance_proc_addr {
        Some(next) => unsafe { next(instance, p_name) },
        None => None,
    }
}

/// Device-scope resolver exported to the loader.
#[no_mangle]
pub unsafe extern "system" fn vkGetDeviceProcAddr(
    device: vk::Device,
    p_name: *const c_char,
) -> vk::PFN_vkVoidFunction {
    if device == vk::Device::null() || p_name.is_null() {
        return None;
    }
    let name = unsafe { CStr::from_ptr(p_name) }.to_str().ok()?;

    if name == DEVICE_BOOTSTRAP {
        let wrap = device.as_raw() as usize as *const BaseDeviceLayerObject;
        unsafe { init_device_table(wrap) };
        return Some(unsafe {
            std::mem::transmute::<*const (), unsafe extern "system" fn()>(
                vkGetDeviceProcAddr as *const (),
            )
        });
    }

    if let Some(hook) = DeviceHook::from_name(name) {
        return hook.pointer();
    }

    let table = context().device_tables.get(unsafe { handle_key(device) });
    match table.get_device_proc_addr {
        Some(next) => unsafe { next(device, p_name) },
        None => None,
    }
}

/// One-time instance-table initialization for the object wrapped by `wrap`.
/// The loader may repeat the handshake; only the first priming counts.
unsafe fn init_instance_table(wrap: *const BaseInstanceLayerObject) {
    let wrap = unsafe { &*wrap };
    let key = unsafe { handle_key(wrap.base_object) };
    let ctx = context();
    if ctx.instance_tables.contains(key) {
        return;
    }
    let table =
        unsafe { InstanceTable::load(wrap.next_get_instance_proc_addr, wrap.next_object) };
    ctx.instance_tables.insert(key, table);
}

/// Device-scope counterpart of [`init_instance_table`].
unsafe fn init_device_table(wrap: *const BaseDeviceLayerObject) {
    let wrap = unsafe { &*wrap };
    let key = unsafe { handle_key(wrap.base_object) };
    let ctx = context();
    if ctx.device_tables.contains(key) {
        return;
    }
    let table = unsafe { DeviceTable::load(wrap.next_get_device_proc_addr, wrap.next_object) };
    ctx.device_tables.insert(key, table);
}
