//! Dispatch keys, the loader handshake objects, and the forwarding tables.
//!
//! The loader writes its dispatch-table pointer into the first pointer-sized
//! slot of every dispatchable handle (VkInstance, VkPhysicalDevice, VkDevice,
//! VkQueue), so all objects belonging to one instance or device share that
//! value. The layer reads it once per call and uses it purely as a map key;
//! it is never dereferenced further.

use std::ffi::c_char;

use ash::vk;
use ash::vk::Handle;

use vklens_core::error::contract_violation;
use vklens_core::registry::DispatchKey;

/// Derive the dispatch key from a dispatchable handle.
///
/// # Safety
/// `handle` must be a live, non-null dispatchable handle whose first
/// pointer-sized bytes are readable.
pub unsafe fn handle_key<H: Handle>(handle: H) -> DispatchKey {
    DispatchKey(unsafe { *(handle.as_raw() as usize as *const usize) })
}

/// Handshake wrap the loader passes to the instance-scope resolver when it
/// requests the resolver's own name. Layout is fixed by the loader ABI.
#[repr(C)]
pub struct BaseInstanceLayerObject {
    /// The next layer's own resolver.
    pub next_get_instance_proc_addr: vk::PFN_vkGetInstanceProcAddr,
    /// The handle the application sees; keys this layer's state.
    pub base_object: vk::Instance,
    /// The handle the next layer expects in forwarded calls.
    pub next_object: vk::Instance,
}

/// Device-scope counterpart of [`BaseInstanceLayerObject`].
#[repr(C)]
pub struct BaseDeviceLayerObject {
    pub next_get_device_proc_addr: vk::PFN_vkGetDeviceProcAddr,
    pub base_object: vk::Device,
    pub next_object: vk::Device,
}

/// Resolve `$name` through the next layer's resolver and transmute it to the
/// typed PFN the surrounding struct field expects. A required entry point
/// the next layer does not provide breaks the handshake; nothing downstream
/// could work, so fail fast.
macro_rules! load_pfn {
    ($resolver:expr, $object:expr, $name:literal) => {
        match $resolver($object, concat!($name, "\0").as_ptr().cast::<c_char>()) {
            Some(pfn) => std::mem::transmute::<unsafe extern "system" fn(), _>(pfn),
            None => contract_violation(concat!("next layer does not provide ", $name)),
        }
    };
}

/// Instance-scope forwarding table, loaded once per instance during the
/// loader handshake.
pub struct InstanceTable {
    /// Next layer's resolver; `None` means nothing to fall through to.
    pub get_instance_proc_addr: Option<vk::PFN_vkGetInstanceProcAddr>,
    pub create_instance: vk::PFN_vkCreateInstance,
    pub destroy_instance: vk::PFN_vkDestroyInstance,
}

impl InstanceTable {
    /// Populate the table by querying the next layer's resolver.
    ///
    /// # Safety
    /// `resolver` and `next` must come from a loader handshake object.
    pub unsafe fn load(resolver: vk::PFN_vkGetInstanceProcAddr, next: vk::Instance) -> Self {
        unsafe {
            Self {
                get_instance_proc_addr: resolver(
                    next,
                    "vkGetInstanceProcAddr\0".as_ptr().cast::<c_char>(),
                )
                .map(|pfn| std::mem::transmute::<unsafe extern "system" fn(), _>(pfn)),
                create_instance: load_pfn!(resolver, next, "vkCreateInstance"),
                destroy_instance: load_pfn!(resolver, next, "vkDestroyInstance"),
            }
        }
    }
}

/// Device-scope forwarding table.
pub struct DeviceTable {
    pub get_device_proc_addr: Option<vk::PFN_vkGetDeviceProcAddr>,
    pub create_device: vk::PFN_vkCreateDevice,
    pub destroy_device: vk::PFN_vkDestroyDevice,
    pub queue_submit: vk::PFN_vkQueueSubmit,
}

impl DeviceTable {
    /// Populate the table by querying the next layer's resolver.
    ///
    /// # Safety
    /// `resolver` and `next` must come from a loader handshake object.
    pub unsafe fn load(resolver: vk::PFN_vkGetDeviceProcAddr, next: vk::Device) -> Self {
        unsafe {
            Self {
                get_device_proc_addr: resolver(
                    next,
                    "vkGetDeviceProcAddr\0".as_ptr().cast::<c_char>(),
                )
                .map(|pfn| std::mem::transmute::<unsafe extern "system" fn(), _>(pfn)),
                create_device: load_pfn!(resolver, next, "vkCreateDevice"),
                destroy_device: load_pfn!(resolver, next, "vkDestroyDevice"),
                queue_submit: load_pfn!(resolver, next, "vkQueueSubmit"),
            }
        }
    }

    /// Resolve a device-scope entry point through the next layer, failing
    /// fast if the resolver is absent or the name unknown. Used to capture
    /// the swapchain pfns at device creation.
    ///
    /// # Safety
    /// `device` must be the handle this table was loaded for.
    pub unsafe fn require(&self, device: vk::Device, name: &[u8]) -> unsafe extern "system" fn() {
        debug_assert_eq!(name.last(), Some(&0), "name must be NUL-terminated");
        let resolver = match self.get_device_proc_addr {
            Some(resolver) => resolver,
            None => contract_violation("next layer provides no device resolver"),
        };
        match unsafe { resolver(device, name.as_ptr().cast::<c_char>()) } {
            Some(pfn) => pfn,
            None => contract_violation(&format!(
                "next layer does not provide {}",
                String::from_utf8_lossy(&name[..name.len() - 1])
            )),
        }
    }
}
