//! Instance lifecycle hooks.

use ash::vk;
use tracing::info;

use crate::context::context;
use crate::dispatch::handle_key;

/// Per-instance state record. Instances carry no shadow state of their own;
/// the record exists so creation/destruction bracket the registry lifecycle
/// the same way device records do.
pub struct InstanceRecord {
    pub instance: vk::Instance,
}

#[no_mangle]
pub unsafe extern "system" fn vkCreateInstance(
    p_create_info: *const vk::InstanceCreateInfo<'_>,
    p_allocator: *const vk::AllocationCallbacks<'_>,
    p_instance: *mut vk::Instance,
) -> vk::Result {
    if p_create_info.is_null() || p_instance.is_null() {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }

    let ctx = context();

    // The loader pre-seeds *p_instance with the handle the handshake primed
    // the forwarding table under, and keeps the dispatch slot stable across
    // the forwarded call.
    let table = ctx.instance_tables.get(unsafe { handle_key(*p_instance) });

    let result = unsafe { (table.create_instance)(p_create_info, p_allocator, p_instance) };
    if result != vk::Result::SUCCESS {
        return result;
    }

    let instance = unsafe { *p_instance };
    ctx.instance_records
        .insert(unsafe { handle_key(instance) }, InstanceRecord { instance });
    ctx.ensure_process_init();

    info!("instance created");
    result
}

#[no_mangle]
pub unsafe extern "system" fn vkDestroyInstance(
    instance: vk::Instance,
    p_allocator: *const vk::AllocationCallbacks<'_>,
) {
    if instance == vk::Instance::null() {
        return;
    }

    let ctx = context();
    let key = unsafe { handle_key(instance) };
    let table = ctx.instance_tables.get(key);

    // Record cleanup is structural only, then forward, then erase; the key
    // must be derived before the handle dies.
    unsafe { (table.destroy_instance)(instance, p_allocator) };

    let _ = ctx.instance_records.remove(key);
    let _ = ctx.instance_tables.remove(key);

    info!("instance destroyed");
}
