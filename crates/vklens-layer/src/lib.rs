//! VkLens Vulkan interception layer.
//!
//! This cdylib sits between an application and the next layer/driver in a
//! Vulkan layer chain. It intercepts a fixed set of entry points, tracks
//! per-swapchain presentable-image shadow state, and forwards every call to
//! the next layer, exposing a single hook point for inspecting frame content
//! before presentation. The loader discovers the layer through the exported
//! `vkGetInstanceProcAddr` / `vkGetDeviceProcAddr` resolvers.

pub mod context;
pub mod device;
pub mod dispatch;
pub mod instance;
pub mod proc_address;
pub mod swapchain;
