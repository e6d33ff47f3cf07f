//! Vulkan-agnostic plumbing for the VkLens layer: the dispatch registries,
//! the recoverable/fail-fast error split, and the layer configuration.

pub mod config;
pub mod error;
pub mod registry;
