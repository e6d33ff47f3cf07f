//! Shared ambient pieces for the VkLens layer: logging setup, platform
//! conventions, and the dynamic driver loader.

pub mod driver;
pub mod logging;
pub mod platform;
