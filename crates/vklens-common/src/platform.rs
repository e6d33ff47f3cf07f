/// Returns the platform's Vulkan driver/loader library name.
pub fn driver_library_name() -> &'static str {
    #[cfg(target_os = "windows")]
    { "vulkan-1.dll" }
    #[cfg(target_os = "linux")]
    { "libvulkan.so.1" }
    #[cfg(target_os = "macos")]
    { "libvulkan.dylib" }
    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    { "libvulkan.so" }
}

/// Returns the platform name string.
pub fn platform_name() -> &'static str {
    #[cfg(target_os = "windows")]
    { "windows" }
    #[cfg(target_os = "linux")]
    { "linux" }
    #[cfg(target_os = "macos")]
    { "macos" }
    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    { "unknown" }
}

/// Returns the default config file path based on platform conventions.
/// Search order:
/// 1. System-wide config: `%PROGRAMDATA%\VkLens\vklens.toml` (Windows) or
///    `/etc/vklens/vklens.toml` (Linux/macOS)
/// 2. Local fallback: `./vklens.toml`
pub fn default_config_path() -> String {
    #[cfg(windows)]
    {
        let programdata = std::env::var("PROGRAMDATA")
            .unwrap_or_else(|_| r"C:\ProgramData".to_string());
        let system_path = format!(r"{}\VkLens\vklens.toml", programdata);
        if std::path::Path::new(&system_path).exists() {
            return system_path;
        }
    }
    #[cfg(not(windows))]
    {
        let system_path = "/etc/vklens/vklens.toml";
        if std::path::Path::new(system_path).exists() {
            return system_path.to_string();
        }
    }
    "vklens.toml".to_string()
}
