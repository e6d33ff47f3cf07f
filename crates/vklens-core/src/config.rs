use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Layer configuration, loaded from vklens.toml.
///
/// Everything has a default so the layer works without any file present;
/// VKLENS_LOG in the environment overrides `log_filter`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LensConfig {
    #[serde(default)]
    pub layer: LayerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerConfig {
    /// Default tracing filter when VKLENS_LOG is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// Emit a trace event per presented swapchain at the frame hook
    #[serde(default)]
    pub trace_present: bool,
}

impl Default for LensConfig {
    fn default() -> Self {
        Self {
            layer: LayerConfig::default(),
        }
    }
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            trace_present: false,
        }
    }
}

impl LensConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)?;
        let config: LensConfig =
            toml::from_str(&content).map_err(|e| CoreError::ConfigError(e.to_string()))?;
        Ok(config)
    }

    /// Load configuration from file if it exists, otherwise return defaults.
    pub fn load_or_default(path: &str) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Load from the platform-conventional location.
    pub fn load_default() -> Self {
        Self::load_or_default(&vklens_common::platform::default_config_path())
    }
}

fn default_log_filter() -> String {
    "info".to_string()
}
