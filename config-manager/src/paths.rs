use std::path::PathBuf;

use crate::error::ConfigError;

/// Get XDG config directory for the bridge
/// Returns ~/.config/onvif-bridge or $XDG_CONFIG_HOME/onvif-bridge
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|p| p.join("onvif-bridge"))
        .ok_or(ConfigError::NoConfigDir)
}

/// Get default config file path
/// Returns ~/.config/onvif-bridge/bridge.toml
pub fn bridge_config_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("bridge.toml"))
}
