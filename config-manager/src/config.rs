use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use crate::error::ConfigError;
use crate::paths;

pub const DEFAULT_LISTEN: &str = "0.0.0.0:1984";
pub const DEFAULT_RTSP_PORT: u16 = 8554;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// HTTP listen address for the ONVIF and API endpoints
    pub listen: String,
    /// Port advertised in generated RTSP URIs
    pub rtsp_port: u16,
    pub onvif: OnvifConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.to_string(),
            rtsp_port: DEFAULT_RTSP_PORT,
            onvif: OnvifConfig::default(),
        }
    }
}

/// Emulated camera description, the `[onvif]` table
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OnvifConfig {
    #[serde(deserialize_with = "string_or_number")]
    pub device_name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub device_serial: String,
    #[serde(deserialize_with = "string_or_number")]
    pub device_max_width: String,
    #[serde(deserialize_with = "string_or_number")]
    pub device_max_height: String,
    #[serde(deserialize_with = "string_or_number")]
    pub device_max_framerate: String,
    /// Advertised profiles, keyed by stream name
    pub streams: BTreeMap<String, StreamConfig>,
}

impl Default for OnvifConfig {
    fn default() -> Self {
        Self {
            device_name: String::new(),
            device_serial: String::new(),
            device_max_width: String::new(),
            device_max_height: String::new(),
            device_max_framerate: String::new(),
            streams: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    #[serde(deserialize_with = "string_or_number")]
    pub width: String,
    #[serde(deserialize_with = "string_or_number")]
    pub height: String,
    #[serde(deserialize_with = "string_or_number")]
    pub framerate: String,
    #[serde(deserialize_with = "string_or_number")]
    pub bitrate: String,
}

impl BridgeConfig {
    /// Load config from the default XDG location, falling back to defaults
    /// when no file exists there.
    pub fn load() -> Result<Self, ConfigError> {
        let path = paths::bridge_config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load config from specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.listen
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("listen address '{}'", self.listen)))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.listen_addr()?;
        if self.rtsp_port == 0 {
            return Err(ConfigError::Invalid("rtsp_port must be non-zero".to_string()));
        }
        if let Some(name) = self.onvif.streams.keys().find(|name| name.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!("blank stream name '{}'", name)));
        }
        Ok(())
    }
}

/// Accept `width = 1920` as well as `width = "1920"`; values are echoed
/// verbatim into SOAP responses.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Value {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Value::deserialize(deserializer)? {
        Value::Text(s) => s,
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
    })
}
