//! Configuration for the ONVIF bridge.
//!
//! The file is TOML; every field has a default so an empty (or absent)
//! file yields a usable configuration.

mod config;
mod error;
mod paths;

pub use config::{BridgeConfig, OnvifConfig, StreamConfig, DEFAULT_LISTEN, DEFAULT_RTSP_PORT};
pub use error::ConfigError;
pub use paths::{bridge_config_path, config_dir};
