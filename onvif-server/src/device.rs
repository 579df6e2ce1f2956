//! Virtual device model
//!
//! Describes the camera the bridge pretends to be. Built once at startup and
//! shared read-only (behind an `Arc`) by every request handler.

use std::collections::BTreeMap;

pub const DEFAULT_DEVICE_NAME: &str = "onvif_bridge_default";
pub const DEFAULT_DEVICE_SERIAL: &str = "00000000";

/// Identity and limits of the emulated camera.
///
/// All values are kept as text because they are echoed verbatim into SOAP
/// responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualDevice {
    pub name: String,
    pub serial: String,
    pub max_width: String,
    pub max_height: String,
    pub max_framerate: String,
}

impl VirtualDevice {
    /// Blank name or serial fall back to the defaults.
    pub fn new(
        name: &str,
        serial: &str,
        max_width: &str,
        max_height: &str,
        max_framerate: &str,
    ) -> Self {
        Self {
            name: non_blank_or(name, DEFAULT_DEVICE_NAME),
            serial: non_blank_or(serial, DEFAULT_DEVICE_SERIAL),
            max_width: max_width.to_string(),
            max_height: max_height.to_string(),
            max_framerate: max_framerate.to_string(),
        }
    }
}

impl Default for VirtualDevice {
    fn default() -> Self {
        Self::new("", "", "", "", "")
    }
}

fn non_blank_or(value: &str, default: &str) -> String {
    if value.trim().is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

/// Encoder settings advertised for one stream (profile).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamProfile {
    pub width: String,
    pub height: String,
    pub framerate: String,
    pub bitrate: String,
}

/// Immutable configuration snapshot consumed by the dispatcher.
#[derive(Debug, Clone, Default)]
pub struct DeviceModel {
    pub device: VirtualDevice,
    /// Profile token (= stream name) -> encoder settings
    pub streams: BTreeMap<String, StreamProfile>,
    /// Reported as FirmwareVersion in GetDeviceInformation
    pub firmware_version: String,
    /// Port used when synthesizing RTSP stream URIs
    pub rtsp_port: u16,
}

impl DeviceModel {
    pub fn new(
        device: VirtualDevice,
        streams: BTreeMap<String, StreamProfile>,
        firmware_version: &str,
        rtsp_port: u16,
    ) -> Self {
        Self {
            device,
            streams,
            firmware_version: firmware_version.to_string(),
            rtsp_port,
        }
    }

    /// Look up a profile by token.
    ///
    /// Unknown tokens yield an all-empty profile; responses built from it are
    /// still well-formed.
    pub fn profile(&self, token: &str) -> StreamProfile {
        self.streams.get(token).cloned().unwrap_or_default()
    }

    pub fn profile_tokens(&self) -> impl Iterator<Item = &str> {
        self.streams.keys().map(String::as_str)
    }
}
