use std::collections::BTreeMap;

use config_manager::BridgeConfig;
use onvif_server::{DeviceModel, StreamProfile, VirtualDevice};

/// Snapshot the configuration into the model served on `/onvif/`.
pub fn device_model(config: &BridgeConfig, firmware_version: &str) -> DeviceModel {
    let onvif = &config.onvif;

    let device = VirtualDevice::new(
        &onvif.device_name,
        &onvif.device_serial,
        &onvif.device_max_width,
        &onvif.device_max_height,
        &onvif.device_max_framerate,
    );

    let streams: BTreeMap<String, StreamProfile> = onvif
        .streams
        .iter()
        .map(|(name, stream)| {
            (
                name.clone(),
                StreamProfile {
                    width: stream.width.clone(),
                    height: stream.height.clone(),
                    framerate: stream.framerate.clone(),
                    bitrate: stream.bitrate.clone(),
                },
            )
        })
        .collect();

    DeviceModel::new(device, streams, firmware_version, config.rtsp_port)
}
