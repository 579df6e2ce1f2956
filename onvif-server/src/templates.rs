//! ONVIF SOAP XML response templates
//!
//! All XML templates are centralized here to keep the dispatcher clean.
//! Every function is pure: same inputs, same bytes.

use chrono::{DateTime, Datelike, Timelike, Utc};
use quick_xml::escape::escape;

use crate::device::{DeviceModel, StreamProfile, VirtualDevice};
use crate::request::Operation;

const ENVELOPE_HEAD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope" xmlns:tt="http://www.onvif.org/ver10/schema" xmlns:tds="http://www.onvif.org/ver10/device/wsdl" xmlns:trt="http://www.onvif.org/ver10/media/wsdl">
<s:Body>
"#;

const ENVELOPE_TAIL: &str = r#"
</s:Body>
</s:Envelope>"#;

pub const REBOOT_MESSAGE: &str = "system reboot in 1 second...";

/// Escape a string for safe inclusion in XML content/attributes.
fn xml_escape(s: &str) -> String {
    escape(s).to_string()
}

/// SOAP envelope with the device/media/schema namespaces declared.
///
/// Body fragments are appended in order; `into_string` closes the document.
pub struct Envelope {
    buf: String,
}

impl Envelope {
    pub fn new() -> Self {
        Self {
            buf: String::from(ENVELOPE_HEAD),
        }
    }

    pub fn append(&mut self, fragment: &str) -> &mut Self {
        self.buf.push_str(fragment);
        self
    }

    pub fn into_string(mut self) -> String {
        self.buf.push_str(ENVELOPE_TAIL);
        self.buf
    }

    /// Envelope holding a single fragment
    pub fn wrap(fragment: &str) -> String {
        let mut e = Self::new();
        e.append(fragment);
        e.into_string()
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new()
    }
}

/// Canned body fragment for operations whose answer never changes.
fn canned_fragment(operation: Operation) -> Option<&'static str> {
    let fragment = match operation {
        Operation::GetNetworkInterfaces => "<tds:GetNetworkInterfacesResponse />",
        Operation::GetDiscoveryMode => {
            "<tds:GetDiscoveryModeResponse><tds:DiscoveryMode>Discoverable</tds:DiscoveryMode></tds:GetDiscoveryModeResponse>"
        }
        Operation::GetDns => "<tds:GetDNSResponse><tds:DNSInformation /></tds:GetDNSResponse>",
        Operation::GetHostname => {
            "<tds:GetHostnameResponse><tds:HostnameInformation /></tds:GetHostnameResponse>"
        }
        Operation::GetNetworkDefaultGateway => {
            "<tds:GetNetworkDefaultGatewayResponse><tds:NetworkGateway /></tds:GetNetworkDefaultGatewayResponse>"
        }
        Operation::GetNetworkProtocols => "<tds:GetNetworkProtocolsResponse />",
        Operation::GetNtp => "<tds:GetNTPResponse><tds:NTPInformation /></tds:GetNTPResponse>",
        Operation::GetScopes => {
            r#"<tds:GetScopesResponse>
	<tds:Scopes><tt:ScopeDef>Fixed</tt:ScopeDef><tt:ScopeItem>onvif://www.onvif.org/name/onvif-bridge</tt:ScopeItem></tds:Scopes>
	<tds:Scopes><tt:ScopeDef>Fixed</tt:ScopeDef><tt:ScopeItem>onvif://www.onvif.org/Profile/Streaming</tt:ScopeItem></tds:Scopes>
	<tds:Scopes><tt:ScopeDef>Fixed</tt:ScopeDef><tt:ScopeItem>onvif://www.onvif.org/type/Network_Video_Transmitter</tt:ScopeItem></tds:Scopes>
</tds:GetScopesResponse>"#
        }
        Operation::SystemReboot => {
            "<tds:SystemRebootResponse><tds:Message>system reboot in 1 second...</tds:Message></tds:SystemRebootResponse>"
        }
        _ => return None,
    };
    Some(fragment)
}

/// Full envelope for a canned operation, `None` if the operation needs
/// parameters.
pub fn static_response(operation: Operation) -> Option<String> {
    canned_fragment(operation).map(Envelope::wrap)
}

/// GetSystemDateAndTime response for the given instant
pub fn get_system_date_and_time(now: DateTime<Utc>) -> String {
    Envelope::wrap(&format!(
        r#"<tds:GetSystemDateAndTimeResponse>
	<tds:SystemDateAndTime>
		<tt:DateTimeType>NTP</tt:DateTimeType>
		<tt:DaylightSavings>false</tt:DaylightSavings>
		<tt:TimeZone>
			<tt:TZ>GMT</tt:TZ>
		</tt:TimeZone>
		<tt:UTCDateTime>
			<tt:Time><tt:Hour>{}</tt:Hour><tt:Minute>{}</tt:Minute><tt:Second>{}</tt:Second></tt:Time>
			<tt:Date><tt:Year>{}</tt:Year><tt:Month>{}</tt:Month><tt:Day>{}</tt:Day></tt:Date>
		</tt:UTCDateTime>
	</tds:SystemDateAndTime>
</tds:GetSystemDateAndTimeResponse>"#,
        now.hour(),
        now.minute(),
        now.second(),
        now.year(),
        now.month(),
        now.day()
    ))
}

/// GetCapabilities response; the Media XAddr is how clients find us.
pub fn get_capabilities(host: &str) -> String {
    let host = xml_escape(host);
    Envelope::wrap(&format!(
        r#"<tds:GetCapabilitiesResponse>
	<tds:Capabilities>
		<tt:Device>
			<tt:XAddr>http://{host}/onvif/device_service</tt:XAddr>
		</tt:Device>
		<tt:Media>
			<tt:XAddr>http://{host}/onvif/media_service</tt:XAddr>
			<tt:StreamingCapabilities>
				<tt:RTPMulticast>false</tt:RTPMulticast>
				<tt:RTP_TCP>false</tt:RTP_TCP>
				<tt:RTP_RTSP_TCP>true</tt:RTP_RTSP_TCP>
			</tt:StreamingCapabilities>
		</tt:Media>
	</tds:Capabilities>
</tds:GetCapabilitiesResponse>"#
    ))
}

/// GetServices response
pub fn get_services(host: &str) -> String {
    let host = xml_escape(host);
    Envelope::wrap(&format!(
        r#"<tds:GetServicesResponse>
	<tds:Service>
		<tds:Namespace>http://www.onvif.org/ver10/device/wsdl</tds:Namespace>
		<tds:XAddr>http://{host}/onvif/device_service</tds:XAddr>
		<tds:Version><tt:Major>2</tt:Major><tt:Minor>5</tt:Minor></tds:Version>
	</tds:Service>
	<tds:Service>
		<tds:Namespace>http://www.onvif.org/ver10/media/wsdl</tds:Namespace>
		<tds:XAddr>http://{host}/onvif/media_service</tds:XAddr>
		<tds:Version><tt:Major>2</tt:Major><tt:Minor>5</tt:Minor></tds:Version>
	</tds:Service>
</tds:GetServicesResponse>"#
    ))
}

/// GetDeviceInformation response
pub fn get_device_information(
    manufacturer: &str,
    model: &str,
    firmware: &str,
    serial: &str,
) -> String {
    Envelope::wrap(&format!(
        r#"<tds:GetDeviceInformationResponse>
	<tds:Manufacturer>{}</tds:Manufacturer>
	<tds:Model>{}</tds:Model>
	<tds:FirmwareVersion>{}</tds:FirmwareVersion>
	<tds:SerialNumber>{}</tds:SerialNumber>
	<tds:HardwareId>1.00</tds:HardwareId>
</tds:GetDeviceInformationResponse>"#,
        xml_escape(manufacturer),
        xml_escape(model),
        xml_escape(firmware),
        xml_escape(serial)
    ))
}

/// Media GetServiceCapabilities response
pub fn get_media_service_capabilities() -> String {
    Envelope::wrap(
        r#"<trt:GetServiceCapabilitiesResponse>
	<trt:Capabilities SnapshotUri="true" Rotation="false" VideoSourceMode="false" OSD="false" TemporaryOSDText="false" EXICompression="false">
		<trt:StreamingCapabilities RTPMulticast="false" RTP_TCP="false" RTP_RTSP_TCP="true" NonAggregateControl="false" NoRTSPStreaming="false" />
	</trt:Capabilities>
</trt:GetServiceCapabilitiesResponse>"#,
    )
}

/// GetVideoSources response: a single source at the device's maximums
pub fn get_video_sources(device: &VirtualDevice) -> String {
    Envelope::wrap(&format!(
        r#"<trt:GetVideoSourcesResponse>
<trt:VideoSources token="{}">
	<tt:Framerate>{}</tt:Framerate>
	<tt:Resolution><tt:Width>{}</tt:Width><tt:Height>{}</tt:Height></tt:Resolution>
</trt:VideoSources>
</trt:GetVideoSourcesResponse>"#,
        xml_escape(&device.name),
        xml_escape(&device.max_framerate),
        xml_escape(&device.max_width),
        xml_escape(&device.max_height)
    ))
}

/// One profile block. `tag` is `Profiles` inside GetProfiles and `Profile`
/// inside GetProfile.
fn profile_block(tag: &str, token: &str, profile: &StreamProfile, device: &VirtualDevice) -> String {
    let token = xml_escape(token);
    let source = xml_escape(&device.name);
    let width = xml_escape(&profile.width);
    let height = xml_escape(&profile.height);
    // RateControl stays even when both limits are blank: UniFi Protect
    // rejects profiles without it.
    format!(
        r#"<trt:{tag} token="{token}" fixed="true">
	<tt:Name>{token}</tt:Name>
	<tt:VideoSourceConfiguration token="{source}">
		<tt:Name>VSC</tt:Name>
		<tt:SourceToken>{source}</tt:SourceToken>
		<tt:Bounds x="0" y="0" width="{width}" height="{height}"></tt:Bounds>
	</tt:VideoSourceConfiguration>
	<tt:VideoEncoderConfiguration token="{token}">
		<tt:Name>VEC</tt:Name>
		<tt:Encoding>H264</tt:Encoding>
		<tt:Resolution><tt:Width>{width}</tt:Width><tt:Height>{height}</tt:Height></tt:Resolution>
		<tt:RateControl>
			<tt:FrameRateLimit>{framerate}</tt:FrameRateLimit>
			<tt:BitrateLimit>{bitrate}</tt:BitrateLimit>
		</tt:RateControl>
	</tt:VideoEncoderConfiguration>
</trt:{tag}>
"#,
        framerate = xml_escape(&profile.framerate),
        bitrate = xml_escape(&profile.bitrate),
    )
}

/// GetProfiles response, one block per configured stream
pub fn get_profiles(model: &DeviceModel) -> String {
    let mut e = Envelope::new();
    e.append("<trt:GetProfilesResponse>\n");
    for (token, profile) in &model.streams {
        e.append(&profile_block("Profiles", token, profile, &model.device));
    }
    e.append("</trt:GetProfilesResponse>");
    e.into_string()
}

/// GetProfile response for a single token
pub fn get_profile(model: &DeviceModel, token: &str) -> String {
    let mut e = Envelope::new();
    e.append("<trt:GetProfileResponse>\n")
        .append(&profile_block("Profile", token, &model.profile(token), &model.device))
        .append("</trt:GetProfileResponse>");
    e.into_string()
}

/// GetVideoSourceConfiguration response
pub fn get_video_source_configuration(device: &VirtualDevice, token: &str) -> String {
    let token = xml_escape(token);
    Envelope::wrap(&format!(
        r#"<trt:GetVideoSourceConfigurationResponse>
	<trt:Configuration token="{token}">
		<tt:Name>VSC</tt:Name>
		<tt:SourceToken>{token}</tt:SourceToken>
		<tt:Bounds x="0" y="0" width="{}" height="{}"></tt:Bounds>
	</trt:Configuration>
</trt:GetVideoSourceConfigurationResponse>"#,
        xml_escape(&device.max_width),
        xml_escape(&device.max_height)
    ))
}

/// GetStreamUri response
pub fn get_stream_uri(uri: &str) -> String {
    Envelope::wrap(&format!(
        r#"<trt:GetStreamUriResponse>
	<trt:MediaUri>
		<tt:Uri>{}</tt:Uri>
		<tt:InvalidAfterConnect>false</tt:InvalidAfterConnect>
		<tt:InvalidAfterReboot>false</tt:InvalidAfterReboot>
		<tt:Timeout>PT0S</tt:Timeout>
	</trt:MediaUri>
</trt:GetStreamUriResponse>"#,
        xml_escape(uri)
    ))
}

/// GetSnapshotUri response
pub fn get_snapshot_uri(uri: &str) -> String {
    Envelope::wrap(&format!(
        r#"<trt:GetSnapshotUriResponse>
	<trt:MediaUri>
		<tt:Uri>{}</tt:Uri>
		<tt:InvalidAfterConnect>false</tt:InvalidAfterConnect>
		<tt:InvalidAfterReboot>false</tt:InvalidAfterReboot>
		<tt:Timeout>PT0S</tt:Timeout>
	</trt:MediaUri>
</trt:GetSnapshotUriResponse>"#,
        xml_escape(uri)
    ))
}

/// Generic SOAP fault response
pub fn fault(code: &str, reason: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope" xmlns:ter="http://www.onvif.org/ver10/error">
  <s:Body>
    <s:Fault>
      <s:Code>
        <s:Value>s:Sender</s:Value>
        <s:Subcode>
          <s:Value>{}</s:Value>
        </s:Subcode>
      </s:Code>
      <s:Reason>
        <s:Text xml:lang="en">{}</s:Text>
      </s:Reason>
    </s:Fault>
  </s:Body>
</s:Envelope>"#,
        xml_escape(code),
        xml_escape(reason)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::find_tag_value;
    use chrono::TimeZone;
    use std::collections::BTreeMap;

    fn profile(w: &str, h: &str, fps: &str, kbps: &str) -> StreamProfile {
        StreamProfile {
            width: w.to_string(),
            height: h.to_string(),
            framerate: fps.to_string(),
            bitrate: kbps.to_string(),
        }
    }

    #[test]
    fn test_envelope_wraps_fragment() {
        let xml = Envelope::wrap("<tds:Foo/>");
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains("<s:Body>\n<tds:Foo/>\n</s:Body>"));
        assert!(xml.ends_with("</s:Envelope>"));
    }

    #[test]
    fn test_static_response_only_for_canned_operations() {
        assert!(static_response(Operation::GetScopes).is_some());
        assert!(static_response(Operation::SystemReboot)
            .expect("reboot ack")
            .contains(REBOOT_MESSAGE));
        assert!(static_response(Operation::GetProfiles).is_none());
        assert!(static_response(Operation::GetStreamUri).is_none());
    }

    #[test]
    fn test_system_date_and_time() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 17, 4, 5).unwrap();
        let xml = get_system_date_and_time(now);
        assert!(xml.contains("<tt:Hour>17</tt:Hour><tt:Minute>4</tt:Minute><tt:Second>5</tt:Second>"));
        assert!(xml.contains("<tt:Year>2024</tt:Year><tt:Month>3</tt:Month><tt:Day>9</tt:Day>"));
    }

    #[test]
    fn test_capabilities_advertise_host() {
        let xml = get_capabilities("10.0.0.5:1984");
        assert!(xml.contains("<tt:XAddr>http://10.0.0.5:1984/onvif/media_service</tt:XAddr>"));
        assert!(xml.contains("<tt:XAddr>http://10.0.0.5:1984/onvif/device_service</tt:XAddr>"));
    }

    #[test]
    fn test_device_information_escapes_values() {
        let xml = get_device_information("", "Cam <1> & co", "1.2.3", "00000000");
        assert!(xml.contains("<tds:Manufacturer></tds:Manufacturer>"));
        assert!(xml.contains("<tds:Model>Cam &lt;1&gt; &amp; co</tds:Model>"));
        assert_eq!(find_tag_value(&xml, "Model").as_deref(), Some("Cam <1> & co"));
        assert_eq!(find_tag_value(&xml, "SerialNumber").as_deref(), Some("00000000"));
    }

    #[test]
    fn test_profiles_keep_empty_rate_control() {
        let mut streams = BTreeMap::new();
        streams.insert("blank".to_string(), StreamProfile::default());
        let model = DeviceModel::new(VirtualDevice::default(), streams, "1.0", 8554);

        let xml = get_profiles(&model);
        assert!(xml.contains(
            "<tt:RateControl>\n\t\t\t<tt:FrameRateLimit></tt:FrameRateLimit>\n\t\t\t<tt:BitrateLimit></tt:BitrateLimit>\n\t\t</tt:RateControl>"
        ));
    }

    #[test]
    fn test_profile_block_fields() {
        let mut streams = BTreeMap::new();
        streams.insert("main".to_string(), profile("1920", "1080", "30", "4096"));
        let device = VirtualDevice::new("garage", "", "1920", "1080", "30");
        let model = DeviceModel::new(device, streams, "1.0", 8554);

        let xml = get_profile(&model, "main");
        assert!(xml.contains(r#"<trt:Profile token="main" fixed="true">"#));
        assert!(xml.contains(r#"<tt:VideoSourceConfiguration token="garage">"#));
        assert!(xml.contains("<tt:Encoding>H264</tt:Encoding>"));
        assert!(xml.contains("<tt:Width>1920</tt:Width><tt:Height>1080</tt:Height>"));
        assert!(xml.contains("<tt:FrameRateLimit>30</tt:FrameRateLimit>"));
        assert!(xml.contains("<tt:BitrateLimit>4096</tt:BitrateLimit>"));
    }

    #[test]
    fn test_unknown_profile_still_well_formed() {
        let model = DeviceModel::default();
        let xml = get_profile(&model, "nope");
        assert!(xml.contains(r#"<trt:Profile token="nope" fixed="true">"#));
        assert!(xml.contains(r#"width="" height="""#));
        assert!(xml.contains("<tt:RateControl>"));
    }

    #[test]
    fn test_video_sources_use_device_limits() {
        let device = VirtualDevice::new("cam", "1", "2560", "1440", "25");
        let xml = get_video_sources(&device);
        assert!(xml.contains(r#"<trt:VideoSources token="cam">"#));
        assert!(xml.contains("<tt:Framerate>25</tt:Framerate>"));
        assert!(xml.contains("<tt:Width>2560</tt:Width><tt:Height>1440</tt:Height>"));
    }

    #[test]
    fn test_fault_escapes_reason() {
        let xml = fault("ter:ActionNotSupported", "<bad>");
        assert!(xml.contains("<s:Value>ter:ActionNotSupported</s:Value>"));
        assert!(xml.contains("&lt;bad&gt;"));
    }
}
