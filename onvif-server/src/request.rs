//! SOAP request parsing
//!
//! Turns a raw request body into an [`Operation`] and pulls named
//! parameters (profile tokens etc.) out of it.

use quick_xml::events::Event;
use quick_xml::Reader;

/// Operations served by the virtual device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    // Device service, canned answers
    GetNetworkInterfaces,
    GetSystemDateAndTime,
    GetDiscoveryMode,
    GetDns,
    GetHostname,
    GetNetworkDefaultGateway,
    GetNetworkProtocols,
    GetNtp,
    GetScopes,
    // Device service
    GetCapabilities,
    GetServices,
    GetDeviceInformation,
    GetServiceCapabilities,
    SystemReboot,
    // Media service
    GetVideoSources,
    GetProfiles,
    GetProfile,
    GetVideoSourceConfiguration,
    GetStreamUri,
    GetSnapshotUri,
}

impl Operation {
    pub const ALL: [Operation; 20] = [
        Operation::GetNetworkInterfaces,
        Operation::GetSystemDateAndTime,
        Operation::GetDiscoveryMode,
        Operation::GetDns,
        Operation::GetHostname,
        Operation::GetNetworkDefaultGateway,
        Operation::GetNetworkProtocols,
        Operation::GetNtp,
        Operation::GetScopes,
        Operation::GetCapabilities,
        Operation::GetServices,
        Operation::GetDeviceInformation,
        Operation::GetServiceCapabilities,
        Operation::SystemReboot,
        Operation::GetVideoSources,
        Operation::GetProfiles,
        Operation::GetProfile,
        Operation::GetVideoSourceConfiguration,
        Operation::GetStreamUri,
        Operation::GetSnapshotUri,
    ];

    /// Map a SOAP action element name (without namespace prefix).
    pub fn from_action(action: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.action() == action)
    }

    /// SOAP action element name
    pub fn action(self) -> &'static str {
        match self {
            Operation::GetNetworkInterfaces => "GetNetworkInterfaces",
            Operation::GetSystemDateAndTime => "GetSystemDateAndTime",
            Operation::GetDiscoveryMode => "GetDiscoveryMode",
            Operation::GetDns => "GetDNS",
            Operation::GetHostname => "GetHostname",
            Operation::GetNetworkDefaultGateway => "GetNetworkDefaultGateway",
            Operation::GetNetworkProtocols => "GetNetworkProtocols",
            Operation::GetNtp => "GetNTP",
            Operation::GetScopes => "GetScopes",
            Operation::GetCapabilities => "GetCapabilities",
            Operation::GetServices => "GetServices",
            Operation::GetDeviceInformation => "GetDeviceInformation",
            Operation::GetServiceCapabilities => "GetServiceCapabilities",
            Operation::SystemReboot => "SystemReboot",
            Operation::GetVideoSources => "GetVideoSources",
            Operation::GetProfiles => "GetProfiles",
            Operation::GetProfile => "GetProfile",
            Operation::GetVideoSourceConfiguration => "GetVideoSourceConfiguration",
            Operation::GetStreamUri => "GetStreamUri",
            Operation::GetSnapshotUri => "GetSnapshotUri",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.action())
    }
}

/// A classified inbound call.
#[derive(Debug, Clone)]
pub struct OperationRequest<'a> {
    pub operation: Operation,
    pub body: &'a str,
    /// Value of the HTTP Host header, port included
    pub host: Option<&'a str>,
}

impl OperationRequest<'_> {
    /// Text of the first `tag` element in the body.
    pub fn param(&self, tag: &str) -> Option<String> {
        find_tag_value(self.body, tag)
    }
}

/// Extract the SOAP action: local name of the first element inside `Body`.
///
/// Returns `None` for bodies without a SOAP Body or with an empty one.
pub fn extract_action(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    let mut in_body = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let local_name = e.local_name();
                let name = String::from_utf8_lossy(local_name.as_ref()).to_string();

                if in_body {
                    return Some(name);
                }
                if name == "Body" {
                    in_body = true;
                }
            }
            Ok(Event::Empty(e)) => {
                if in_body {
                    let local_name = e.local_name();
                    return Some(String::from_utf8_lossy(local_name.as_ref()).to_string());
                }
            }
            Ok(Event::End(e)) => {
                if in_body && e.local_name().as_ref() == b"Body" {
                    return None;
                }
            }
            Ok(Event::Eof) => return None,
            Err(_) => return None,
            _ => {}
        }
    }
}

/// Find the trimmed text of the first non-empty element named `tag`
/// (namespace prefix ignored).
pub fn find_tag_value(xml: &str, tag: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    let mut capturing = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                capturing = e.local_name().as_ref() == tag.as_bytes();
            }
            Ok(Event::Text(e)) if capturing => {
                if let Ok(text) = e.unescape() {
                    let text = text.trim();
                    if !text.is_empty() {
                        return Some(text.to_string());
                    }
                }
            }
            Ok(Event::CData(e)) if capturing => {
                let text = String::from_utf8_lossy(&e).trim().to_string();
                if !text.is_empty() {
                    return Some(text);
                }
            }
            Ok(Event::End(_)) => capturing = false,
            Ok(Event::Eof) => return None,
            Err(_) => return None,
            _ => {}
        }
    }
}
