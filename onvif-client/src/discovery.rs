//! WS-Discovery probe for ONVIF devices on the local network

use std::io::ErrorKind;
use std::net::UdpSocket;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use crate::xml::extract_xml_value;

/// WS-Discovery multicast group
pub const MULTICAST_ADDR: &str = "239.255.255.250:3702";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// Probe the network and collect device service URLs.
///
/// Returns the first XAddr of every ProbeMatch received before `timeout`
/// elapses, without duplicates, in arrival order.
pub fn discover_streaming_urls(timeout: Duration) -> Result<Vec<String>> {
    let socket = UdpSocket::bind("0.0.0.0:0").context("Failed to bind discovery socket")?;

    let probe = probe_message(&uuid::Uuid::new_v4().to_string());
    socket
        .send_to(probe.as_bytes(), MULTICAST_ADDR)
        .context("Failed to send WS-Discovery probe")?;

    let deadline = Instant::now() + timeout;
    let mut urls: Vec<String> = Vec::new();
    let mut buffer = [0u8; 8192];

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        socket.set_read_timeout(Some(remaining))?;

        match socket.recv_from(&mut buffer) {
            Ok((size, addr)) => {
                let response = String::from_utf8_lossy(&buffer[..size]);
                tracing::trace!("WS-Discovery response from {}:\n{}", addr, response);

                if let Some(url) = parse_probe_match(&response) {
                    if !urls.contains(&url) {
                        urls.push(url);
                    }
                }
            }
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => break,
            Err(e) => return Err(e).context("WS-Discovery receive failed"),
        }
    }

    tracing::debug!("WS-Discovery found {} device(s)", urls.len());
    Ok(urls)
}

/// First address listed in a ProbeMatch's XAddrs
pub fn parse_probe_match(xml: &str) -> Option<String> {
    let xaddrs = extract_xml_value(xml, "XAddrs")?;
    xaddrs.split_whitespace().next().map(str::to_string)
}

fn probe_message(message_id: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope"
            xmlns:a="http://schemas.xmlsoap.org/ws/2004/08/addressing">
    <s:Header>
        <a:Action s:mustUnderstand="1">http://schemas.xmlsoap.org/ws/2005/04/discovery/Probe</a:Action>
        <a:MessageID>uuid:{}</a:MessageID>
        <a:ReplyTo><a:Address>http://schemas.xmlsoap.org/ws/2004/08/addressing/role/anonymous</a:Address></a:ReplyTo>
        <a:To s:mustUnderstand="1">urn:schemas-xmlsoap-org:ws:2005:04:discovery</a:To>
    </s:Header>
    <s:Body>
        <Probe xmlns="http://schemas.xmlsoap.org/ws/2005/04/discovery">
            <d:Types xmlns:d="http://schemas.xmlsoap.org/ws/2005/04/discovery" xmlns:dp0="http://www.onvif.org/ver10/device/wsdl">dp0:Device</d:Types>
        </Probe>
    </s:Body>
</s:Envelope>"#,
        message_id
    )
}
