//! Response parsing helpers
//!
//! Camera firmwares disagree on namespace prefixes, so everything here
//! matches on local element names only.

use quick_xml::events::Event;
use quick_xml::Reader;

/// Extract the trimmed text of the first non-empty element named `tag`
pub fn extract_xml_value(xml: &str, tag: &str) -> Option<String> {
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

/// Extract the XAddr of a capability section (e.g. `Media`) from a
/// GetCapabilities response
pub fn extract_capability_xaddr(xml: &str, capability: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    let mut depth_in_section: Option<usize> = None;
    let mut depth = 0usize;
    let mut reading = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                let local_name = e.local_name();
                let name = local_name.as_ref();
                if depth_in_section.is_none() && name == capability.as_bytes() {
                    depth_in_section = Some(depth);
                } else if depth_in_section.is_some() {
                    reading = name == b"XAddr";
                }
            }
            Ok(Event::Text(e)) if reading => {
                if let Ok(text) = e.unescape() {
                    let text = text.trim();
                    if !text.is_empty() {
                        return Some(text.to_string());
                    }
                }
            }
            Ok(Event::End(_)) => {
                reading = false;
                if depth_in_section == Some(depth) {
                    depth_in_section = None;
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => return None,
            Err(_) => return None,
            _ => {}
        }
    }
}

/// Extract the `token` attribute of every `Profiles` element, in document order
pub fn extract_profile_tokens(xml: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut reader = Reader::from_str(xml);

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() != b"Profiles" {
                    continue;
                }
                for attr in e.attributes().flatten() {
                    if attr.key.local_name().as_ref() == b"token" {
                        if let Ok(v) = attr.unescape_value() {
                            tokens.push(v.to_string());
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
    }

    tokens
}

/// Path component of an absolute URL, or `None` if it has no usable path
pub fn url_path(raw: &str) -> Option<String> {
    let parsed = url::Url::parse(raw).ok()?;
    let path = parsed.path();
    if path.is_empty() || path == "/" {
        None
    } else {
        Some(path.to_string())
    }
}
