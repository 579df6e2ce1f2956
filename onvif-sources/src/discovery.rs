//! Source listing for `GET /api/onvif`
//!
//! Without a target this lists cameras found by WS-Discovery as `onvif://`
//! templates. With a target it lists one source per media profile of that
//! camera, plus a snapshot source when the camera supports it.

use onvif_client::PATH_DEVICE;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::backend::OnvifBackend;
use crate::error::SourceError;

/// Placeholder credentials the user is expected to edit
const TEMPLATE_USERINFO: &str = "user:pass";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub name: String,
    pub url: String,
}

/// List every camera answering a WS-Discovery probe.
pub fn discover_sources(backend: &dyn OnvifBackend) -> Result<Vec<SourceDescriptor>, SourceError> {
    let candidates = backend.discover().map_err(SourceError::Discovery)?;
    Ok(candidates
        .iter()
        .filter_map(|raw| candidate_to_source(raw))
        .collect())
}

/// Rewrite one discovered device service URL into an `onvif://` template.
///
/// Only plain `http` candidates are accepted; anything else is logged and
/// dropped.
pub fn candidate_to_source(raw: &str) -> Option<SourceDescriptor> {
    let parsed = match Url::parse(raw) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!("ONVIF discovery: broken url {} ({})", raw, e);
            return None;
        }
    };

    if parsed.scheme() != "http" {
        tracing::warn!("ONVIF discovery: unsupported url {}", raw);
        return None;
    }

    let Some(host) = parsed.host_str() else {
        tracing::warn!("ONVIF discovery: broken url {} (no host)", raw);
        return None;
    };
    let host = match parsed.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };

    let path = match parsed.path() {
        "/" => "",
        path if path == PATH_DEVICE => "",
        path => path,
    };

    let mut url = format!("onvif://{}@{}{}", TEMPLATE_USERINFO, host, path);
    if let Some(query) = parsed.query() {
        url.push('?');
        url.push_str(query);
    }

    Some(SourceDescriptor { name: host, url })
}

/// List the profiles of the camera at `src`.
pub fn describe_device(
    backend: &dyn OnvifBackend,
    src: &str,
) -> Result<Vec<SourceDescriptor>, SourceError> {
    let mut client = backend.connect(src).map_err(SourceError::ClientConnect)?;

    if tracing::enabled!(tracing::Level::TRACE) {
        if let Ok(profiles) = client.profiles_dump() {
            tracing::trace!("ONVIF src={} profiles:\n{}", src, profiles);
        }
    }

    let name = client.get_name().map_err(SourceError::ProfileQuery)?;
    let tokens = client
        .get_profiles_tokens()
        .map_err(SourceError::ProfileQuery)?;

    let mut sources: Vec<SourceDescriptor> = tokens
        .iter()
        .enumerate()
        .map(|(i, token)| SourceDescriptor {
            name: format!("{} stream{}", name, i),
            url: format!("{}?subtype={}", src, token),
        })
        .collect();

    if let Some(first) = tokens.first() {
        if client.has_snapshots() {
            sources.push(SourceDescriptor {
                name: format!("{} snapshot", name),
                url: format!("{}?subtype={}&snapshot", src, first),
            });
        }
    }

    Ok(sources)
}
