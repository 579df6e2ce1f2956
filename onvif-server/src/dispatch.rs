//! Device service dispatcher
//!
//! Classifies a SOAP body into an [`Operation`], builds the reply from the
//! device model and reports any side effect the caller must run once the
//! reply is on its way.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

use crate::device::DeviceModel;
use crate::error::OnvifError;
use crate::request::{extract_action, Operation, OperationRequest};
use crate::templates;

/// Delay between acknowledging SystemReboot and exiting
pub const REBOOT_DELAY: Duration = Duration::from_secs(1);

/// Side effect to run after the reply has been handed to the HTTP layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostAction {
    None,
    Terminate { after: Duration },
}

/// Response body plus the action to run after sending it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapReply {
    pub body: String,
    pub action: PostAction,
}

impl SoapReply {
    fn plain(body: String) -> Self {
        Self {
            body,
            action: PostAction::None,
        }
    }
}

/// Handle one device/media service request against the current clock.
pub fn dispatch(model: &DeviceModel, body: &str, host: Option<&str>) -> Result<SoapReply, OnvifError> {
    dispatch_at(model, body, host, Utc::now())
}

/// Same as [`dispatch`] with an explicit clock for GetSystemDateAndTime.
pub fn dispatch_at(
    model: &DeviceModel,
    body: &str,
    host: Option<&str>,
    now: DateTime<Utc>,
) -> Result<SoapReply, OnvifError> {
    let request = classify(body, host)?;
    respond(model, &request, now)
}

/// Resolve the operation named by the body.
pub fn classify<'a>(body: &'a str, host: Option<&'a str>) -> Result<OperationRequest<'a>, OnvifError> {
    let action = extract_action(body).ok_or(OnvifError::MalformedRequest("no SOAP action in body"))?;

    match Operation::from_action(&action) {
        Some(operation) => Ok(OperationRequest {
            operation,
            body,
            host,
        }),
        None => {
            tracing::debug!("Unsupported ONVIF request {}:\n{}", action, body);
            Err(OnvifError::UnsupportedOperation(action))
        }
    }
}

fn respond(
    model: &DeviceModel,
    request: &OperationRequest<'_>,
    now: DateTime<Utc>,
) -> Result<SoapReply, OnvifError> {
    let body = match request.operation {
        op @ (Operation::GetNetworkInterfaces
        | Operation::GetDiscoveryMode
        | Operation::GetDns
        | Operation::GetHostname
        | Operation::GetNetworkDefaultGateway
        | Operation::GetNetworkProtocols
        | Operation::GetNtp
        | Operation::GetScopes) => canned(op),

        Operation::GetSystemDateAndTime => templates::get_system_date_and_time(now),

        Operation::GetCapabilities => templates::get_capabilities(require_host(request)?),

        Operation::GetServices => templates::get_services(require_host(request)?),

        // SerialNumber is what Home Assistant keys the device on
        Operation::GetDeviceInformation => templates::get_device_information(
            "",
            &model.device.name,
            &model.firmware_version,
            &model.device.serial,
        ),

        Operation::GetServiceCapabilities => templates::get_media_service_capabilities(),

        Operation::SystemReboot => {
            return Ok(SoapReply {
                body: canned(Operation::SystemReboot),
                action: PostAction::Terminate { after: REBOOT_DELAY },
            });
        }

        Operation::GetVideoSources => templates::get_video_sources(&model.device),

        Operation::GetProfiles => templates::get_profiles(model),

        Operation::GetProfile => {
            let token = request.param("ProfileToken").unwrap_or_default();
            templates::get_profile(model, &token)
        }

        Operation::GetVideoSourceConfiguration => {
            let token = request.param("ConfigurationToken").unwrap_or_default();
            templates::get_video_source_configuration(&model.device, &token)
        }

        Operation::GetStreamUri => {
            let host = strip_port(require_host(request)?);
            let token = request.param("ProfileToken").unwrap_or_default();
            let uri = format!("rtsp://{}:{}/{}", host, model.rtsp_port, token);
            templates::get_stream_uri(&uri)
        }

        Operation::GetSnapshotUri => {
            let host = require_host(request)?;
            let token = request.param("ProfileToken").unwrap_or_default();
            let uri = format!("http://{}/api/frame.jpeg?src={}", host, token);
            templates::get_snapshot_uri(&uri)
        }
    };

    Ok(SoapReply::plain(body))
}

fn canned(operation: Operation) -> String {
    // Every operation routed here has a canned body
    templates::static_response(operation).unwrap_or_else(|| templates::Envelope::wrap(""))
}

fn require_host<'a>(request: &OperationRequest<'a>) -> Result<&'a str, OnvifError> {
    request
        .host
        .filter(|h| !h.is_empty())
        .ok_or(OnvifError::MalformedRequest("missing Host header"))
}

/// Drop the `:port` suffix of a Host header value, keeping IPv6 brackets.
pub fn strip_port(host: &str) -> &str {
    if let Some(rest) = host.strip_prefix('[') {
        return match rest.find(']') {
            Some(end) => &host[..end + 2],
            None => host,
        };
    }
    match host.rsplit_once(':') {
        Some((name, port)) if !name.contains(':') && port.bytes().all(|b| b.is_ascii_digit()) => name,
        _ => host,
    }
}

/// Terminates the process; swapped out in tests.
pub trait Shutdown: Send + Sync + 'static {
    fn terminate(&self);
}

/// Exits the process with status 0
pub struct ProcessExit;

impl Shutdown for ProcessExit {
    fn terminate(&self) {
        tracing::info!("Exiting on ONVIF SystemReboot");
        std::process::exit(0);
    }
}

/// Schedule a reply's post action on the runtime.
///
/// The deadline is fixed here, not when the task first runs. In-flight
/// requests are not waited for.
pub fn schedule(action: PostAction, shutdown: Arc<dyn Shutdown>) -> Option<JoinHandle<()>> {
    match action {
        PostAction::None => None,
        PostAction::Terminate { after } => {
            let deadline = tokio::time::Instant::now() + after;
            Some(tokio::spawn(async move {
                tokio::time::sleep_until(deadline).await;
                shutdown.terminate();
            }))
        }
    }
}
