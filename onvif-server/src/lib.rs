//! ONVIF Server Library
//!
//! Presents the bridge as a single virtual ONVIF camera so NVRs and home
//! automation systems can discover it and pull its streams. Every configured
//! stream becomes one media profile.
//!
//! All device and media service calls arrive on `/onvif/*` and go through
//! [`dispatch::dispatch`].

pub mod device;
pub mod dispatch;
mod error;
pub mod request;
pub mod templates;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::sync::Arc;

pub use device::{
    DeviceModel, StreamProfile, VirtualDevice, DEFAULT_DEVICE_NAME, DEFAULT_DEVICE_SERIAL,
};
pub use dispatch::{PostAction, ProcessExit, Shutdown, SoapReply};
pub use error::OnvifError;
pub use request::Operation;

pub const SOAP_CONTENT_TYPE: &str = "application/soap+xml; charset=utf-8";

/// ONVIF server state
pub struct OnvifServerState {
    /// Read-only device description, built once at startup
    pub model: Arc<DeviceModel>,
    /// Runs SystemReboot
    pub shutdown: Arc<dyn Shutdown>,
}

impl OnvifServerState {
    pub fn new(model: Arc<DeviceModel>) -> Self {
        Self {
            model,
            shutdown: Arc::new(ProcessExit),
        }
    }
}

/// Router serving the device and media services on `/onvif/` and every sub-path.
pub fn onvif_router(state: Arc<OnvifServerState>) -> Router {
    Router::new()
        .route("/onvif/", any(handle_device_service))
        .route("/onvif/{*path}", any(handle_device_service))
        .with_state(state)
}

/// Handle ONVIF device and media service requests
async fn handle_device_service(
    State(state): State<Arc<OnvifServerState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let body = String::from_utf8_lossy(&body);
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| uri.authority().map(|a| a.as_str()));

    tracing::trace!("ONVIF server request {} {}:\n{}", method, uri, body);

    let reply = match dispatch::dispatch(&state.model, &body, host) {
        Ok(reply) => reply,
        Err(e) => return e.into_response(),
    };

    tracing::trace!("ONVIF server response:\n{}", reply.body);

    dispatch::schedule(reply.action, Arc::clone(&state.shutdown));

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, SOAP_CONTENT_TYPE)],
        reply.body,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    #[derive(Default)]
    struct CountingShutdown(AtomicUsize);

    impl Shutdown for CountingShutdown {
        fn terminate(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn state(shutdown: Arc<CountingShutdown>) -> Arc<OnvifServerState> {
        let mut streams = BTreeMap::new();
        streams.insert(
            "camera1".to_string(),
            StreamProfile {
                width: "1920".to_string(),
                height: "1080".to_string(),
                framerate: "30".to_string(),
                bitrate: "4096".to_string(),
            },
        );
        let model = DeviceModel::new(VirtualDevice::default(), streams, "1.0.0", 8554);
        Arc::new(OnvifServerState {
            model: Arc::new(model),
            shutdown,
        })
    }

    fn soap_request(path: &str, inner: &str) -> Request<Body> {
        let body = format!(
            r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope"><s:Body>{}</s:Body></s:Envelope>"#,
            inner
        );
        Request::builder()
            .method("POST")
            .uri(path)
            .header(header::HOST, "192.168.1.10:1984")
            .body(Body::from(body))
            .expect("request")
    }

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        String::from_utf8(bytes.to_vec()).expect("utf8")
    }

    #[tokio::test]
    async fn test_stream_uri_over_http() {
        let app = onvif_router(state(Arc::default()));
        let response = app
            .oneshot(soap_request(
                "/onvif/media_service",
                "<trt:GetStreamUri><trt:ProfileToken>camera1</trt:ProfileToken></trt:GetStreamUri>",
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            SOAP_CONTENT_TYPE
        );
        let body = body_string(response).await;
        assert!(body.contains("rtsp://192.168.1.10:8554/camera1"));
    }

    #[tokio::test]
    async fn test_capabilities_any_subpath() {
        let app = onvif_router(state(Arc::default()));
        let response = app
            .oneshot(soap_request("/onvif/device_service", "<tds:GetCapabilities/>"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.contains("http://192.168.1.10:1984/onvif/media_service"));
    }

    #[tokio::test]
    async fn test_unsupported_operation_is_400_without_echo() {
        let app = onvif_router(state(Arc::default()));
        let response = app
            .oneshot(soap_request(
                "/onvif/ptz_service",
                "<tptz:ContinuousMove><Secret>do-not-echo</Secret></tptz:ContinuousMove>",
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_string(response).await;
        assert!(!body.contains("do-not-echo"));
    }

    #[tokio::test]
    async fn test_bare_onvif_path_is_served() {
        let app = onvif_router(state(Arc::default()));
        let response = app
            .oneshot(soap_request("/onvif/", "<tds:GetServices/>"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.contains("http://192.168.1.10:1984/onvif/device_service"));
        assert!(body.contains("http://192.168.1.10:1984/onvif/media_service"));
    }

    #[tokio::test]
    async fn test_unsupported_action_name_not_in_fault() {
        let app = onvif_router(state(Arc::default()));
        let response = app
            .oneshot(soap_request("/onvif/device_service", "<SecretPayloadName/>"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_string(response).await;
        assert!(body.contains("ter:ActionNotSupported"));
        assert!(body.contains("unsupported operation"));
        assert!(!body.contains("SecretPayloadName"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_400() {
        let app = onvif_router(state(Arc::default()));
        let request = Request::builder()
            .method("POST")
            .uri("/onvif/device_service")
            .header(header::HOST, "h")
            .body(Body::from("garbage"))
            .expect("request");
        let response = app.oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reboot_schedules_shutdown() {
        let shutdown = Arc::new(CountingShutdown::default());
        let app = onvif_router(state(Arc::clone(&shutdown)));
        let response = app
            .oneshot(soap_request("/onvif/device_service", "<tds:SystemReboot/>"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.contains(templates::REBOOT_MESSAGE));
        assert_eq!(shutdown.0.load(Ordering::SeqCst), 0);

        tokio::time::sleep(dispatch::REBOOT_DELAY + std::time::Duration::from_millis(1)).await;
        assert_eq!(shutdown.0.load(Ordering::SeqCst), 1);
    }
}
