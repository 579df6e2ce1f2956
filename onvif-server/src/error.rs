//! Dispatcher error types

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::templates;
use crate::SOAP_CONTENT_TYPE;

/// Request-terminal failures on the device service path
#[derive(Debug, Error)]
pub enum OnvifError {
    /// No operation could be read from the body, or a required HTTP detail
    /// is missing
    #[error("malformed request: {0}")]
    MalformedRequest(&'static str),

    /// Well-formed request for an operation the virtual device does not serve
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
}

impl OnvifError {
    fn fault_code(&self) -> &'static str {
        match self {
            OnvifError::MalformedRequest(_) => "ter:InvalidArgs",
            OnvifError::UnsupportedOperation(_) => "ter:ActionNotSupported",
        }
    }

    /// Fault reason sent to the client. Never carries request content.
    fn fault_reason(&self) -> &'static str {
        match self {
            OnvifError::MalformedRequest(reason) => reason,
            OnvifError::UnsupportedOperation(_) => "unsupported operation",
        }
    }
}

impl IntoResponse for OnvifError {
    fn into_response(self) -> Response {
        tracing::warn!("ONVIF request rejected: {}", self);

        (
            StatusCode::BAD_REQUEST,
            [(header::CONTENT_TYPE, SOAP_CONTENT_TYPE)],
            templates::fault(self.fault_code(), self.fault_reason()),
        )
            .into_response()
    }
}
