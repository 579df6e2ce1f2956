use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid source URI: {0}")]
    InvalidUri(String),
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("ONVIF connect failed: {0:#}")]
    ClientConnect(anyhow::Error),

    #[error("ONVIF query failed: {0:#}")]
    ProfileQuery(anyhow::Error),

    #[error("ONVIF discovery failed: {0:#}")]
    Discovery(anyhow::Error),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("background task failed: {0}")]
    Task(String),
}

impl IntoResponse for SourceError {
    fn into_response(self) -> Response {
        tracing::warn!("ONVIF sources error: {}", self);

        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}
