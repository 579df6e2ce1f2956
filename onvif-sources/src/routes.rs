use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::discovery::{self, SourceDescriptor};
use crate::error::SourceError;
use crate::state::SourcesState;

/// Create the ONVIF source listing router.
pub fn sources_router(state: Arc<SourcesState>) -> Router {
    Router::new()
        .route("/api/onvif", get(list_sources_handler))
        .route("/api/onvif/stream", get(resolve_stream_handler))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct SourceQuery {
    src: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SourcesResponse {
    pub sources: Vec<SourceDescriptor>,
}

/// List discovered cameras, or the profiles of one camera when `src` is set.
async fn list_sources_handler(
    State(state): State<Arc<SourcesState>>,
    Query(query): Query<SourceQuery>,
) -> Result<Json<SourcesResponse>, SourceError> {
    let backend = Arc::clone(&state.backend);
    let src = query.src.filter(|s| !s.is_empty());

    let sources = tokio::task::spawn_blocking(move || match src {
        Some(src) => discovery::describe_device(backend.as_ref(), &src),
        None => discovery::discover_sources(backend.as_ref()),
    })
    .await
    .map_err(|e| SourceError::Task(e.to_string()))??;

    Ok(Json(SourcesResponse { sources }))
}

#[derive(Debug, Deserialize)]
struct StreamQuery {
    src: String,
}

/// Resolve `src` through the stream registry and report the upstream URI.
async fn resolve_stream_handler(
    State(state): State<Arc<SourcesState>>,
    Query(query): Query<StreamQuery>,
) -> Result<Json<SourceDescriptor>, SourceError> {
    let registry = Arc::clone(&state.registry);
    let src = query.src;

    let (src, uri) = tokio::task::spawn_blocking(move || {
        let producer = registry.get_producer(&src)?;
        Ok::<_, SourceError>((src, producer.uri().to_string()))
    })
    .await
    .map_err(|e| SourceError::Task(e.to_string()))??;

    Ok(Json(SourceDescriptor { name: src, url: uri }))
}
