use std::sync::Arc;

use crate::backend::OnvifBackend;
use crate::registry::StreamRegistry;

/// Shared state for the source listing routes.
pub struct SourcesState {
    pub backend: Arc<dyn OnvifBackend>,
    pub registry: Arc<dyn StreamRegistry>,
}

impl SourcesState {
    pub fn new(backend: Arc<dyn OnvifBackend>, registry: Arc<dyn StreamRegistry>) -> Self {
        Self { backend, registry }
    }
}
