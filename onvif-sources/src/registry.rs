//! Stream registry
//!
//! Maps a source URI to a [`Producer`] by its scheme. Handlers receive the
//! registry itself so a handler can resolve to another URI and hand it back
//! (the ONVIF resolver does exactly that).

use std::collections::HashMap;
use std::fmt;

use url::Url;

use crate::error::{RegistryError, SourceError};

/// Schemes the media pipeline plays as-is
pub const DIRECT_SCHEMES: [&str; 4] = ["rtsp", "rtsps", "http", "https"];

/// A media source ready for the streaming pipeline.
pub trait Producer: Send + fmt::Debug {
    /// Upstream URI this producer pulls from
    fn uri(&self) -> &str;
}

pub trait StreamRegistry: Send + Sync {
    fn get_producer(&self, uri: &str) -> Result<Box<dyn Producer>, SourceError>;
}

type Handler =
    Box<dyn Fn(&SchemeRegistry, &str) -> Result<Box<dyn Producer>, SourceError> + Send + Sync>;

/// Producer for URIs the pipeline understands natively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectProducer {
    uri: String,
}

impl DirectProducer {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }
}

impl Producer for DirectProducer {
    fn uri(&self) -> &str {
        &self.uri
    }
}

/// Registry dispatching on the URI scheme.
#[derive(Default)]
pub struct SchemeRegistry {
    handlers: HashMap<String, Handler>,
}

impl SchemeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `scheme`, replacing any earlier one.
    pub fn handle_func<F>(&mut self, scheme: &str, handler: F)
    where
        F: Fn(&SchemeRegistry, &str) -> Result<Box<dyn Producer>, SourceError>
            + Send
            + Sync
            + 'static,
    {
        self.handlers
            .insert(scheme.to_ascii_lowercase(), Box::new(handler));
    }

    /// Register [`DirectProducer`] for every scheme in [`DIRECT_SCHEMES`].
    pub fn register_direct_schemes(&mut self) {
        for scheme in DIRECT_SCHEMES {
            self.handle_func(scheme, |_, uri| Ok(Box::new(DirectProducer::new(uri))));
        }
    }

    pub fn schemes(&self) -> Vec<&str> {
        let mut schemes: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        schemes.sort_unstable();
        schemes
    }
}

impl StreamRegistry for SchemeRegistry {
    fn get_producer(&self, uri: &str) -> Result<Box<dyn Producer>, SourceError> {
        let parsed = Url::parse(uri).map_err(|_| RegistryError::InvalidUri(uri.to_string()))?;

        let handler = self
            .handlers
            .get(parsed.scheme())
            .ok_or_else(|| RegistryError::UnsupportedScheme(parsed.scheme().to_string()))?;

        handler(self, uri)
    }
}
