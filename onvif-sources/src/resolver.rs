//! Turns an `onvif://` camera URL into a playable producer.

use std::sync::Arc;

use crate::backend::OnvifBackend;
use crate::error::SourceError;
use crate::registry::{Producer, SchemeRegistry, StreamRegistry};

pub const ONVIF_SCHEME: &str = "onvif";

/// Resolve `url` to the camera's playback URI and obtain a producer for it.
///
/// No retries; registry errors are returned unchanged.
pub fn resolve(
    registry: &dyn StreamRegistry,
    backend: &dyn OnvifBackend,
    url: &str,
) -> Result<Box<dyn Producer>, SourceError> {
    let mut client = backend.connect(url).map_err(SourceError::ClientConnect)?;

    let uri = client.get_uri().map_err(SourceError::ProfileQuery)?;
    if uri.is_empty() {
        return Err(SourceError::ProfileQuery(anyhow::anyhow!(
            "camera returned an empty URI"
        )));
    }

    tracing::debug!("ONVIF new uri={}", uri);

    registry.get_producer(&uri)
}

/// Register [`resolve`] as the `onvif` scheme handler.
pub fn register_onvif(registry: &mut SchemeRegistry, backend: Arc<dyn OnvifBackend>) {
    registry.handle_func(ONVIF_SCHEME, move |registry, url| {
        resolve(registry, backend.as_ref(), url)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::{FakeBackend, FakeDevice};
    use crate::error::RegistryError;

    fn registry_with(backend: FakeBackend) -> SchemeRegistry {
        let mut registry = SchemeRegistry::new();
        registry.register_direct_schemes();
        register_onvif(&mut registry, Arc::new(backend));
        registry
    }

    fn device(uri: Option<&str>) -> FakeDevice {
        FakeDevice {
            name: "Hikvision DS-2CD2043G2-I".to_string(),
            tokens: vec!["Profile_1".to_string()],
            uri: uri.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_resolves_through_registry() {
        let registry = registry_with(FakeBackend {
            device: Some(device(Some("rtsp://admin:pw@10.0.0.2:554/Streaming/101"))),
            ..Default::default()
        });

        let producer = registry
            .get_producer("onvif://admin:pw@10.0.0.2?subtype=0")
            .unwrap();
        assert_eq!(producer.uri(), "rtsp://admin:pw@10.0.0.2:554/Streaming/101");
    }

    #[test]
    fn test_connect_failure() {
        let registry = registry_with(FakeBackend::default());
        let err = registry.get_producer("onvif://10.0.0.2").unwrap_err();
        assert!(matches!(err, SourceError::ClientConnect(_)));
    }

    #[test]
    fn test_uri_query_failure() {
        let registry = registry_with(FakeBackend {
            device: Some(device(None)),
            ..Default::default()
        });
        let err = registry.get_producer("onvif://10.0.0.2?subtype=7").unwrap_err();
        assert!(matches!(err, SourceError::ProfileQuery(_)));
        assert!(err.to_string().contains("wrong subtype"));
    }

    #[test]
    fn test_empty_uri_is_profile_error() {
        let registry = registry_with(FakeBackend {
            device: Some(device(Some(""))),
            ..Default::default()
        });
        let err = registry.get_producer("onvif://10.0.0.2").unwrap_err();
        assert!(matches!(err, SourceError::ProfileQuery(_)));
    }

    #[test]
    fn test_registry_error_propagates_unchanged() {
        let registry = registry_with(FakeBackend {
            device: Some(device(Some("udp://239.0.0.1:5000"))),
            ..Default::default()
        });
        let err = registry.get_producer("onvif://10.0.0.2").unwrap_err();
        assert!(matches!(
            err,
            SourceError::Registry(RegistryError::UnsupportedScheme(ref s)) if s == "udp"
        ));
    }
}
