//! Seam between the HTTP-facing code and real cameras.
//!
//! Everything here is blocking; callers run it on the blocking pool.

use std::time::Duration;

use anyhow::Result;
use onvif_client::{discovery, OnvifClient};

/// One open session with a camera.
pub trait DeviceClient {
    fn get_name(&mut self) -> Result<String>;
    fn get_profiles_tokens(&mut self) -> Result<Vec<String>>;
    fn has_snapshots(&mut self) -> bool;
    /// Playback URI selected by the session URL's query
    fn get_uri(&mut self) -> Result<String>;
    /// Raw GetProfiles response, for diagnostics
    fn profiles_dump(&mut self) -> Result<String>;
}

pub trait OnvifBackend: Send + Sync + 'static {
    fn connect(&self, url: &str) -> Result<Box<dyn DeviceClient>>;
    /// Device service URLs found on the local network
    fn discover(&self) -> Result<Vec<String>>;
}

impl DeviceClient for OnvifClient {
    fn get_name(&mut self) -> Result<String> {
        OnvifClient::get_name(self)
    }

    fn get_profiles_tokens(&mut self) -> Result<Vec<String>> {
        OnvifClient::get_profiles_tokens(self)
    }

    fn has_snapshots(&mut self) -> bool {
        OnvifClient::has_snapshots(self)
    }

    fn get_uri(&mut self) -> Result<String> {
        OnvifClient::get_uri(self)
    }

    fn profiles_dump(&mut self) -> Result<String> {
        self.media_request("GetProfiles")
    }
}

/// Backend talking to real cameras.
#[derive(Debug, Clone)]
pub struct NetworkBackend {
    pub discovery_timeout: Duration,
}

impl Default for NetworkBackend {
    fn default() -> Self {
        Self {
            discovery_timeout: discovery::DEFAULT_TIMEOUT,
        }
    }
}

impl OnvifBackend for NetworkBackend {
    fn connect(&self, url: &str) -> Result<Box<dyn DeviceClient>> {
        Ok(Box::new(OnvifClient::connect(url)?))
    }

    fn discover(&self) -> Result<Vec<String>> {
        discovery::discover_streaming_urls(self.discovery_timeout)
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use anyhow::bail;

    #[derive(Debug, Clone, Default)]
    pub struct FakeDevice {
        pub name: String,
        pub tokens: Vec<String>,
        pub snapshots: bool,
        /// `None` makes get_uri fail
        pub uri: Option<String>,
        pub fail_queries: bool,
    }

    impl DeviceClient for FakeDevice {
        fn get_name(&mut self) -> Result<String> {
            if self.fail_queries {
                bail!("GetDeviceInformation failed");
            }
            Ok(self.name.clone())
        }

        fn get_profiles_tokens(&mut self) -> Result<Vec<String>> {
            if self.fail_queries {
                bail!("GetProfiles failed");
            }
            Ok(self.tokens.clone())
        }

        fn has_snapshots(&mut self) -> bool {
            self.snapshots
        }

        fn get_uri(&mut self) -> Result<String> {
            match &self.uri {
                Some(uri) => Ok(uri.clone()),
                None => bail!("wrong subtype"),
            }
        }

        fn profiles_dump(&mut self) -> Result<String> {
            Ok("<trt:GetProfilesResponse/>".to_string())
        }
    }

    #[derive(Debug, Clone, Default)]
    pub struct FakeBackend {
        pub candidates: Vec<String>,
        pub discovery_fails: bool,
        /// `None` makes connect fail
        pub device: Option<FakeDevice>,
    }

    impl OnvifBackend for FakeBackend {
        fn connect(&self, url: &str) -> Result<Box<dyn DeviceClient>> {
            match &self.device {
                Some(device) => Ok(Box::new(device.clone())),
                None => bail!("connection refused: {}", url),
            }
        }

        fn discover(&self) -> Result<Vec<String>> {
            if self.discovery_fails {
                bail!("multicast send failed");
            }
            Ok(self.candidates.clone())
        }
    }
}
