//! ONVIF sources for the bridge.
//!
//! This crate covers the client side of the bridge:
//!
//! - **Discovery**: lists cameras found on the LAN, or the profiles of one camera
//! - **Resolution**: turns `onvif://` URLs into the camera's own RTSP/HTTP URI
//!   through a scheme-keyed stream registry
//!
//! # Endpoints
//!
//! | Endpoint | Description |
//! |----------|-------------|
//! | `GET /api/onvif` | Cameras found by WS-Discovery |
//! | `GET /api/onvif?src=<url>` | Stream and snapshot sources of one camera |
//! | `GET /api/onvif/stream?src=<url>` | Upstream URI a source resolves to |

pub mod backend;
pub mod discovery;
pub mod error;
pub mod registry;
pub mod resolver;
pub mod routes;
mod state;

pub use backend::{DeviceClient, NetworkBackend, OnvifBackend};
pub use discovery::SourceDescriptor;
pub use error::{RegistryError, SourceError};
pub use registry::{DirectProducer, Producer, SchemeRegistry, StreamRegistry};
pub use resolver::{register_onvif, resolve};
pub use routes::sources_router;
pub use state::SourcesState;
