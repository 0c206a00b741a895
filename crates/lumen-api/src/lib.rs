// lumen-api: Async Rust client for the Hue bridge CLIP v2 API + event stream

pub mod client;
pub mod error;
pub mod event_stream;
pub mod transport;
pub mod types;

pub use client::BridgeClient;
pub use error::Error;
pub use event_stream::{EventStreamHandle, ReconnectConfig, SseParser};
pub use transport::{TlsMode, TransportConfig};
