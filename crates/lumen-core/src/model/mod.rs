// ── Domain model ──

pub mod id;
pub mod light;

pub use id::{LightId, OwnerId, SceneId};
pub use light::{Brightness, ConnectivityStatus, Light, LightInfo, Scene};
