// ── Light domain types ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::id::{LightId, OwnerId, SceneId};

// ── Brightness ──────────────────────────────────────────────────────

/// Brightness as an integer percentage, always within `0..=100`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Brightness(u8);

impl Brightness {
    pub const MIN: Self = Self(0);
    pub const MAX: Self = Self(100);

    /// Clamp any integer into range.
    pub fn new(percent: i32) -> Self {
        Self(u8::try_from(percent.clamp(0, 100)).unwrap_or(100))
    }

    /// Convert a wire value (floating-point percent). Rounds to the nearest
    /// integer; NaN becomes zero.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::as_conversions)]
    pub fn from_percent(value: f64) -> Self {
        if value.is_nan() {
            return Self::MIN;
        }
        Self(value.round().clamp(0.0, 100.0) as u8)
    }

    /// `clamp(self + delta, 0, 100)`.
    pub fn step(self, delta: i32) -> Self {
        Self::new(i32::from(self.0).saturating_add(delta))
    }

    pub fn percent(self) -> u8 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.0)
    }
}

impl std::fmt::Display for Brightness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

// ── Connectivity ────────────────────────────────────────────────────

/// Radio link state of a light's owning device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ConnectivityStatus {
    Connected,
    Disconnected,
    ConnectivityIssue,
    UnidirectionalIncoming,
    #[strum(default)]
    Other(String),
}

impl ConnectivityStatus {
    /// Parse a wire status. Unknown values are kept verbatim.
    pub fn parse(raw: &str) -> Self {
        raw.parse().unwrap_or_else(|_| Self::Other(raw.to_owned()))
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

// ── Light ───────────────────────────────────────────────────────────

/// One entry of the gateway's light listing, before reachability is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightInfo {
    pub id: LightId,
    pub name: String,
    pub archetype: String,
    pub power: bool,
    pub brightness: Brightness,
    pub owner_id: Option<OwnerId>,
}

/// A light as held in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Light {
    pub id: LightId,
    pub name: String,
    pub archetype: String,
    pub power: bool,
    pub brightness: Brightness,
    /// `true` unless a connectivity signal said otherwise.
    pub reachable: bool,
    pub owner_id: Option<OwnerId>,
}

impl Light {
    pub fn from_info(info: LightInfo, reachable: bool) -> Self {
        Self {
            id: info.id,
            name: info.name,
            archetype: info.archetype,
            power: info.power,
            brightness: info.brightness,
            reachable,
            owner_id: info.owner_id,
        }
    }
}

// ── Scene ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    pub id: SceneId,
    pub name: String,
}
