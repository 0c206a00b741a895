//! CLIP v2 resource types for the bridge REST API.
//!
//! All types match the JSON bodies under `/clip/v2/resource/`. Every
//! response is wrapped in an `{ "errors": [...], "data": [...] }` envelope.
//! Fields the client never reads are not modeled; serde ignores them.

use serde::{Deserialize, Serialize};

// ── Envelope ─────────────────────────────────────────────────────────

/// Response envelope shared by every CLIP v2 endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub errors: Vec<BridgeErrorEntry>,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// One entry of the envelope's `errors` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeErrorEntry {
    pub description: String,
}

/// Reference to another resource (`rid` + `rtype`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    pub rid: String,
    pub rtype: String,
}

// ── Lights ───────────────────────────────────────────────────────────

/// Light resource: from `GET /clip/v2/resource/light`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightResource {
    pub id: String,
    /// The device this light belongs to; joins against connectivity.
    #[serde(default)]
    pub owner: Option<ResourceRef>,
    pub metadata: LightMetadata,
    pub on: OnState,
    /// Absent on lights that cannot dim.
    #[serde(default)]
    pub dimming: Option<Dimming>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightMetadata {
    pub name: String,
    #[serde(default)]
    pub archetype: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnState {
    pub on: bool,
}

/// Brightness in percent, `0.0..=100.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimming {
    pub brightness: f64,
}

/// Body for `PUT /clip/v2/resource/light/{id}`. Only set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LightUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on: Option<OnState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimming: Option<Dimming>,
}

impl LightUpdate {
    pub fn power(on: bool) -> Self {
        Self {
            on: Some(OnState { on }),
            ..Self::default()
        }
    }

    pub fn brightness(brightness: f64) -> Self {
        Self {
            dimming: Some(Dimming { brightness }),
            ..Self::default()
        }
    }
}

// ── Scenes ───────────────────────────────────────────────────────────

/// Scene resource: from `GET /clip/v2/resource/scene`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneResource {
    pub id: String,
    pub metadata: SceneMetadata,
    #[serde(default)]
    pub group: Option<ResourceRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneMetadata {
    pub name: String,
}

/// Body for `PUT /clip/v2/resource/scene/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneRecall {
    pub recall: RecallAction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecallAction {
    pub action: String,
}

impl SceneRecall {
    /// Recall the scene and make it the active one.
    pub fn active() -> Self {
        Self {
            recall: RecallAction {
                action: "active".into(),
            },
        }
    }
}

// ── Connectivity ─────────────────────────────────────────────────────

/// Zigbee connectivity resource: from `GET /clip/v2/resource/zigbee_connectivity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZigbeeConnectivity {
    pub id: String,
    pub owner: ResourceRef,
    /// One of: `connected`, `disconnected`, `connectivity_issue`,
    /// `unidirectional_incoming`.
    pub status: String,
}

// ── Mutation acknowledgements ────────────────────────────────────────

/// `data` entries returned by a successful `PUT`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdatedRef {
    pub rid: String,
    pub rtype: String,
}
