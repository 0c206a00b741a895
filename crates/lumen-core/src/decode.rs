// ── Event decoder ──
//
// Turns one raw event-stream payload into typed change records. The
// envelope array is parsed eagerly so a malformed batch fails up front;
// the items inside are decoded lazily as the caller iterates.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, trace};

use lumen_api::types::{Dimming, OnState, ResourceRef};

use crate::model::{Brightness, LightId, OwnerId};

/// The payload was not a JSON array of update envelopes.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct DecodeError(#[from] serde_json::Error);

/// One decoded state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeRecord {
    /// Partial light update. `None` means the field was absent, which is
    /// distinct from a brightness of zero.
    LightChanged {
        id: LightId,
        power: Option<bool>,
        brightness: Option<Brightness>,
    },
    ConnectivityChanged { owner_id: OwnerId, connected: bool },
}

// ── Wire shapes ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct EventEnvelope {
    #[serde(default)]
    data: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct LightItem {
    id: String,
    #[serde(default)]
    on: Option<OnState>,
    #[serde(default)]
    dimming: Option<Dimming>,
}

#[derive(Debug, Deserialize)]
struct ConnectivityItem {
    #[serde(default)]
    owner: Option<ResourceRef>,
    #[serde(default)]
    status: Option<String>,
}

// ── Decoding ─────────────────────────────────────────────────────────

/// Decode one pushed batch.
pub fn decode_batch(raw: &[u8]) -> Result<ChangeRecords, DecodeError> {
    let envelopes: Vec<EventEnvelope> = serde_json::from_slice(raw)?;
    let items: Vec<Value> = envelopes.into_iter().flat_map(|env| env.data).collect();
    Ok(ChangeRecords {
        items: items.into_iter(),
    })
}

/// Lazy sequence of records from one batch, in stream order.
#[derive(Debug)]
pub struct ChangeRecords {
    items: std::vec::IntoIter<Value>,
}

impl Iterator for ChangeRecords {
    type Item = ChangeRecord;

    fn next(&mut self) -> Option<ChangeRecord> {
        self.items.by_ref().find_map(decode_item)
    }
}

fn decode_item(item: Value) -> Option<ChangeRecord> {
    let kind = item.get("type").and_then(Value::as_str)?.to_owned();

    match kind.as_str() {
        "light" => match serde_json::from_value::<LightItem>(item) {
            Ok(light) => Some(ChangeRecord::LightChanged {
                id: LightId::from(light.id),
                power: light.on.map(|on| on.on),
                brightness: light.dimming.map(|d| Brightness::from_percent(d.brightness)),
            }),
            Err(e) => {
                debug!(error = %e, "Dropping malformed light update");
                None
            }
        },
        "zigbee_connectivity" => match serde_json::from_value::<ConnectivityItem>(item) {
            Ok(ConnectivityItem {
                owner: Some(owner),
                status: Some(status),
            }) => Some(ChangeRecord::ConnectivityChanged {
                owner_id: OwnerId::from(owner.rid),
                connected: status == "connected",
            }),
            Ok(_) => {
                debug!("Dropping connectivity update without owner or status");
                None
            }
            Err(e) => {
                debug!(error = %e, "Dropping malformed connectivity update");
                None
            }
        },
        other => {
            trace!(kind = other, "Ignoring event item");
            None
        }
    }
}
