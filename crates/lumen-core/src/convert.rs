// ── API-to-domain type conversions ──
//
// Bridges raw `lumen_api` resource types into `lumen_core::model` types.
// Missing optional data gets a neutral default: no archetype is an empty
// string, a light that cannot dim reports zero brightness.

use lumen_api::types::{LightResource, SceneResource};

use crate::model::{Brightness, LightId, LightInfo, OwnerId, Scene, SceneId};

impl From<LightResource> for LightInfo {
    fn from(r: LightResource) -> Self {
        Self {
            id: LightId::from(r.id),
            name: r.metadata.name,
            archetype: r.metadata.archetype.unwrap_or_default(),
            power: r.on.on,
            brightness: r
                .dimming
                .map_or(Brightness::MIN, |d| Brightness::from_percent(d.brightness)),
            owner_id: r
                .owner
                .map(|o| o.rid)
                .filter(|rid| !rid.is_empty())
                .map(OwnerId::from),
        }
    }
}

impl From<SceneResource> for Scene {
    fn from(r: SceneResource) -> Self {
        Self {
            id: SceneId::from(r.id),
            name: r.metadata.name,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn light_resource_maps_to_info() {
        let raw = json!({
            "id": "l1",
            "owner": { "rid": "dev-1", "rtype": "device" },
            "metadata": { "name": "Desk", "archetype": "desk_lamp" },
            "on": { "on": true },
            "dimming": { "brightness": 66.9 }
        });
        let info = LightInfo::from(serde_json::from_value::<LightResource>(raw).unwrap());
        assert_eq!(info.id.as_str(), "l1");
        assert_eq!(info.archetype, "desk_lamp");
        assert_eq!(info.brightness.percent(), 67);
        assert_eq!(info.owner_id, Some(OwnerId::from("dev-1")));
    }

    #[test]
    fn empty_owner_rid_means_no_owner() {
        let raw = json!({
            "id": "l2",
            "owner": { "rid": "", "rtype": "device" },
            "metadata": { "name": "Strip" },
            "on": { "on": false }
        });
        let info = LightInfo::from(serde_json::from_value::<LightResource>(raw).unwrap());
        assert!(info.owner_id.is_none());
        assert_eq!(info.brightness, Brightness::MIN);
        assert_eq!(info.archetype, "");
    }
}
