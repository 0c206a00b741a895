// ── Reconciler ──
//
// The two merge paths into the registry. A full refresh rebuilds it from
// a gateway snapshot; an incremental merge applies decoded change records
// in stream order. Both are idempotent for the same input.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::decode::ChangeRecord;
use crate::error::CoreError;
use crate::gateway::LightGateway;
use crate::model::{ConnectivityStatus, Light, LightId, LightInfo, OwnerId};
use crate::registry::{LightPatch, LightRegistry};

// ── Full refresh ─────────────────────────────────────────────────────

/// Build the registry contents from a listing and a connectivity snapshot.
///
/// Lights are ordered by id. A light is reachable unless its owner has a
/// record that is not `connected`.
pub fn build_lights(
    listing: HashMap<LightId, LightInfo>,
    connectivity: &HashMap<OwnerId, ConnectivityStatus>,
) -> Vec<Light> {
    let mut infos: Vec<LightInfo> = listing.into_values().collect();
    infos.sort_by(|a, b| a.id.cmp(&b.id));

    infos
        .into_iter()
        .map(|info| {
            let reachable = info
                .owner_id
                .as_ref()
                .and_then(|owner| connectivity.get(owner))
                .is_none_or(ConnectivityStatus::is_connected);
            Light::from_info(info, reachable)
        })
        .collect()
}

/// Query the gateway and replace the registry wholesale.
///
/// A failed light listing leaves the registry untouched. A failed
/// connectivity query only costs reachability: every light defaults to
/// reachable. Returns the new light count.
pub async fn full_refresh<G: LightGateway + ?Sized>(
    gateway: &G,
    registry: &mut LightRegistry,
) -> Result<usize, CoreError> {
    let listing = gateway.list_lights().await?;

    let connectivity = match gateway.list_connectivity().await {
        Ok(map) => map,
        Err(e) => {
            warn!(error = %e, "Connectivity query failed, assuming all lights reachable");
            HashMap::new()
        }
    };

    let lights = build_lights(listing, &connectivity);
    let count = lights.len();
    registry.replace(lights);

    info!(lights = count, "Registry refreshed");
    Ok(count)
}

// ── Incremental merge ────────────────────────────────────────────────

/// Tally of one incremental merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub lights_patched: usize,
    pub connectivity_applied: usize,
    /// Records that matched nothing in the registry.
    pub dropped: usize,
}

/// Apply records strictly in order.
pub fn apply_batch(
    registry: &mut LightRegistry,
    records: impl IntoIterator<Item = ChangeRecord>,
) -> MergeReport {
    let mut report = MergeReport::default();

    for record in records {
        match record {
            ChangeRecord::LightChanged {
                id,
                power,
                brightness,
            } => {
                let patch = LightPatch {
                    power,
                    brightness,
                    // Any update from a light proves it is on the network.
                    reachable: Some(true),
                };
                match registry.patch(&id, patch) {
                    Ok(()) => report.lights_patched += 1,
                    Err(_) => {
                        debug!(light = %id, "Update for unknown light dropped");
                        report.dropped += 1;
                    }
                }
            }
            ChangeRecord::ConnectivityChanged {
                owner_id,
                connected,
            } => {
                let matched = registry.set_reachable_for_owner(&owner_id, connected);
                if matched == 0 {
                    debug!(owner = %owner_id, "Connectivity for unknown owner dropped");
                    report.dropped += 1;
                } else {
                    if !connected {
                        info!(owner = %owner_id, lights = matched, "Lights became unreachable");
                    }
                    report.connectivity_applied += 1;
                }
            }
        }
    }

    report
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::Brightness;

    fn info(id: &str, owner: Option<&str>) -> LightInfo {
        LightInfo {
            id: id.into(),
            name: format!("Light {id}"),
            archetype: "classic_bulb".into(),
            power: true,
            brightness: Brightness::new(70),
            owner_id: owner.map(OwnerId::from),
        }
    }

    fn listing(items: Vec<LightInfo>) -> HashMap<LightId, LightInfo> {
        items.into_iter().map(|i| (i.id.clone(), i)).collect()
    }

    #[test]
    fn build_sorts_by_id_and_applies_connectivity() {
        let lights = build_lights(
            listing(vec![
                info("c", Some("dev-c")),
                info("a", Some("dev-a")),
                info("b", None),
                info("d", Some("dev-d")),
            ]),
            &HashMap::from([
                (OwnerId::from("dev-a"), ConnectivityStatus::Connected),
                (OwnerId::from("dev-c"), ConnectivityStatus::ConnectivityIssue),
            ]),
        );

        let summary: Vec<(&str, bool)> = lights
            .iter()
            .map(|l| (l.id.as_str(), l.reachable))
            .collect();
        assert_eq!(
            summary,
            [("a", true), ("b", true), ("c", false), ("d", true)]
        );
    }

    fn registry() -> LightRegistry {
        let mut reg = LightRegistry::new();
        reg.replace(build_lights(
            listing(vec![
                info("a", Some("dev-1")),
                info("b", Some("dev-1")),
                info("c", Some("dev-2")),
            ]),
            &HashMap::new(),
        ));
        reg
    }

    #[test]
    fn power_only_update_keeps_brightness() {
        let mut reg = registry();
        apply_batch(
            &mut reg,
            [ChangeRecord::LightChanged {
                id: "a".into(),
                power: Some(false),
                brightness: None,
            }],
        );
        let a = reg.get(0).unwrap();
        assert!(!a.power);
        assert_eq!(a.brightness, Brightness::new(70));
    }

    #[test]
    fn zero_brightness_update_applies() {
        let mut reg = registry();
        apply_batch(
            &mut reg,
            [ChangeRecord::LightChanged {
                id: "b".into(),
                power: None,
                brightness: Some(Brightness::MIN),
            }],
        );
        assert_eq!(reg.get(1).unwrap().brightness, Brightness::MIN);
    }

    #[test]
    fn disconnect_marks_only_that_owner() {
        let mut reg = registry();
        let report = apply_batch(
            &mut reg,
            [ChangeRecord::ConnectivityChanged {
                owner_id: "dev-1".into(),
                connected: false,
            }],
        );
        let reachable: Vec<bool> = reg.iter().map(|l| l.reachable).collect();
        assert_eq!(reachable, [false, false, true]);
        assert_eq!(report.connectivity_applied, 1);
    }

    #[test]
    fn light_update_restores_reachability() {
        let mut reg = registry();
        reg.set_reachable_for_owner(&"dev-2".into(), false);
        apply_batch(
            &mut reg,
            [ChangeRecord::LightChanged {
                id: "c".into(),
                power: Some(true),
                brightness: None,
            }],
        );
        assert!(reg.get(2).unwrap().reachable);
    }

    #[test]
    fn records_apply_in_order() {
        let mut reg = registry();
        apply_batch(
            &mut reg,
            [
                ChangeRecord::LightChanged {
                    id: "a".into(),
                    power: Some(false),
                    brightness: Some(Brightness::new(10)),
                },
                ChangeRecord::LightChanged {
                    id: "a".into(),
                    power: Some(true),
                    brightness: None,
                },
            ],
        );
        let a = reg.get(0).unwrap();
        assert!(a.power);
        assert_eq!(a.brightness, Brightness::new(10));
    }

    #[test]
    fn unknown_ids_are_dropped_silently() {
        let mut reg = registry();
        let before = serde_json::to_vec(&reg).unwrap();
        let report = apply_batch(
            &mut reg,
            [
                ChangeRecord::LightChanged {
                    id: "nope".into(),
                    power: Some(false),
                    brightness: None,
                },
                ChangeRecord::ConnectivityChanged {
                    owner_id: "dev-x".into(),
                    connected: false,
                },
            ],
        );
        assert_eq!(report.dropped, 2);
        assert_eq!(serde_json::to_vec(&reg).unwrap(), before);
    }
}
