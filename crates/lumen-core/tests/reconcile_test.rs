#![allow(clippy::unwrap_used)]
// Integration tests for the refresh and merge paths.

mod common;

use pretty_assertions::assert_eq;
use serde_json::json;

use common::{Call, MockGateway};
use lumen_core::{Brightness, LightRegistry, apply_batch, decode_batch, full_refresh};

// ── Helpers ─────────────────────────────────────────────────────────

fn gateway() -> MockGateway {
    MockGateway::new()
        .with_light("c3", "Porch", false, 30, Some("dev-porch"))
        .with_light("a1", "Desk", true, 80, Some("dev-desk"))
        .with_light("b2", "Hall", true, 50, Some("dev-hall"))
        .with_connectivity("dev-desk", "connected")
        .with_connectivity("dev-porch", "connectivity_issue")
}

async fn refreshed(gw: &MockGateway) -> LightRegistry {
    let mut registry = LightRegistry::new();
    full_refresh(gw, &mut registry).await.unwrap();
    registry
}

fn payload(items: &serde_json::Value) -> Vec<u8> {
    serde_json::to_vec(&json!([{ "type": "update", "id": "evt-1", "data": items }])).unwrap()
}

// ── Full refresh ────────────────────────────────────────────────────

#[tokio::test]
async fn refresh_orders_by_id_and_joins_connectivity() {
    let gw = gateway();
    let registry = refreshed(&gw).await;

    let rows: Vec<(&str, bool)> = registry
        .iter()
        .map(|l| (l.id.as_str(), l.reachable))
        .collect();
    // dev-hall has no connectivity record, so Hall stays reachable.
    assert_eq!(rows, [("a1", true), ("b2", true), ("c3", false)]);
}

#[tokio::test]
async fn refresh_is_idempotent() {
    let gw = gateway();
    let mut registry = LightRegistry::new();

    full_refresh(&gw, &mut registry).await.unwrap();
    let first = serde_json::to_vec(&registry).unwrap();
    full_refresh(&gw, &mut registry).await.unwrap();
    let second = serde_json::to_vec(&registry).unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn failed_listing_leaves_registry_unchanged() {
    let gw = gateway();
    let mut registry = refreshed(&gw).await;
    let before = serde_json::to_vec(&registry).unwrap();

    gw.set_fail_listing(true);
    gw.external_set_power("a1", false);
    assert!(full_refresh(&gw, &mut registry).await.is_err());

    assert_eq!(serde_json::to_vec(&registry).unwrap(), before);
}

#[tokio::test]
async fn failed_connectivity_query_defaults_to_reachable() {
    let gw = gateway();
    gw.set_fail_connectivity(true);

    let registry = refreshed(&gw).await;

    assert!(registry.iter().all(|l| l.reachable));
    assert_eq!(gw.count(&Call::ListConnectivity), 1);
}

#[tokio::test]
async fn refresh_picks_up_external_changes() {
    let gw = gateway();
    let mut registry = refreshed(&gw).await;
    assert!(registry.get(0).unwrap().power);

    gw.external_set_power("a1", false);
    full_refresh(&gw, &mut registry).await.unwrap();

    assert!(!registry.get(0).unwrap().power);
}

// ── Incremental merge ───────────────────────────────────────────────

#[tokio::test]
async fn decoded_batch_patches_registry() {
    let gw = gateway();
    let mut registry = refreshed(&gw).await;

    let raw = payload(&json!([
        { "id": "b2", "type": "light", "on": { "on": false } },
        { "id": "a1", "type": "light", "dimming": { "brightness": 0.0 } }
    ]));
    let report = apply_batch(&mut registry, decode_batch(&raw).unwrap());

    assert_eq!(report.lights_patched, 2);
    let hall = registry.get(1).unwrap();
    assert!(!hall.power);
    assert_eq!(hall.brightness, Brightness::new(50));
    let desk = registry.get(0).unwrap();
    assert!(desk.power);
    assert_eq!(desk.brightness, Brightness::MIN);
}

#[tokio::test]
async fn disconnect_event_marks_owner_unreachable() {
    let gw = gateway();
    let mut registry = refreshed(&gw).await;

    let raw = payload(&json!([{
        "id": "zc-1",
        "type": "zigbee_connectivity",
        "owner": { "rid": "dev-hall", "rtype": "device" },
        "status": "disconnected"
    }]));
    apply_batch(&mut registry, decode_batch(&raw).unwrap());

    let reachable: Vec<bool> = registry.iter().map(|l| l.reachable).collect();
    assert_eq!(reachable, [true, false, false]);
}

#[tokio::test]
async fn later_record_wins_across_kinds_in_one_batch() {
    let gw = gateway();
    let mut registry = refreshed(&gw).await;

    let disconnect = |owner: &str| {
        json!({
            "id": format!("zc-{owner}"),
            "type": "zigbee_connectivity",
            "owner": { "rid": owner, "rtype": "device" },
            "status": "disconnected"
        })
    };
    let raw = payload(&json!([
        disconnect("dev-hall"),
        { "id": "b2", "type": "light", "on": { "on": false } },
        disconnect("dev-desk"),
    ]));
    apply_batch(&mut registry, decode_batch(&raw).unwrap());

    let reachable: Vec<bool> = registry.iter().map(|l| l.reachable).collect();
    assert_eq!(reachable, [false, true, false]);

    // Same owner, reversed order: the disconnect now comes last.
    let raw = payload(&json!([
        { "id": "b2", "type": "light", "on": { "on": true } },
        disconnect("dev-hall"),
    ]));
    apply_batch(&mut registry, decode_batch(&raw).unwrap());

    let hall = registry.get(1).unwrap();
    assert!(hall.power);
    assert!(!hall.reachable);
}

#[tokio::test]
async fn unknown_kinds_do_not_affect_the_result() {
    let gw = gateway();
    let mut with_noise = refreshed(&gw).await;
    let mut without_noise = refreshed(&gw).await;

    let light = json!({ "id": "a1", "type": "light", "on": { "on": false } });
    let noise = json!({ "id": "room-1", "type": "grouped_light", "on": { "on": true } });

    apply_batch(
        &mut with_noise,
        decode_batch(&payload(&json!([light, noise]))).unwrap(),
    );
    apply_batch(
        &mut without_noise,
        decode_batch(&payload(&json!([light]))).unwrap(),
    );

    assert_eq!(
        serde_json::to_vec(&with_noise).unwrap(),
        serde_json::to_vec(&without_noise).unwrap()
    );
}

#[tokio::test]
async fn malformed_payload_is_rejected_without_touching_state() {
    let gw = gateway();
    let registry = refreshed(&gw).await;
    let before = serde_json::to_vec(&registry).unwrap();

    assert!(decode_batch(b"{ not json").is_err());
    assert_eq!(serde_json::to_vec(&registry).unwrap(), before);
}
