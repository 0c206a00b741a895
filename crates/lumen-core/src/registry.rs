// ── Light registry ──
//
// Authoritative in-process snapshot of every known light. Rebuilt
// wholesale by `replace`, patched in place by the event merge. Owned by a
// single task; no interior mutability.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::CoreError;
use crate::model::{Brightness, Light, LightId, OwnerId};

/// Fields an incremental update may touch. `None` leaves the field alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LightPatch {
    pub power: Option<bool>,
    pub brightness: Option<Brightness>,
    pub reachable: Option<bool>,
}

/// Ordered light list. Order is whatever the last `replace` supplied
/// (the reconciler sorts by id).
#[derive(Debug, Clone, Default, Serialize)]
pub struct LightRegistry {
    lights: Vec<Light>,
    #[serde(skip)]
    last_refresh: Option<DateTime<Utc>>,
}

impl LightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a complete new listing.
    pub fn replace(&mut self, lights: Vec<Light>) {
        self.lights = lights;
        self.last_refresh = Some(Utc::now());
    }

    pub fn find_by_id(&self, id: &LightId) -> Option<usize> {
        self.lights.iter().position(|l| &l.id == id)
    }

    /// Apply only the fields present in `patch`. Never adds or removes lights.
    pub fn patch(&mut self, id: &LightId, patch: LightPatch) -> Result<(), CoreError> {
        let light = self
            .lights
            .iter_mut()
            .find(|l| &l.id == id)
            .ok_or_else(|| CoreError::light_not_found(id))?;

        if let Some(power) = patch.power {
            light.power = power;
        }
        if let Some(brightness) = patch.brightness {
            light.brightness = brightness;
        }
        if let Some(reachable) = patch.reachable {
            light.reachable = reachable;
        }
        Ok(())
    }

    /// Set `reachable` on every light owned by `owner`. Returns how many
    /// lights matched.
    pub fn set_reachable_for_owner(&mut self, owner: &OwnerId, reachable: bool) -> usize {
        let mut matched = 0;
        for light in self
            .lights
            .iter_mut()
            .filter(|l| l.owner_id.as_ref() == Some(owner))
        {
            light.reachable = reachable;
            matched += 1;
        }
        matched
    }

    pub fn get(&self, index: usize) -> Option<&Light> {
        self.lights.get(index)
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Light> {
        self.lights.iter()
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    /// When `replace` last ran.
    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.last_refresh
    }
}

impl<'a> IntoIterator for &'a LightRegistry {
    type Item = &'a Light;
    type IntoIter = std::slice::Iter<'a, Light>;

    fn into_iter(self) -> Self::IntoIter {
        self.lights.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn light(id: &str, owner: Option<&str>) -> Light {
        Light {
            id: id.into(),
            name: format!("Light {id}"),
            archetype: "sultan_bulb".into(),
            power: true,
            brightness: Brightness::new(50),
            reachable: true,
            owner_id: owner.map(OwnerId::from),
        }
    }

    #[test]
    fn replace_swaps_everything_and_stamps_time() {
        let mut reg = LightRegistry::new();
        assert!(reg.last_refresh().is_none());
        reg.replace(vec![light("a", None), light("b", None)]);
        assert_eq!(reg.len(), 2);
        assert!(reg.last_refresh().is_some());

        reg.replace(vec![light("c", None)]);
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.find_by_id(&"c".into()), Some(0));
        assert_eq!(reg.find_by_id(&"a".into()), None);
    }

    #[test]
    fn patch_touches_only_present_fields() {
        let mut reg = LightRegistry::new();
        reg.replace(vec![light("a", None)]);

        reg.patch(
            &"a".into(),
            LightPatch {
                power: Some(false),
                ..LightPatch::default()
            },
        )
        .unwrap();

        let a = reg.get(0).unwrap();
        assert!(!a.power);
        assert_eq!(a.brightness, Brightness::new(50));
        assert!(a.reachable);
    }

    #[test]
    fn patch_unknown_id_is_not_found() {
        let mut reg = LightRegistry::new();
        reg.replace(vec![light("a", None)]);
        let err = reg.patch(&"zz".into(), LightPatch::default()).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn owner_reachability_hits_only_that_owner() {
        let mut reg = LightRegistry::new();
        reg.replace(vec![
            light("a", Some("dev-1")),
            light("b", Some("dev-1")),
            light("c", Some("dev-2")),
            light("d", None),
        ]);

        let matched = reg.set_reachable_for_owner(&"dev-1".into(), false);
        assert_eq!(matched, 2);
        let reachable: Vec<bool> = reg.iter().map(|l| l.reachable).collect();
        assert_eq!(reachable, [false, false, true, true]);
    }
}
