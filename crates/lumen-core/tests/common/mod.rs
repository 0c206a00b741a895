// Shared in-memory gateway for lumen-core integration tests.
#![allow(dead_code, clippy::unwrap_used)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use lumen_core::{
    Brightness, ConnectivityStatus, CoreError, LightGateway, LightId, LightInfo, OwnerId, Scene,
    SceneId,
};

/// One gateway call, as recorded by [`MockGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListLights,
    GetLight(String),
    ListScenes,
    SetPower(String, bool),
    SetBrightness(String, u8),
    RecallScene(String),
    ListConnectivity,
}

impl Call {
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::SetPower(..) | Self::SetBrightness(..) | Self::RecallScene(_)
        )
    }
}

#[derive(Default)]
struct State {
    lights: HashMap<LightId, LightInfo>,
    connectivity: HashMap<OwnerId, ConnectivityStatus>,
    scenes: Vec<Scene>,
    calls: Vec<Call>,
    fail_listing: bool,
    fail_connectivity: bool,
    failing_lights: HashSet<LightId>,
}

/// Gateway that keeps light state in memory and applies mutations to it,
/// so a refresh after a batch sees the new values.
#[derive(Default)]
pub struct MockGateway {
    state: Mutex<State>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_light(
        self,
        id: &str,
        name: &str,
        power: bool,
        brightness: i32,
        owner: Option<&str>,
    ) -> Self {
        let info = LightInfo {
            id: id.into(),
            name: name.into(),
            archetype: "classic_bulb".into(),
            power,
            brightness: Brightness::new(brightness),
            owner_id: owner.map(OwnerId::from),
        };
        self.state.lock().unwrap().lights.insert(info.id.clone(), info);
        self
    }

    pub fn with_connectivity(self, owner: &str, status: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .connectivity
            .insert(owner.into(), ConnectivityStatus::parse(status));
        self
    }

    pub fn with_scene(self, id: &str, name: &str) -> Self {
        self.state.lock().unwrap().scenes.push(Scene {
            id: id.into(),
            name: name.into(),
        });
        self
    }

    pub fn set_fail_listing(&self, fail: bool) {
        self.state.lock().unwrap().fail_listing = fail;
    }

    pub fn set_fail_connectivity(&self, fail: bool) {
        self.state.lock().unwrap().fail_connectivity = fail;
    }

    pub fn fail_light(&self, id: &str) {
        self.state.lock().unwrap().failing_lights.insert(id.into());
    }

    /// Change a light behind the client's back (another app, a wall switch).
    pub fn external_set_power(&self, id: &str, power: bool) {
        let mut state = self.state.lock().unwrap();
        state.lights.get_mut(&LightId::from(id)).unwrap().power = power;
    }

    pub fn light(&self, id: &str) -> LightInfo {
        self.state.lock().unwrap().lights[&LightId::from(id)].clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn check_light(&self, id: &LightId) -> Result<(), CoreError> {
        let state = self.state.lock().unwrap();
        if state.failing_lights.contains(id) {
            return Err(CoreError::Gateway {
                message: format!("light {id} did not respond"),
                status: Some(503),
            });
        }
        if !state.lights.contains_key(id) {
            return Err(CoreError::light_not_found(id));
        }
        Ok(())
    }
}

fn unavailable() -> CoreError {
    CoreError::Gateway {
        message: "bridge unavailable".into(),
        status: None,
    }
}

#[async_trait]
impl LightGateway for MockGateway {
    async fn list_lights(&self) -> Result<HashMap<LightId, LightInfo>, CoreError> {
        self.record(Call::ListLights);
        let state = self.state.lock().unwrap();
        if state.fail_listing {
            return Err(unavailable());
        }
        Ok(state.lights.clone())
    }

    async fn get_light(&self, id: &LightId) -> Result<LightInfo, CoreError> {
        self.record(Call::GetLight(id.to_string()));
        self.check_light(id)?;
        Ok(self.state.lock().unwrap().lights[id].clone())
    }

    async fn list_scenes(&self) -> Result<Vec<Scene>, CoreError> {
        self.record(Call::ListScenes);
        Ok(self.state.lock().unwrap().scenes.clone())
    }

    async fn set_power(&self, id: &LightId, on: bool) -> Result<(), CoreError> {
        self.record(Call::SetPower(id.to_string(), on));
        self.check_light(id)?;
        self.state.lock().unwrap().lights.get_mut(id).unwrap().power = on;
        Ok(())
    }

    async fn set_brightness(
        &self,
        id: &LightId,
        brightness: Brightness,
    ) -> Result<(), CoreError> {
        self.record(Call::SetBrightness(id.to_string(), brightness.percent()));
        self.check_light(id)?;
        self.state
            .lock()
            .unwrap()
            .lights
            .get_mut(id)
            .unwrap()
            .brightness = brightness;
        Ok(())
    }

    async fn recall_scene(&self, id: &SceneId) -> Result<(), CoreError> {
        self.record(Call::RecallScene(id.to_string()));
        Ok(())
    }

    async fn list_connectivity(&self) -> Result<HashMap<OwnerId, ConnectivityStatus>, CoreError> {
        self.record(Call::ListConnectivity);
        let state = self.state.lock().unwrap();
        if state.fail_connectivity {
            return Err(unavailable());
        }
        Ok(state.connectivity.clone())
    }
}
