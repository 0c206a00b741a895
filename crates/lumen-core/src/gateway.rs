// ── Device gateway ──
//
// The abstract device API the core drives: listing, per-light mutation,
// scenes and connectivity. `BridgeGateway` binds it to the bridge REST
// client; tests substitute an in-memory implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::debug;

use lumen_api::BridgeClient;
use lumen_api::types::LightUpdate;

use crate::config::BridgeConfig;
use crate::error::CoreError;
use crate::model::{Brightness, ConnectivityStatus, LightId, LightInfo, OwnerId, Scene, SceneId};

#[async_trait]
pub trait LightGateway: Send + Sync {
    /// Complete light listing keyed by id. Order is unspecified.
    async fn list_lights(&self) -> Result<HashMap<LightId, LightInfo>, CoreError>;

    /// Current state of one light, read fresh from the device.
    async fn get_light(&self, id: &LightId) -> Result<LightInfo, CoreError> {
        self.list_lights()
            .await?
            .remove(id)
            .ok_or_else(|| CoreError::light_not_found(id))
    }

    async fn list_scenes(&self) -> Result<Vec<Scene>, CoreError>;

    async fn set_power(&self, id: &LightId, on: bool) -> Result<(), CoreError>;

    async fn set_brightness(&self, id: &LightId, brightness: Brightness)
    -> Result<(), CoreError>;

    async fn recall_scene(&self, id: &SceneId) -> Result<(), CoreError>;

    /// Link status per owning device.
    async fn list_connectivity(&self) -> Result<HashMap<OwnerId, ConnectivityStatus>, CoreError>;
}

// ── Bridge binding ──────────────────────────────────────────────────

/// [`LightGateway`] backed by the bridge's CLIP v2 API.
#[derive(Debug, Clone)]
pub struct BridgeGateway {
    client: BridgeClient,
}

impl BridgeGateway {
    pub fn connect(config: &BridgeConfig) -> Result<Self, CoreError> {
        let client =
            BridgeClient::from_app_key(config.url.as_str(), &config.app_key, &config.transport())?;
        debug!(bridge = %client.base_url(), "Bridge client ready");
        Ok(Self { client })
    }

    pub fn from_client(client: BridgeClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LightGateway for BridgeGateway {
    async fn list_lights(&self) -> Result<HashMap<LightId, LightInfo>, CoreError> {
        let lights = self.client.list_lights().await?;
        Ok(lights
            .into_iter()
            .map(LightInfo::from)
            .map(|info| (info.id.clone(), info))
            .collect())
    }

    async fn get_light(&self, id: &LightId) -> Result<LightInfo, CoreError> {
        Ok(self.client.get_light(id.as_str()).await?.into())
    }

    async fn list_scenes(&self) -> Result<Vec<Scene>, CoreError> {
        let scenes = self.client.list_scenes().await?;
        Ok(scenes.into_iter().map(Scene::from).collect())
    }

    async fn set_power(&self, id: &LightId, on: bool) -> Result<(), CoreError> {
        self.client
            .update_light(id.as_str(), &LightUpdate::power(on))
            .await?;
        Ok(())
    }

    async fn set_brightness(
        &self,
        id: &LightId,
        brightness: Brightness,
    ) -> Result<(), CoreError> {
        self.client
            .update_light(id.as_str(), &LightUpdate::brightness(brightness.as_f64()))
            .await?;
        Ok(())
    }

    async fn recall_scene(&self, id: &SceneId) -> Result<(), CoreError> {
        self.client.recall_scene(id.as_str()).await?;
        Ok(())
    }

    async fn list_connectivity(&self) -> Result<HashMap<OwnerId, ConnectivityStatus>, CoreError> {
        let entries = self.client.list_zigbee_connectivity().await?;
        Ok(entries
            .into_iter()
            .filter(|c| !c.owner.rid.is_empty())
            .map(|c| (OwnerId::from(c.owner.rid), ConnectivityStatus::parse(&c.status)))
            .collect())
    }
}
