// Async HTTP client for the bridge CLIP v2 REST API.
//
// Base path: /clip/v2/resource/
// Auth: hue-application-key header

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;
use crate::types::{
    Envelope, LightResource, LightUpdate, SceneRecall, SceneResource, UpdatedRef,
    ZigbeeConnectivity,
};

/// Header carrying the bridge application key on every request.
pub const APP_KEY_HEADER: &str = "hue-application-key";

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the bridge REST API.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct BridgeClient {
    http: reqwest::Client,
    base_url: Url,
}

impl BridgeClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from an application key and transport config.
    ///
    /// `bridge` is either a bare host (`192.168.1.20`) or a full base URL.
    /// Bare hosts are reached over HTTPS.
    pub fn from_app_key(
        bridge: &str,
        app_key: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client(app_key_headers(app_key)?)?;
        let base_url = normalize_base_url(bridge)?;
        Ok(Self { http, base_url })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(bridge: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = normalize_base_url(bridge)?;
        Ok(Self { http, base_url })
    }

    /// The bridge root URL, always ending with `/`.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, Error> {
        let url = self.url(path)?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        handle_response(resp).await
    }

    async fn put<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("PUT {url}");

        let resp = self.http.put(url).json(body).send().await?;
        let _: Vec<UpdatedRef> = handle_response(resp).await?;
        Ok(())
    }

    // ── Lights ───────────────────────────────────────────────────────

    pub async fn list_lights(&self) -> Result<Vec<LightResource>, Error> {
        self.get("clip/v2/resource/light").await
    }

    pub async fn get_light(&self, id: &str) -> Result<LightResource, Error> {
        let mut lights: Vec<LightResource> =
            self.get(&format!("clip/v2/resource/light/{id}")).await?;
        lights.pop().ok_or_else(|| Error::Bridge {
            status: 404,
            message: format!("light {id} not found"),
        })
    }

    pub async fn update_light(&self, id: &str, update: &LightUpdate) -> Result<(), Error> {
        self.put(&format!("clip/v2/resource/light/{id}"), update)
            .await
    }

    // ── Scenes ───────────────────────────────────────────────────────

    pub async fn list_scenes(&self) -> Result<Vec<SceneResource>, Error> {
        self.get("clip/v2/resource/scene").await
    }

    pub async fn recall_scene(&self, id: &str) -> Result<(), Error> {
        self.put(&format!("clip/v2/resource/scene/{id}"), &SceneRecall::active())
            .await
    }

    // ── Connectivity ─────────────────────────────────────────────────

    pub async fn list_zigbee_connectivity(&self) -> Result<Vec<ZigbeeConnectivity>, Error> {
        self.get("clip/v2/resource/zigbee_connectivity").await
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

/// Default headers carrying the application key, marked sensitive so it
/// never shows up in debug output.
pub(crate) fn app_key_headers(app_key: &SecretString) -> Result<HeaderMap, Error> {
    let mut headers = HeaderMap::new();
    let mut key_value = HeaderValue::from_str(app_key.expose_secret())
        .map_err(|e| Error::MalformedAppKey(e.to_string()))?;
    key_value.set_sensitive(true);
    headers.insert(APP_KEY_HEADER, key_value);
    Ok(headers)
}

/// Turn `192.168.1.20`, `bridge.local:8443` or `https://host/` into a base
/// URL ending with `/`.
pub(crate) fn normalize_base_url(raw: &str) -> Result<Url, Error> {
    let raw = raw.trim();
    let mut url = if raw.contains("://") {
        Url::parse(raw)?
    } else {
        Url::parse(&format!("https://{raw}"))?
    };

    let path = url.path().trim_end_matches('/').to_owned();
    url.set_path(&format!("{path}/"));
    Ok(url)
}

// ── Response handling ────────────────────────────────────────────────

const PREVIEW_CHARS: usize = 200;

async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<Vec<T>, Error> {
    let status = resp.status();
    if !status.is_success() {
        return Err(parse_error(status, resp).await);
    }

    let body = resp.text().await?;
    let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|e| {
        Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body: body.clone(),
        }
    })?;

    if let Some(first) = envelope.errors.first() {
        return Err(Error::Bridge {
            status: status.as_u16(),
            message: first.description.clone(),
        });
    }

    Ok(envelope.data)
}

/// At most `PREVIEW_CHARS` characters of `body`, cut on a char boundary.
fn preview(body: &str) -> &str {
    body.char_indices()
        .nth(PREVIEW_CHARS)
        .map_or(body, |(end, _)| &body[..end])
}

async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Error::InvalidAppKey;
    }

    let raw = resp.text().await.unwrap_or_default();

    let message = serde_json::from_str::<Envelope<serde_json::Value>>(&raw)
        .ok()
        .and_then(|env| env.errors.into_iter().next())
        .map_or_else(
            || {
                if raw.is_empty() {
                    status.to_string()
                } else {
                    raw
                }
            },
            |err| err.description,
        );

    Error::Bridge {
        status: status.as_u16(),
        message,
    }
}
