//! Shared configuration for the lumen client.
//!
//! TOML profiles, app-key resolution (env + keyring + plaintext), an
//! openhue `config.yaml` fallback, and translation to
//! `lumen_core::BridgeConfig`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::{BaseDirs, ProjectDirs};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use lumen_core::{BridgeConfig, TlsVerification};

const KEYRING_SERVICE: &str = "lumen";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no application key configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{profile}' not found")]
    UnknownProfile { profile: String },

    #[error("no bridge configured: pass --bridge and --app-key, add a profile, or create {openhue}")]
    NotConfigured { openhue: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("invalid openhue config: {0}")]
    OpenHue(#[from] serde_yaml::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named bridge profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default)]
    pub insecure: bool,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Full refresh interval in seconds; 0 disables polling.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            insecure: false,
            timeout: default_timeout(),
            refresh_interval: default_refresh_interval(),
        }
    }
}

fn default_timeout() -> u64 {
    10
}
fn default_refresh_interval() -> u64 {
    60
}

/// A named bridge profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Bridge host or base URL (e.g., "192.168.1.20").
    pub bridge: String,

    /// Application key (plaintext; prefer keyring or env var).
    pub app_key: Option<String>,

    /// Environment variable name containing the application key.
    pub app_key_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout.
    pub timeout: Option<u64>,

    /// Override refresh interval.
    pub refresh_interval: Option<u64>,

    /// Subscribe to the bridge event stream (default on).
    pub event_stream: Option<bool>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "lumen", "lumen").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("lumen");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load Config from `path` merged with `LUMEN_`-prefixed environment
/// variables (`LUMEN_DEFAULTS__TIMEOUT=5`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("LUMEN_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

/// Add or replace a profile in the canonical config file.
pub fn save_profile(name: &str, profile: Profile) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    let mut cfg = load_config_from(&path)?;
    cfg.profiles.insert(name.to_owned(), profile);
    if cfg.default_profile.is_none() {
        cfg.default_profile = Some(name.to_owned());
    }
    save_config_to(&cfg, &path)?;
    Ok(path)
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve an application key: `app_key_env` variable, then the system
/// keyring (`lumen` / `<profile>/app-key`), then plaintext.
pub fn resolve_app_key(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    resolve_app_key_with(
        profile,
        profile_name,
        |name| std::env::var(name).ok(),
        |account| {
            keyring::Entry::new(KEYRING_SERVICE, account)
                .and_then(|entry| entry.get_password())
                .ok()
        },
    )
}

/// [`resolve_app_key`] with explicit env and keyring lookups.
pub fn resolve_app_key_with(
    profile: &Profile,
    profile_name: &str,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    // 1. Profile's app_key_env → env var lookup
    if let Some(val) = profile.app_key_env.as_deref().and_then(&env) {
        return Ok(SecretString::from(val));
    }

    // 2. System keyring
    if let Some(secret) = keyring(&format!("{profile_name}/app-key")) {
        return Ok(SecretString::from(secret));
    }

    // 3. Plaintext in config
    if let Some(ref key) = profile.app_key {
        return Ok(SecretString::from(key.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

// ── Translation to BridgeConfig ─────────────────────────────────────

/// Parse a bridge host or URL. Bare hosts get `https://`.
pub fn bridge_url(raw: &str) -> Result<Url, ConfigError> {
    let raw = raw.trim();
    let candidate = if raw.contains("://") {
        raw.to_owned()
    } else {
        format!("https://{raw}")
    };
    match Url::parse(&candidate) {
        Ok(url) if url.host().is_some() => Ok(url),
        _ => Err(ConfigError::Validation {
            field: "bridge".into(),
            reason: format!("invalid bridge address: {raw:?}"),
        }),
    }
}

/// Build a `BridgeConfig` from a resolved address and key plus defaults.
pub fn bridge_config(url: Url, app_key: SecretString, defaults: &Defaults) -> BridgeConfig {
    let mut config = BridgeConfig::new(url, app_key);
    config.timeout = Duration::from_secs(defaults.timeout);
    config.refresh_interval_secs = defaults.refresh_interval;
    config
}

/// Build a `BridgeConfig` from a profile, falling back to `defaults`.
pub fn profile_to_bridge_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    app_key: SecretString,
) -> Result<BridgeConfig, ConfigError> {
    let url = bridge_url(&profile.bridge)?;
    let mut config = bridge_config(url, app_key, defaults);

    config.tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        // Bridges ship self-signed certificates.
        TlsVerification::DangerAcceptInvalid
    };

    if let Some(timeout) = profile.timeout {
        config.timeout = Duration::from_secs(timeout);
    }
    if let Some(interval) = profile.refresh_interval {
        config.refresh_interval_secs = interval;
    }
    config.event_stream_enabled = profile.event_stream.unwrap_or(true);

    debug!(profile = profile_name, bridge = %config.url, "Profile resolved");
    Ok(config)
}

// ── openhue fallback ────────────────────────────────────────────────

/// The `~/.openhue/config.yaml` written by the openhue CLI.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OpenHueConfig {
    pub bridge: String,
    pub key: String,
}

/// `~/.openhue/config.yaml`, if a home directory is known.
pub fn openhue_config_path() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.home_dir().join(".openhue").join("config.yaml"))
}

pub fn load_openhue_config(path: &Path) -> Result<OpenHueConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&raw)?)
}

// ── Top-level resolution ────────────────────────────────────────────

/// Resolve the bridge to use: the named (or default) lumen profile, else
/// an openhue config file.
pub fn resolve_bridge_config(profile_name: Option<&str>) -> Result<BridgeConfig, ConfigError> {
    let config = load_config()?;
    resolve_from(&config, profile_name, openhue_config_path().as_deref())
}

/// [`resolve_bridge_config`] against an already-loaded config.
pub fn resolve_from(
    config: &Config,
    profile_name: Option<&str>,
    openhue_path: Option<&Path>,
) -> Result<BridgeConfig, ConfigError> {
    let name = profile_name
        .map(str::to_owned)
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into());

    if let Some(profile) = config.profiles.get(&name) {
        let app_key = resolve_app_key(profile, &name)?;
        return profile_to_bridge_config(profile, &name, &config.defaults, app_key);
    }

    // An explicitly requested profile must exist.
    if profile_name.is_some() {
        return Err(ConfigError::UnknownProfile { profile: name });
    }

    match openhue_path {
        Some(path) if path.exists() => {
            debug!(path = %path.display(), "Using openhue config");
            let openhue = load_openhue_config(path)?;
            let url = bridge_url(&openhue.bridge)?;
            Ok(bridge_config(
                url,
                SecretString::from(openhue.key),
                &config.defaults,
            ))
        }
        _ => Err(ConfigError::NotConfigured {
            openhue: openhue_path.map_or_else(
                || "~/.openhue/config.yaml".into(),
                |p| p.display().to_string(),
            ),
        }),
    }
}
