// ── Runtime bridge configuration ──
//
// Describes *how* to reach a bridge. Carries the application key and
// connection tuning but never touches disk; lumen-config builds it.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use lumen_api::{ReconnectConfig, TlsMode, TransportConfig};

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification. Bridges present self-signed certificates.
    #[default]
    DangerAcceptInvalid,
}

/// Configuration for talking to a single bridge.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Bridge root URL (e.g. `https://192.168.1.20/`).
    pub url: Url,
    /// Application key sent as `hue-application-key`.
    pub app_key: SecretString,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// How often to run a full refresh (seconds). 0 = only on demand.
    pub refresh_interval_secs: u64,
    /// Subscribe to the bridge event stream.
    pub event_stream_enabled: bool,
}

impl BridgeConfig {
    pub fn new(url: Url, app_key: SecretString) -> Self {
        Self {
            url,
            app_key,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(10),
            refresh_interval_secs: 60,
            event_stream_enabled: true,
        }
    }

    /// Translate into the api crate's transport settings.
    pub fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            tls,
            timeout: self.timeout,
        }
    }

    pub fn reconnect(&self) -> ReconnectConfig {
        ReconnectConfig::default()
    }

    /// `None` when periodic refresh is disabled.
    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.refresh_interval_secs > 0).then(|| Duration::from_secs(self.refresh_interval_secs))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config() -> BridgeConfig {
        BridgeConfig::new(
            Url::parse("https://192.168.1.20/").unwrap(),
            SecretString::from("key".to_string()),
        )
    }

    #[test]
    fn defaults_accept_self_signed_and_poll_every_minute() {
        let c = config();
        assert_eq!(c.tls, TlsVerification::DangerAcceptInvalid);
        assert_eq!(c.refresh_interval(), Some(Duration::from_secs(60)));
        assert!(matches!(c.transport().tls, TlsMode::DangerAcceptInvalid));
    }

    #[test]
    fn zero_interval_disables_polling() {
        let mut c = config();
        c.refresh_interval_secs = 0;
        assert_eq!(c.refresh_interval(), None);
    }
}
