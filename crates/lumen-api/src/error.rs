use thiserror::Error;

/// Top-level error type for the `lumen-api` crate.
///
/// Covers every failure mode of the bridge surface: transport, TLS,
/// application-key rejection, CLIP v2 error envelopes, and the event
/// stream. `lumen-core` folds these into its gateway error.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The bridge rejected the application key (HTTP 401/403).
    #[error("Invalid application key")]
    InvalidAppKey,

    /// The application key cannot be sent as a header value.
    #[error("Malformed application key: {0}")]
    MalformedAppKey(String),

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Bridge ──────────────────────────────────────────────────────
    /// Error reported by the bridge, either through a non-2xx status or
    /// a non-empty `errors` array in the CLIP v2 envelope.
    #[error("Bridge error (HTTP {status}): {message}")]
    Bridge { status: u16, message: String },

    // ── Event stream ────────────────────────────────────────────────
    /// The event stream could not be opened or dropped mid-read.
    #[error("Event stream error: {0}")]
    EventStream(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::EventStream(_) => true,
            Self::Bridge { status, .. } => *status == 503 || *status == 429,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Bridge { status: 404, .. } => true,
            _ => false,
        }
    }
}
