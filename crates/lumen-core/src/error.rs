// ── Core error types ──
//
// User-facing errors from lumen-core. Consumers never see HTTP status
// codes or JSON parse failures directly: the `From<lumen_api::Error>` impl
// folds transport-layer errors into a recoverable gateway error.

use thiserror::Error;

/// Unified error type for the core crate.
///
/// Nothing here is fatal to the process. Callers log the error, skip the
/// affected light or command, and keep running.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Gateway errors ───────────────────────────────────────────────
    #[error("Bridge request failed: {message}")]
    Gateway {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    #[error("Bridge rejected the application key")]
    AuthenticationFailed,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    #[error("Scene not found: {name}")]
    SceneNotFound { name: String },

    // ── Command errors ───────────────────────────────────────────────
    #[error("Usage: {usage}")]
    Usage { usage: String },

    #[error("Unknown command: {command}")]
    UnknownCommand { command: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    pub fn light_not_found(id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity_type: "Light".into(),
            identifier: id.to_string(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<lumen_api::Error> for CoreError {
    fn from(err: lumen_api::Error) -> Self {
        if err.is_not_found() {
            return CoreError::NotFound {
                entity_type: "Resource".into(),
                identifier: err.to_string(),
            };
        }

        match err {
            lumen_api::Error::InvalidAppKey => CoreError::AuthenticationFailed,
            lumen_api::Error::MalformedAppKey(message) | lumen_api::Error::Tls(message) => {
                CoreError::Config { message }
            }
            lumen_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("invalid bridge URL: {e}"),
            },
            lumen_api::Error::Bridge { status, message } => CoreError::Gateway {
                message,
                status: Some(status),
            },
            lumen_api::Error::Transport(ref e) => CoreError::Gateway {
                status: e.status().map(|s| s.as_u16()),
                message: err.to_string(),
            },
            other => CoreError::Gateway {
                message: other.to_string(),
                status: None,
            },
        }
    }
}
