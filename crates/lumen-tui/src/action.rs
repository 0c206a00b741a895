//! UI actions. Every state change in the app goes through one of these.

use bytes::Bytes;

/// Notification severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A transient message shown over the lights table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

impl Notification {
    fn with_level(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::with_level(NotificationLevel::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::with_level(NotificationLevel::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::with_level(NotificationLevel::Warning, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::with_level(NotificationLevel::Info, message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // ── Lifecycle ──────────────────────────────────────────────────
    Quit,
    Tick,
    Render,
    Resize(u16, u16),

    // ── Navigation ────────────────────────────────────────────────
    CursorUp,
    CursorDown,
    ToggleMark,

    // ── Light control ─────────────────────────────────────────────
    TogglePower,
    /// Step brightness of the marked lights by this many points.
    StepBrightness(i32),
    Refresh,

    // ── Command line ──────────────────────────────────────────────
    OpenCommand,
    CommandInput(char),
    CommandBackspace,
    CancelCommand,
    SubmitCommand,

    // ── Bridge ────────────────────────────────────────────────────
    BridgeEvent(Bytes),

    DismissNotification,
}
