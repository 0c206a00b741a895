//! Live state-reconciliation core for the lumen light client.
//!
//! - **[`LightRegistry`]**: the authoritative, single-owner snapshot of all
//!   known lights and their reachability.
//! - **[`decode`]**: turns raw event-stream payloads into [`ChangeRecord`]s.
//! - **[`reconcile`]**: full refresh from a [`LightGateway`] snapshot and
//!   the incremental merge of change records.
//! - **[`Selection`]**: cursor plus id-keyed marks for batch operations.
//! - **[`command`]**: the command vocabulary and the batch operations
//!   bound to keys.
//!
//! The registry and selection are plain owned values. Whoever holds them
//! (the TUI event loop) is the only writer; nothing here spawns tasks or
//! takes locks.

pub mod command;
pub mod config;
pub mod convert;
pub mod decode;
pub mod error;
pub mod gateway;
pub mod model;
pub mod reconcile;
pub mod registry;
pub mod selection;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{BatchReport, Command, CommandOutcome};
pub use config::{BridgeConfig, TlsVerification};
pub use decode::{ChangeRecord, DecodeError, decode_batch};
pub use error::CoreError;
pub use gateway::{BridgeGateway, LightGateway};
pub use model::{Brightness, ConnectivityStatus, Light, LightId, LightInfo, OwnerId, Scene, SceneId};
pub use reconcile::{MergeReport, apply_batch, full_refresh};
pub use registry::{LightPatch, LightRegistry};
pub use selection::Selection;
