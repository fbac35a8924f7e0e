//! Shared types and constants for the roomcast relay.
//!
//! Provides the foundational vocabulary used across all roomcast crates:
//! device roles, connection identifiers, and the wire event shapes exchanged
//! over the real-time channel.
//!
//! No crate in the workspace depends on anything *except* `roomcast-types`
//! for cross-cutting type definitions. This keeps the dependency graph clean
//! and prevents circular dependencies.

use serde::{Deserialize, Serialize};

pub mod event;

pub use event::{ClientEvent, ServerEvent};

/// Identifier of one live transport-level device link.
///
/// Assigned at connect time and unique per link; ids are never reused.
/// Destroyed with the link; rooms hold these ids as non-owning references
/// only.
pub type ConnectionId = uuid::Uuid;

/// Room id used when an upload does not name one.
pub const DEFAULT_ROOM_ID: &str = "default";

/// The role a device plays inside a room.
///
/// Microphones produce uploads; speakers receive `play_audio` deliveries.
/// Serialized as the lowercase wire strings `"microphone"` / `"speaker"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceRole {
    Microphone,
    Speaker,
}

impl DeviceRole {
    /// Returns the wire/log label for this role.
    pub fn label(self) -> &'static str {
        match self {
            Self::Microphone => "microphone",
            Self::Speaker => "speaker",
        }
    }
}
