//! Wire event shapes for the real-time channel.
//!
//! Both directions use externally tagged JSON (`{"type": "...", ...}`) with
//! snake_case payload fields. Inbound frames are validated at the boundary:
//! anything that fails to parse is answered with a [`ServerEvent::Error`]
//! and otherwise ignored.

use crate::DeviceRole;
use serde::{Deserialize, Serialize};

/// Events a device sends to the server.
///
/// Transport-level disconnect carries no payload and is not represented
/// here; the connection handler observes it as stream termination.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    #[serde(rename = "join_room")]
    JoinRoom {
        room_id: String,
        device_type: DeviceRole,
    },
    #[serde(rename = "leave_room")]
    LeaveRoom { room_id: String },
}

/// Events the server pushes to devices.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Broadcast to every member of a room when membership changes.
    #[serde(rename = "room_status")]
    RoomStatus {
        room_id: String,
        microphones: usize,
        speakers: usize,
    },
    /// Broadcast to a room's speakers on successful pipeline completion.
    /// `audio_data` is base64; audio is opaque bytes everywhere else.
    #[serde(rename = "play_audio")]
    PlayAudio {
        audio_data: String,
        transcript: String,
    },
    /// Sent to a single device when its frame could not be handled.
    #[serde(rename = "error")]
    Error { message: String },
}
