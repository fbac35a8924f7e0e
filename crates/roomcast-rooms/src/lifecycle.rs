//! Connection lifecycle: register, join, leave, disconnect.

use crate::registry::RoomRegistry;
use roomcast_types::{ConnectionId, DeviceRole, ServerEvent};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

/// Active sessions: connection id -> serialized-event sender.
type SessionMap = HashMap<ConnectionId, mpsc::Sender<String>>;

/// Owns the live device sessions and drives room membership through the
/// [`RoomRegistry`].
///
/// Per connection, the state machine is connected (unjoined) -> joined ->
/// back to unjoined on leave, and terminated on disconnect. None of these
/// operations ever returns an error: transport disconnects race with
/// explicit leaves, so every transition has to be safe as a repeated,
/// order-insensitive correction and inconsistencies degrade to no-ops.
#[derive(Debug, Clone, Default)]
pub struct ConnectionManager {
    registry: RoomRegistry,
    sessions: Arc<RwLock<SessionMap>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry backing this manager, for read-only status queries.
    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Registers a freshly connected device. The sender is this device's
    /// outbound event queue; the connection starts unjoined.
    pub async fn register(&self, connection_id: ConnectionId, sender: mpsc::Sender<String>) {
        self.sessions.write().await.insert(connection_id, sender);
    }

    /// Joins the connection to a room in the given role.
    ///
    /// Membership is exclusive; a connection joined elsewhere is vacated from
    /// its previous room first. Every current member of the room (the joiner
    /// included) is then sent a `room_status` event with updated counts.
    pub async fn join(&self, connection_id: ConnectionId, room_id: &str, role: DeviceRole) {
        self.registry.add_member(room_id, connection_id, role).await;

        let (microphones, speakers) = self.registry.snapshot_counts(room_id).await;
        let status = ServerEvent::RoomStatus {
            room_id: room_id.to_string(),
            microphones,
            speakers,
        };
        match serde_json::to_string(&status) {
            Ok(json) => self.broadcast_room(room_id, json).await,
            Err(e) => {
                tracing::error!(room_id = %room_id, "failed to serialize room_status: {}", e);
            }
        }
    }

    /// Leaves the room, returning the connection to the unjoined state. The
    /// session stays alive and may re-join. No status event is emitted.
    pub async fn leave(&self, connection_id: ConnectionId, room_id: &str) {
        self.registry.remove_member(room_id, connection_id).await;
    }

    /// Terminal transition for an abruptly closed transport link.
    ///
    /// The connection's cached room affiliation is not trusted; the registry
    /// clears whatever membership actually exists. Idempotent.
    pub async fn disconnect(&self, connection_id: ConnectionId) {
        self.registry
            .remove_member_from_all_rooms(connection_id)
            .await;
        self.sessions.write().await.remove(&connection_id);
    }

    /// Point-in-time `(microphones, speakers)` counts for a room.
    pub async fn snapshot_counts(&self, room_id: &str) -> (usize, usize) {
        self.registry.snapshot_counts(room_id).await
    }

    /// Atomic snapshot of the room's current speaker connections.
    pub async fn snapshot_speakers(&self, room_id: &str) -> Vec<ConnectionId> {
        self.registry.snapshot_speakers(room_id).await
    }

    /// Sends a serialized event to one connection. Best-effort: a missing
    /// session is a no-op and a full queue drops the message with a warning.
    pub async fn send(&self, connection_id: ConnectionId, message_json: String) {
        let sessions = self.sessions.read().await;
        if let Some(sender) = sessions.get(&connection_id) {
            if let Err(e) = sender.try_send(message_json) {
                tracing::warn!(
                    connection_id = %connection_id,
                    "dropping event for slow consumer: {}",
                    e
                );
            }
        }
    }

    /// Sends a serialized event to every member of a room, both roles. Each
    /// send is independent; one slow or vanished consumer never blocks the
    /// rest.
    pub async fn broadcast_room(&self, room_id: &str, message_json: String) {
        let members = self.registry.snapshot_members(room_id).await;
        let sessions = self.sessions.read().await;
        for connection_id in members {
            if let Some(sender) = sessions.get(&connection_id) {
                if let Err(e) = sender.try_send(message_json.clone()) {
                    tracing::warn!(
                        connection_id = %connection_id,
                        room_id = %room_id,
                        "dropping broadcast for slow consumer: {}",
                        e
                    );
                }
            }
        }
    }
}
