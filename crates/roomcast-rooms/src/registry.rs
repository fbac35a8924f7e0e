//! Room table: room id -> role-partitioned member sets.

use roomcast_types::{ConnectionId, DeviceRole};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Membership of a single room, partitioned by device role.
#[derive(Debug, Default)]
struct RoomMembers {
    microphones: HashSet<ConnectionId>,
    speakers: HashSet<ConnectionId>,
}

impl RoomMembers {
    fn role_set_mut(&mut self, role: DeviceRole) -> &mut HashSet<ConnectionId> {
        match role {
            DeviceRole::Microphone => &mut self.microphones,
            DeviceRole::Speaker => &mut self.speakers,
        }
    }

    /// Removes the id from both role-sets. Returns whether anything changed.
    fn remove(&mut self, connection_id: ConnectionId) -> bool {
        let from_mics = self.microphones.remove(&connection_id);
        let from_speakers = self.speakers.remove(&connection_id);
        from_mics || from_speakers
    }

    fn is_empty(&self) -> bool {
        self.microphones.is_empty() && self.speakers.is_empty()
    }
}

/// Forward room table plus the reverse index, mutated together under one
/// write guard so the single-membership invariant is never observable as
/// violated.
#[derive(Debug, Default)]
struct RegistryInner {
    rooms: HashMap<String, RoomMembers>,
    /// Reverse index: connection id -> the room it is currently joined to.
    /// Makes disconnect cleanup O(1) instead of a scan over every room.
    affiliations: HashMap<ConnectionId, String>,
}

impl RegistryInner {
    /// Removes the connection from its current room, if any, dropping the
    /// room entry once its last member leaves.
    fn vacate(&mut self, connection_id: ConnectionId) {
        let Some(room_id) = self.affiliations.remove(&connection_id) else {
            return;
        };
        if let Some(members) = self.rooms.get_mut(&room_id) {
            members.remove(connection_id);
            if members.is_empty() {
                self.rooms.remove(&room_id);
            }
        }
    }
}

/// Concurrency-safe registry of room memberships.
///
/// Every operation takes the single internal lock for the duration of a few
/// map operations; none of them can fail, and all removal paths are
/// idempotent no-ops when the room or member is already gone. Transport
/// disconnects race with explicit leaves, so these operations have to be
/// safe as repeated, order-insensitive corrections.
#[derive(Debug, Clone, Default)]
pub struct RoomRegistry {
    inner: Arc<RwLock<RegistryInner>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty room entry if one does not exist yet.
    ///
    /// Rooms are otherwise created lazily on first join; an entry emptied of
    /// members is dropped and recreated on demand.
    pub async fn ensure_room(&self, room_id: &str) {
        let mut inner = self.inner.write().await;
        inner.rooms.entry(room_id.to_string()).or_default();
    }

    /// Adds the connection to the named role-set, creating the room if
    /// absent. Idempotent: re-adding a present member leaves the registry in
    /// an identical state.
    ///
    /// A connection may belong to at most one role-set of at most one room;
    /// any existing membership elsewhere is vacated first.
    pub async fn add_member(&self, room_id: &str, connection_id: ConnectionId, role: DeviceRole) {
        let mut inner = self.inner.write().await;
        inner.vacate(connection_id);
        inner
            .rooms
            .entry(room_id.to_string())
            .or_default()
            .role_set_mut(role)
            .insert(connection_id);
        inner
            .affiliations
            .insert(connection_id, room_id.to_string());
    }

    /// Removes the connection from both role-sets of the room. No-op if the
    /// room or member does not exist; safe to call twice.
    pub async fn remove_member(&self, room_id: &str, connection_id: ConnectionId) {
        let mut inner = self.inner.write().await;
        let (removed, now_empty) = match inner.rooms.get_mut(room_id) {
            Some(members) => {
                let removed = members.remove(connection_id);
                (removed, removed && members.is_empty())
            }
            None => return,
        };
        if now_empty {
            inner.rooms.remove(room_id);
        }
        // Only clear the index entry if it still points at this room; the
        // connection may already have been moved by a later join.
        if removed && inner.affiliations.get(&connection_id).map(String::as_str) == Some(room_id) {
            inner.affiliations.remove(&connection_id);
        }
    }

    /// Removes the connection from whatever room it belongs to. Used for
    /// abrupt disconnects where the caller's idea of the room may be stale;
    /// the reverse index is the source of truth. Idempotent.
    pub async fn remove_member_from_all_rooms(&self, connection_id: ConnectionId) {
        let mut inner = self.inner.write().await;
        inner.vacate(connection_id);
    }

    /// Point-in-time `(microphones, speakers)` counts for status reporting.
    /// An unknown room reads as empty.
    pub async fn snapshot_counts(&self, room_id: &str) -> (usize, usize) {
        let inner = self.inner.read().await;
        match inner.rooms.get(room_id) {
            Some(members) => (members.microphones.len(), members.speakers.len()),
            None => (0, 0),
        }
    }

    /// Atomic snapshot of the room's current speakers, in a deterministic
    /// order. Membership may change between snapshot and use; delivery
    /// against the snapshot is best-effort by design.
    pub async fn snapshot_speakers(&self, room_id: &str) -> Vec<ConnectionId> {
        let inner = self.inner.read().await;
        let mut speakers: Vec<ConnectionId> = inner
            .rooms
            .get(room_id)
            .map(|members| members.speakers.iter().copied().collect())
            .unwrap_or_default();
        speakers.sort();
        speakers
    }

    /// Atomic snapshot of every member of the room, both roles.
    pub async fn snapshot_members(&self, room_id: &str) -> Vec<ConnectionId> {
        let inner = self.inner.read().await;
        let mut members: Vec<ConnectionId> = inner
            .rooms
            .get(room_id)
            .map(|m| m.microphones.iter().chain(m.speakers.iter()).copied().collect())
            .unwrap_or_default();
        members.sort();
        members
    }
}
