use dashmap::DashMap;
use uuid::Uuid;

/// What a live connection represents once it has joined a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub device_id: String,
    pub room_id: String,
}

/// In-memory map from connection id to session. This is the authoritative
/// record of who is connected to which room right now; it is never persisted,
/// so a reconnect has to present its claim again. Entries must not outlive
/// their connection.
#[derive(Default)]
pub struct SessionTable {
    entries: DashMap<Uuid, Session>,
}

impl SessionTable {
    /// Overwrites any prior binding for the same connection.
    pub fn bind(&self, conn_id: Uuid, device_id: String, room_id: String) {
        self.entries.insert(conn_id, Session { device_id, room_id });
    }

    pub fn lookup(&self, conn_id: Uuid) -> Option<Session> {
        self.entries.get(&conn_id).map(|s| s.clone())
    }

    /// Removes and returns the binding, if any.
    pub fn unbind(&self, conn_id: Uuid) -> Option<Session> {
        self.entries.remove(&conn_id).map(|(_, s)| s)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
