pub mod events;

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::session::{Session, SessionTable};
use events::ServerEvent;

const CHANNEL_CAPACITY: usize = 64;

/// One broadcast frame on a room channel. Each subscriber decides locally
/// whether the frame is for it: everything skips the originating connection
/// except frames flagged `echo` (the server-confirmed newMessage record).
#[derive(Debug, Clone)]
pub struct RoomEnvelope {
    pub origin: Option<Uuid>,
    pub echo: bool,
    pub json: String,
}

impl RoomEnvelope {
    pub fn wants(&self, conn_id: Uuid) -> bool {
        self.echo || self.origin != Some(conn_id)
    }
}

struct RelayInner {
    rooms: DashMap<String, broadcast::Sender<RoomEnvelope>>,
    devices: DashMap<String, broadcast::Sender<String>>,
    sessions: SessionTable,
}

/// The event router: owns the room- and device-scoped channels plus the
/// session table, and fans events out to the live members of a room. Purely
/// in-memory; storage side effects happen before anything is handed to it.
#[derive(Clone)]
pub struct Relay {
    inner: Arc<RelayInner>,
}

impl Default for Relay {
    fn default() -> Self {
        Relay {
            inner: Arc::new(RelayInner {
                rooms: DashMap::new(),
                devices: DashMap::new(),
                sessions: SessionTable::default(),
            }),
        }
    }
}

impl Relay {
    pub fn sessions(&self) -> &SessionTable {
        &self.inner.sessions
    }

    pub fn subscribe_room(&self, room_id: &str) -> broadcast::Receiver<RoomEnvelope> {
        self.inner
            .rooms
            .entry(room_id.to_owned())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    pub fn subscribe_device(&self, device_id: &str) -> broadcast::Receiver<String> {
        self.inner
            .devices
            .entry(device_id.to_owned())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Fans an event out on the room channel. `origin` is skipped by its own
    /// forwarding task unless `echo` is set. A room nobody is connected to is
    /// a no-op.
    pub fn room_send(&self, room_id: &str, origin: Option<Uuid>, echo: bool, event: &ServerEvent) {
        if let Some(tx) = self.inner.rooms.get(room_id) {
            let _ = tx.send(RoomEnvelope {
                origin,
                echo,
                json: event.to_json(),
            });
        }
    }

    /// Pushes an event to a device-scoped channel. Dropped silently when the
    /// device never registered or has gone away.
    pub fn device_send(&self, device_id: &str, event: &ServerEvent) {
        if let Some(tx) = self.inner.devices.get(device_id) {
            let _ = tx.send(event.to_json());
        }
    }

    /// Drops channels that lost their last subscriber. Called from the
    /// connection teardown path.
    pub fn collect_idle(&self, room_id: &str, device_id: &str) {
        self.inner
            .rooms
            .remove_if(room_id, |_, tx| tx.receiver_count() == 0);
        self.inner
            .devices
            .remove_if(device_id, |_, tx| tx.receiver_count() == 0);
    }

    pub fn bind(&self, conn_id: Uuid, session: Session) {
        self.inner
            .sessions
            .bind(conn_id, session.device_id, session.room_id);
    }

    pub fn lookup(&self, conn_id: Uuid) -> Option<Session> {
        self.inner.sessions.lookup(conn_id)
    }

    pub fn unbind(&self, conn_id: Uuid) -> Option<Session> {
        self.inner.sessions.unbind(conn_id)
    }
}
