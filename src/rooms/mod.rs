use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{mpsc, RwLock};
use tracing::debug;

pub use events::{ClientEvent, ServerEvent};

mod events;

/// Transport-side handle events are pushed into; the WebSocket layer forwards
/// them to the socket, tests read them straight off the channel.
pub type RoomSender = mpsc::UnboundedSender<ServerEvent>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomKey {
    pub camera_id: String,
    pub date: String,
}

impl RoomKey {
    pub fn new(camera_id: &str, date: &str) -> Self {
        Self {
            camera_id: camera_id.to_string(),
            date: date.to_string(),
        }
    }
}

impl std::fmt::Display for RoomKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.camera_id, self.date)
    }
}

/// Batch-processing status of one room. Completed is a permanent latch: it
/// survives the room emptying out, so a viewer rejoining an already-finished
/// date does not trigger reprocessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoomStatus {
    #[default]
    NotStarted,
    Running,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriberId(u64);

/// Groups connected viewers by `(camera, date)` and owns each room's
/// processing status.
#[derive(Default)]
pub struct RoomRegistry {
    next_id: AtomicU64,
    members: RwLock<HashMap<RoomKey, HashMap<u64, RoomSender>>>,
    status: RwLock<HashMap<RoomKey, RoomStatus>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn subscribe(&self, room: &RoomKey, sender: RoomSender) -> SubscriberId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.members
            .write()
            .await
            .entry(room.clone())
            .or_default()
            .insert(id, sender);
        SubscriberId(id)
    }

    /// Idempotent. An emptied room's subscriber set is dropped, but its
    /// Completed latch is left alone.
    pub async fn unsubscribe(&self, room: &RoomKey, id: SubscriberId) {
        let mut members = self.members.write().await;
        if let Some(room_members) = members.get_mut(room) {
            room_members.remove(&id.0);
            if room_members.is_empty() {
                debug!("Room {room} has no subscribers left");
                members.remove(room);
            }
        }
    }

    /// Fans the event out to every current member. Connections whose channel
    /// has closed are skipped; they clean themselves up on disconnect.
    pub async fn publish(&self, room: &RoomKey, event: &ServerEvent) -> usize {
        let members = self.members.read().await;
        let Some(room_members) = members.get(room) else {
            return 0;
        };

        let mut delivered = 0;
        for sender in room_members.values() {
            if sender.send(event.clone()).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    pub async fn member_count(&self, room: &RoomKey) -> usize {
        self.members
            .read()
            .await
            .get(room)
            .map_or(0, |members| members.len())
    }

    pub async fn status(&self, room: &RoomKey) -> RoomStatus {
        self.status
            .read()
            .await
            .get(room)
            .copied()
            .unwrap_or_default()
    }

    /// Marks the room Running. Returns false when the room already finished,
    /// in which case the caller must not process or publish anything.
    pub async fn begin_run(&self, room: &RoomKey) -> bool {
        let mut status = self.status.write().await;
        match status.get(room) {
            Some(RoomStatus::Completed) => false,
            _ => {
                status.insert(room.clone(), RoomStatus::Running);
                true
            }
        }
    }

    pub async fn complete_run(&self, room: &RoomKey) {
        self.status
            .write()
            .await
            .insert(room.clone(), RoomStatus::Completed);
    }

    pub async fn is_completed(&self, room: &RoomKey) -> bool {
        self.status(room).await == RoomStatus::Completed
    }
}
