use std::sync::Arc;

use tracing::debug;

use super::model::RoomState;
use crate::{
    error::StoreError,
    store::{tree, RemoteStore, Subscription},
};

pub fn room_path(room_id: &str) -> String {
    format!("rooms/{room_id}")
}

pub fn questions_path(room_id: &str) -> String {
    format!("rooms/{room_id}/questions")
}

/// A room id names exactly one path segment.
pub fn check_room_id(room_id: &str) -> Result<(), StoreError> {
    match tree::parse_path(room_id)?.as_slice() {
        [segment] if segment == room_id => Ok(()),
        _ => Err(StoreError::InvalidPath(room_id.to_owned())),
    }
}

struct ActiveRoom {
    room_id: String,
    subscription: Subscription,
    ended: bool,
}

impl ActiveRoom {
    fn is_live(&self) -> bool {
        !self.ended && self.subscription.is_live()
    }
}

/// Keeps a [`RoomState`] mirror in step with one room of the store.
///
/// At most one subscription is held. Switching rooms releases the old
/// subscription before the new one is opened, so a snapshot of the previous
/// room can never reach the mirror afterwards.
pub struct RoomSynchronizer {
    store: Arc<dyn RemoteStore>,
    active: Option<ActiveRoom>,
    state: RoomState,
}

impl RoomSynchronizer {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            active: None,
            state: RoomState::default(),
        }
    }

    pub fn room_id(&self) -> Option<&str> {
        self.active.as_ref().map(|active| active.room_id.as_str())
    }

    pub fn state(&self) -> &RoomState {
        &self.state
    }

    /// Follows `room_id` from now on. Same room again is a no-op while its
    /// listener is still running; a stopped one is reopened.
    pub fn set_room(&mut self, room_id: &str) -> Result<(), StoreError> {
        if let Some(active) = &self.active {
            if active.room_id == room_id && active.is_live() {
                return Ok(());
            }
        }
        check_room_id(room_id)?;

        self.clear();
        let subscription = Subscription::open(self.store.clone(), &room_path(room_id))?;
        debug!("following room {room_id}");
        self.active = Some(ActiveRoom {
            room_id: room_id.to_owned(),
            subscription,
            ended: false,
        });
        Ok(())
    }

    /// Releases the subscription and empties the mirror.
    pub fn clear(&mut self) {
        if let Some(active) = self.active.take() {
            debug!("leaving room {}", active.room_id);
        }
        self.state = RoomState::default();
    }

    /// Waits for the next snapshot and replaces the mirror with it. A failed
    /// read is returned as is and leaves the mirror alone.
    /// `None` when no room is followed or the listener has stopped.
    pub async fn next_update(&mut self) -> Option<Result<&RoomState, StoreError>> {
        let active = self.active.as_mut()?;
        let snapshot = match active.subscription.next().await {
            Some(Ok(snapshot)) => snapshot,
            Some(Err(e)) => return Some(Err(e)),
            None => {
                active.ended = true;
                return None;
            }
        };
        self.state = RoomState::from_snapshot(&snapshot);
        Some(Ok(&self.state))
    }
}
