//! Room inventory
//!
//! Holds room types and physical rooms in concurrent maps. Room status is written by
//! check-in/check-out through [`RoomStatusSink`] and by the housekeeping workflow
//! through [`RoomInventory::mark_cleaned`]; the alert engine only reads it.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use dashmap::DashMap;
use tracing::debug;

use super::traits::RoomStatusSink;
use crate::types::{OpsError, Room, RoomId, RoomStatus, RoomType, RoomTypeId};

/// Concurrent room and room-type table
#[derive(Debug, Default)]
pub struct RoomInventory {
    room_types: DashMap<RoomTypeId, RoomType>,
    rooms: DashMap<RoomId, Room>,
}

impl RoomInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert_room_type(&self, room_type: RoomType) {
        self.room_types.insert(room_type.id.clone(), room_type);
    }

    pub fn upsert_room(&self, room: Room) {
        self.rooms.insert(room.id.clone(), room);
    }

    pub fn room_type(&self, id: &str) -> Option<RoomType> {
        self.room_types.get(id).map(|entry| entry.value().clone())
    }

    /// Look up a room type by its wire short code
    pub fn room_type_by_code(&self, code: &str) -> Option<RoomType> {
        self.room_types
            .iter()
            .find(|entry| entry.value().code == code)
            .map(|entry| entry.value().clone())
    }

    pub fn room(&self, id: &str) -> Option<Room> {
        self.rooms.get(id).map(|entry| entry.value().clone())
    }

    pub fn room_by_number(&self, number: &str) -> Option<Room> {
        self.rooms
            .iter()
            .find(|entry| entry.value().number == number)
            .map(|entry| entry.value().clone())
    }

    /// All room types sorted by id
    pub fn room_types(&self) -> Vec<RoomType> {
        let mut room_types: Vec<RoomType> = self
            .room_types
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        room_types.sort_by(|a, b| a.id.cmp(&b.id));
        room_types
    }

    /// All rooms sorted by room number
    pub fn rooms(&self) -> Vec<Room> {
        let mut rooms: Vec<Room> = self
            .rooms
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        rooms.sort_by(|a, b| a.number.cmp(&b.number));
        rooms
    }

    pub fn total_rooms(&self) -> usize {
        self.rooms.len()
    }

    /// Set a room's status in place
    ///
    /// # Errors
    ///
    /// Returns `UnknownRoom` if the room id is not in the inventory.
    pub fn set_status(&self, room_id: &str, status: RoomStatus) -> Result<(), OpsError> {
        let mut room = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| OpsError::unknown_room(room_id))?;
        debug!(room = %room.number, from = %room.status, to = %status, "room status change");
        room.status = status;
        Ok(())
    }

    /// Housekeeping finished a room: it becomes vacant with a fresh cleaning stamp
    pub fn mark_cleaned(&self, room_id: &str, at: NaiveDateTime) -> Result<(), OpsError> {
        let mut room = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| OpsError::unknown_room(room_id))?;
        room.status = RoomStatus::Vacant;
        room.last_cleaned = Some(at);
        Ok(())
    }
}

#[async_trait]
impl RoomStatusSink for RoomInventory {
    async fn update_room_status(
        &self,
        room_id: &RoomId,
        status: RoomStatus,
    ) -> Result<(), OpsError> {
        self.set_status(room_id, status)
    }
}
