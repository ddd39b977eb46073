//! Room-related types
//!
//! Room types are static configuration; rooms carry the housekeeping status that
//! check-in, check-out and the external housekeeping workflow mutate.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Room type identifier
pub type RoomTypeId = String;

/// Physical room identifier
pub type RoomId = String;

/// Room class definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomType {
    pub id: RoomTypeId,
    /// Short code used on the wire (e.g. "DLX")
    pub code: String,
    pub name: String,
    pub base_rate: Decimal,
    /// Maximum occupancy per room
    pub capacity: u32,
}

/// Housekeeping status of a physical room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoomStatus {
    Vacant,
    Occupied,
    Dirty,
    OutOfService,
    Maintenance,
}

impl RoomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Vacant => "vacant",
            RoomStatus::Occupied => "occupied",
            RoomStatus::Dirty => "dirty",
            RoomStatus::OutOfService => "out-of-service",
            RoomStatus::Maintenance => "maintenance",
        }
    }

    /// Whether a guest can be checked into a room in this status
    pub fn is_assignable(&self) -> bool {
        matches!(self, RoomStatus::Vacant | RoomStatus::Dirty)
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A physical room in the property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RoomId,
    pub number: String,
    pub room_type_id: RoomTypeId,
    #[serde(default)]
    pub floor: Option<String>,
    pub status: RoomStatus,
    /// Last time housekeeping finished the room
    #[serde(default)]
    pub last_cleaned: Option<NaiveDateTime>,
}

impl Room {
    /// Create a vacant room with no cleaning record
    pub fn new(id: &str, number: &str, room_type_id: &str) -> Self {
        Room {
            id: id.to_string(),
            number: number.to_string(),
            room_type_id: room_type_id.to_string(),
            floor: None,
            status: RoomStatus::Vacant,
            last_cleaned: None,
        }
    }
}
