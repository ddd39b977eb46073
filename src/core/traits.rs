//! Core traits for the collaborators the engines depend on
//!
//! These abstractions let the lifecycle and alert engines run against the real
//! property systems in production and against in-memory stand-ins in tests.

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::io::snapshot::Snapshot;
use crate::types::{OpsError, RoomId, RoomStatus};

/// Source of property-local time
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Room-inventory mutation collaborator
///
/// Invoked as a side effect of check-in (room becomes occupied) and check-out
/// (room becomes dirty).
#[async_trait]
pub trait RoomStatusSink: Send + Sync {
    /// Set the housekeeping status of a room
    async fn update_room_status(&self, room_id: &RoomId, status: RoomStatus)
        -> Result<(), OpsError>;
}

/// Client-side key-value snapshot surviving reloads between backend syncs
pub trait SnapshotStore: Send + Sync {
    /// Load the last saved snapshot, or `None` when nothing was saved yet
    fn load(&self) -> Result<Option<Snapshot>, OpsError>;

    /// Replace the saved snapshot
    fn save(&self, snapshot: &Snapshot) -> Result<(), OpsError>;
}
