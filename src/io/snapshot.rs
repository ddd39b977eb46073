//! Local key-value snapshot
//!
//! The snapshot holds everything the engines need to start without the backend: room
//! types, rooms, rate plans, guests and reservations (including the locally-held check-in
//! and check-out details the server does not store). It is written as a single JSON
//! document.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

use crate::core::traits::SnapshotStore;
use crate::types::{Guest, OpsError, RatePlan, Reservation, Room, RoomType};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub room_types: Vec<RoomType>,
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub rate_plans: Vec<RatePlan>,
    #[serde(default)]
    pub guests: Vec<Guest>,
    #[serde(default)]
    pub reservations: Vec<Reservation>,
}

/// Snapshot stored as a JSON file
///
/// Saves go through a sibling temporary file and a rename so a crash mid-write leaves
/// the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct JsonSnapshotStore {
    path: PathBuf,
}

impl JsonSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for JsonSnapshotStore {
    fn load(&self) -> Result<Option<Snapshot>, OpsError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(None);
        }
        let snapshot: Snapshot = serde_json::from_str(&contents)?;
        debug!(
            path = %self.path.display(),
            reservations = snapshot.reservations.len(),
            "snapshot loaded"
        );
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), OpsError> {
        let json = serde_json::to_string_pretty(snapshot)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "snapshot saved");
        Ok(())
    }
}

/// Snapshot held in memory
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    snapshot: Mutex<Option<Snapshot>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Mutex::new(Some(snapshot)),
        }
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Result<Option<Snapshot>, OpsError> {
        let guard = self
            .snapshot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(guard.clone())
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), OpsError> {
        let mut guard = self
            .snapshot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Some(snapshot.clone());
        Ok(())
    }
}
