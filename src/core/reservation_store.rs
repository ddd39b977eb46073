//! Thread-safe reservation collection
//!
//! This module provides the `ReservationStore` struct, which holds the local
//! reservation collection using concurrent data structures so the lifecycle engine,
//! the alert engine and backend reconciliation can share it safely.
//!
//! # Design
//!
//! Reservations live in a `DashMap` keyed by reservation id. Writes go through
//! [`ReservationStore::update`], which applies a closure to a copy and only stores the
//! copy when the closure succeeds, so a failed write never leaves a half-updated
//! reservation behind. Every successful write bumps the reservation's `version`.
//!
//! # Write Serialization
//!
//! Lifecycle operations span backend round-trips, which a map entry lock cannot cover.
//! The store therefore also keeps a table of per-reservation async mutexes: an operation
//! takes [`ReservationStore::lock`] for its whole duration, so overlapping operations on
//! the same reservation run one after another while different reservations proceed
//! independently.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::types::{OpsError, Reservation, ReservationId};

/// Thread-safe reservation collection with per-reservation write locks
#[derive(Debug, Default)]
pub struct ReservationStore {
    /// Reservation state by id
    reservations: DashMap<ReservationId, Reservation>,

    /// One async mutex per reservation id, created on first use
    locks: DashMap<ReservationId, Arc<Mutex<()>>>,
}

impl ReservationStore {
    /// Create a new empty ReservationStore
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the write lock for a reservation
    ///
    /// The returned guard releases the lock when dropped. The lock is not reentrant:
    /// code holding it must not call another operation that locks the same id.
    pub async fn lock(&self, id: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Get a snapshot of a reservation
    pub fn get(&self, id: &str) -> Option<Reservation> {
        self.reservations.get(id).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.reservations.contains_key(id)
    }

    /// Insert a new reservation or overwrite an existing one
    ///
    /// The stored version continues from the previous one when the id already exists.
    pub fn insert(&self, mut reservation: Reservation) {
        let previous = self
            .reservations
            .get(&reservation.id)
            .map(|entry| entry.value().version);
        reservation.version = previous.map_or(reservation.version, |v| v + 1);
        self.reservations.insert(reservation.id.clone(), reservation);
    }

    /// Update a reservation using a closure
    ///
    /// The closure works on a copy; the copy replaces the stored reservation (with
    /// its version bumped) only when the closure returns `Ok`.
    ///
    /// # Errors
    ///
    /// * `ReservationNotFound` if the id is unknown
    /// * Any error returned by the closure, in which case nothing is written
    pub fn update<F>(&self, id: &str, f: F) -> Result<Reservation, OpsError>
    where
        F: FnOnce(&mut Reservation) -> Result<(), OpsError>,
    {
        let mut entry = self
            .reservations
            .get_mut(id)
            .ok_or_else(|| OpsError::reservation_not_found(id, "update"))?;

        let mut working = entry.value().clone();
        f(&mut working)?;
        working.version = entry.value().version + 1;
        *entry.value_mut() = working.clone();
        Ok(working)
    }

    /// Replace a reservation only if nobody wrote it since `expected_version`
    ///
    /// Returns the stored reservation on success, or `None` when the write was stale
    /// (or the reservation vanished) and was discarded.
    pub fn replace_if_version(
        &self,
        mut reservation: Reservation,
        expected_version: u64,
    ) -> Option<Reservation> {
        let mut entry = self.reservations.get_mut(&reservation.id)?;
        if entry.value().version != expected_version {
            return None;
        }
        reservation.version = expected_version + 1;
        *entry.value_mut() = reservation.clone();
        Some(reservation)
    }

    pub fn remove(&self, id: &str) -> Option<Reservation> {
        self.locks.remove(id);
        self.reservations.remove(id).map(|(_, reservation)| reservation)
    }

    /// Replace the whole collection (used by backend reconciliation)
    pub fn replace_all(&self, reservations: Vec<Reservation>) {
        let incoming: std::collections::HashSet<ReservationId> =
            reservations.iter().map(|r| r.id.clone()).collect();
        self.reservations.retain(|id, _| incoming.contains(id));
        for reservation in reservations {
            self.insert(reservation);
        }
    }

    /// All reservations sorted by check-in date, then id
    pub fn all(&self) -> Vec<Reservation> {
        let mut reservations: Vec<Reservation> = self
            .reservations
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        reservations.sort_by(|a, b| a.check_in.cmp(&b.check_in).then_with(|| a.id.cmp(&b.id)));
        reservations
    }

    pub fn len(&self) -> usize {
        self.reservations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reservations.is_empty()
    }
}
