//! Shared property state
//!
//! Groups the stores both engines read. Each store sits behind an `Arc` so the lifecycle
//! engine, the alert engine and the scheduler task can hold the same instances.

use std::sync::Arc;

use super::catalog::{GuestRegistry, RatePlanTable};
use super::reservation_store::ReservationStore;
use super::room_inventory::RoomInventory;
use crate::io::snapshot::Snapshot;

#[derive(Debug, Clone, Default)]
pub struct PropertyState {
    pub rooms: Arc<RoomInventory>,
    pub rate_plans: Arc<RatePlanTable>,
    pub guests: Arc<GuestRegistry>,
    pub reservations: Arc<ReservationStore>,
}

impl PropertyState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let state = Self::new();
        state.load(snapshot);
        state
    }

    /// Merge a snapshot into the stores; reservations are replaced wholesale
    pub fn load(&self, snapshot: Snapshot) {
        for room_type in snapshot.room_types {
            self.rooms.upsert_room_type(room_type);
        }
        for room in snapshot.rooms {
            self.rooms.upsert_room(room);
        }
        for plan in snapshot.rate_plans {
            self.rate_plans.upsert(plan);
        }
        for guest in snapshot.guests {
            self.guests.upsert(guest);
        }
        self.reservations.replace_all(snapshot.reservations);
    }

    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            room_types: self.rooms.room_types(),
            rooms: self.rooms.rooms(),
            rate_plans: self.rate_plans.all(),
            guests: self.guests.all(),
            reservations: self.reservations.all(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RatePlan, Reservation, Room};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    #[test]
    fn test_snapshot_round_trip_through_stores() {
        let snapshot = Snapshot {
            rooms: vec![Room::new("room-101", "101", "dlx")],
            rate_plans: vec![RatePlan::new("bar", "BAR", Decimal::ZERO)],
            reservations: vec![Reservation::new(
                "res-1",
                "g-1",
                "dlx",
                NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
                NaiveDate::from_ymd_opt(2025, 1, 12).unwrap(),
                Decimal::new(5000, 0),
            )],
            ..Default::default()
        };

        let state = PropertyState::from_snapshot(snapshot.clone());

        assert_eq!(state.to_snapshot(), snapshot);
    }

    #[test]
    fn test_load_drops_reservations_missing_from_snapshot() {
        let state = PropertyState::new();
        state.reservations.insert(Reservation::new(
            "res-stale",
            "g-1",
            "dlx",
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
            Decimal::new(5000, 0),
        ));

        state.load(Snapshot::default());

        assert!(state.reservations.is_empty());
    }
}
