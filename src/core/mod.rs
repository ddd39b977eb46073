//! Core business logic module
//!
//! This module contains the reservation lifecycle and alert components:
//! - `traits` - Collaborator abstractions (clock, room status sink, snapshot store)
//! - `engine` - Reservation lifecycle orchestration
//! - `availability` - Availability checks and nightly rate resolution
//! - `settlement` - Settlement and payment-status calculation
//! - `alerts` - Alert rule evaluation
//! - `scheduler` - Periodic alert evaluation task
//! - `state` - Stores shared by both engines

pub mod alerts;
pub mod availability;
pub mod catalog;
pub mod clock;
pub mod engine;
pub mod reservation_store;
pub mod room_inventory;
pub mod scheduler;
pub mod settlement;
pub mod state;
pub mod traits;

pub use alerts::{rooms_booked_per_night, AlertEngine, AlertSettings};
pub use availability::{nightly_rate, AvailabilityResolver, AvailabilityResult};
pub use catalog::{GuestRegistry, RatePlanTable};
pub use clock::{FixedClock, SystemClock};
pub use engine::ReservationEngine;
pub use reservation_store::ReservationStore;
pub use room_inventory::RoomInventory;
pub use scheduler::AlertScheduler;
pub use settlement::{build_settlement, classify_payment, split_tax, tax_for};
pub use state::PropertyState;
pub use traits::{Clock, RoomStatusSink, SnapshotStore};
