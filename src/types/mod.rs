//! Types module
//!
//! Contains the domain data model shared by the lifecycle engine and the alert engine.
//! This module organizes types into logical submodules:
//! - `reservation`: the Reservation aggregate and its lifecycle status
//! - `requests`: typed inputs for lifecycle operations
//! - `settlement`: charges, payments and settlement summaries
//! - `room`: room types and physical rooms
//! - `rate_plan`: rate plan lookup entries
//! - `guest`: guest profiles
//! - `alert`: alert rules and alert items
//! - `error`: error types for the engine

pub mod alert;
pub mod error;
pub mod guest;
pub mod rate_plan;
pub mod requests;
pub mod reservation;
pub mod room;
pub mod settlement;

pub use alert::{AlertCategory, AlertId, AlertItem, AlertRule, AlertRuleId, AlertSeverity};
pub use error::OpsError;
pub use guest::{Address, Guest, GuestId, GuestSelection, NewGuest};
pub use rate_plan::{RatePlan, RatePlanId};
pub use requests::{
    CheckInRequest, CheckOutRequest, DocumentInput, NewReservation, ReservationUpdate,
};
pub use reservation::{
    nights_between, CheckInDetails, CheckOutDetails, IdentityDocument, Reservation,
    ReservationId, ReservationStatus,
};
pub use room::{Room, RoomId, RoomStatus, RoomType, RoomTypeId};
pub use settlement::{
    round_money, ChargeItem, PaymentInput, PaymentMethod, PaymentRecord, PaymentStatus,
    SettlementSummary, TaxSplit,
};
