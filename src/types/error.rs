//! Error types for the hotel operations engine
//!
//! This module defines all error types that can occur while managing reservations,
//! settling folios, and evaluating alerts. Messages are user-facing and specific.
//!
//! # Error Categories
//!
//! - **Validation Errors**: unknown room type, unavailable inventory, insufficient payment,
//!   invalid state transitions. Rejected before any backend call.
//! - **Consistency Errors**: the reservation is not present in the local collection.
//! - **Backend Errors**: network failure or server rejection, carrying the server message
//!   or a per-operation fallback.
//! - **Persistence Errors**: local snapshot, file and CSV output failures.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use super::reservation::ReservationStatus;
use super::room::RoomStatus;

/// Main error type for the hotel operations engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OpsError {
    /// The requested room type is not configured
    #[error("Unknown room type '{room_type}'")]
    UnknownRoomType {
        /// Room type id that was not found
        room_type: String,
    },

    /// The requested rate plan is not configured
    #[error("Unknown rate plan '{rate_plan}'")]
    UnknownRatePlan {
        /// Rate plan id that was not found
        rate_plan: String,
    },

    /// Guest id not present in the registry
    #[error("Unknown guest '{guest}'")]
    UnknownGuest {
        /// The guest id supplied by the caller
        guest: String,
    },

    /// The requested rate plan exists but is switched off
    #[error("Rate plan '{rate_plan}' is not active")]
    InactiveRatePlan {
        /// Rate plan id
        rate_plan: String,
    },

    /// Inventory cannot accommodate the stay
    #[error("{message}")]
    RoomsUnavailable {
        /// Resolver message shown to the user
        message: String,
    },

    /// Check-out date is not after check-in date
    #[error("Check-out date {check_out} must be after check-in date {check_in}")]
    InvalidDateRange {
        /// Requested arrival
        check_in: NaiveDate,
        /// Requested departure
        check_out: NaiveDate,
    },

    /// Party size is empty or exceeds room capacity
    #[error("Invalid party size: {message}")]
    InvalidPartySize {
        /// What was wrong with the party
        message: String,
    },

    /// The reservation state machine does not allow this transition
    #[error("Cannot {operation} reservation {reservation}: status is {from}")]
    InvalidTransition {
        /// Reservation id
        reservation: String,
        /// Current status
        from: ReservationStatus,
        /// Attempted operation
        operation: String,
    },

    /// Check-in submitted without any room
    #[error("At least one room must be assigned to check in reservation {reservation}")]
    NoRoomsAssigned {
        /// Reservation id
        reservation: String,
    },

    /// Room number not present in the inventory
    #[error("Room {room} does not exist")]
    UnknownRoom {
        /// Room number
        room: String,
    },

    /// Room exists but cannot take a guest right now
    #[error("Room {room} cannot be assigned while {status}")]
    RoomNotAssignable {
        /// Room number
        room: String,
        /// Current housekeeping status
        status: RoomStatus,
    },

    /// Checkout payment does not cover the amount still owed
    #[error("Payment of {offered} does not cover the outstanding total of {required}")]
    InsufficientPayment {
        /// Amount that must be collected
        required: Decimal,
        /// Amount submitted
        offered: Decimal,
    },

    /// Negative or otherwise unusable money amount
    #[error("Invalid amount {amount} for {field}")]
    InvalidAmount {
        /// Field name
        field: String,
        /// Offending value
        amount: Decimal,
    },

    /// Reservation not found in the local collection
    ///
    /// Treated as a fatal precondition failure for the operation; no backend call is made.
    #[error("Reservation {reservation} not found for {operation}")]
    ReservationNotFound {
        /// Reservation id
        reservation: String,
        /// Operation that failed
        operation: String,
    },

    /// Alert id not present in the working list
    #[error("Alert {alert} not found")]
    AlertNotFound {
        /// Alert id
        alert: String,
    },

    /// The backend of record failed or rejected the request
    #[error("{message}")]
    Backend {
        /// Operation that failed
        operation: String,
        /// Server-supplied message, or the per-operation fallback
        message: String,
    },

    /// Local snapshot could not be read or written
    #[error("Snapshot error: {message}")]
    Snapshot {
        /// Description of the failure
        message: String,
    },

    /// I/O error while reading or writing files
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O error
        message: String,
    },

    /// CSV input or output failed
    #[error("CSV error: {message}")]
    Csv {
        /// Description of the CSV error
        message: String,
    },

    /// Configuration file could not be parsed
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the problem
        message: String,
    },
}

impl From<std::io::Error> for OpsError {
    fn from(error: std::io::Error) -> Self {
        OpsError::Io {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for OpsError {
    fn from(error: csv::Error) -> Self {
        OpsError::Csv {
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for OpsError {
    fn from(error: serde_json::Error) -> Self {
        OpsError::Snapshot {
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl OpsError {
    /// Create an UnknownGuest error
    pub fn unknown_guest(guest: &str) -> Self {
        OpsError::UnknownGuest {
            guest: guest.to_string(),
        }
    }

    /// Create an UnknownRoomType error
    pub fn unknown_room_type(room_type: &str) -> Self {
        OpsError::UnknownRoomType {
            room_type: room_type.to_string(),
        }
    }

    /// Create an UnknownRatePlan error
    pub fn unknown_rate_plan(rate_plan: &str) -> Self {
        OpsError::UnknownRatePlan {
            rate_plan: rate_plan.to_string(),
        }
    }

    /// Create an InactiveRatePlan error
    pub fn inactive_rate_plan(rate_plan: &str) -> Self {
        OpsError::InactiveRatePlan {
            rate_plan: rate_plan.to_string(),
        }
    }

    /// Create a RoomsUnavailable error
    pub fn rooms_unavailable(message: &str) -> Self {
        OpsError::RoomsUnavailable {
            message: message.to_string(),
        }
    }

    /// Create an InvalidPartySize error
    pub fn invalid_party_size(message: &str) -> Self {
        OpsError::InvalidPartySize {
            message: message.to_string(),
        }
    }

    /// Create an InvalidTransition error
    pub fn invalid_transition(reservation: &str, from: ReservationStatus, operation: &str) -> Self {
        OpsError::InvalidTransition {
            reservation: reservation.to_string(),
            from,
            operation: operation.to_string(),
        }
    }

    /// Create a NoRoomsAssigned error
    pub fn no_rooms_assigned(reservation: &str) -> Self {
        OpsError::NoRoomsAssigned {
            reservation: reservation.to_string(),
        }
    }

    /// Create an UnknownRoom error
    pub fn unknown_room(room: &str) -> Self {
        OpsError::UnknownRoom {
            room: room.to_string(),
        }
    }

    /// Create a RoomNotAssignable error
    pub fn room_not_assignable(room: &str, status: RoomStatus) -> Self {
        OpsError::RoomNotAssignable {
            room: room.to_string(),
            status,
        }
    }

    /// Create an InsufficientPayment error
    pub fn insufficient_payment(required: Decimal, offered: Decimal) -> Self {
        OpsError::InsufficientPayment { required, offered }
    }

    /// Create an InvalidAmount error
    pub fn invalid_amount(field: &str, amount: Decimal) -> Self {
        OpsError::InvalidAmount {
            field: field.to_string(),
            amount,
        }
    }

    /// Create a ReservationNotFound error
    pub fn reservation_not_found(reservation: &str, operation: &str) -> Self {
        OpsError::ReservationNotFound {
            reservation: reservation.to_string(),
            operation: operation.to_string(),
        }
    }

    /// Create an AlertNotFound error
    pub fn alert_not_found(alert: &str) -> Self {
        OpsError::AlertNotFound {
            alert: alert.to_string(),
        }
    }

    /// Create a Backend error
    pub fn backend(operation: &str, message: &str) -> Self {
        OpsError::Backend {
            operation: operation.to_string(),
            message: message.to_string(),
        }
    }

    /// Whether this error was raised locally before any backend call
    pub fn is_validation(&self) -> bool {
        !matches!(
            self,
            OpsError::Backend { .. }
                | OpsError::Snapshot { .. }
                | OpsError::Io { .. }
                | OpsError::Csv { .. }
                | OpsError::Config { .. }
                | OpsError::ReservationNotFound { .. }
                | OpsError::AlertNotFound { .. }
        )
    }
}
