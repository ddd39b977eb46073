//! Hotel Operations Engine
//!
//! # Overview
//!
//! The operational core of a hotel property-management system: the reservation lifecycle
//! (booked, checked in, checked out or cancelled), the money owed at each transition, and
//! a periodically evaluated set of operational alert rules.
//!
//! # Architecture
//!
//! - [`types`] - Domain data model (Reservation, Guest, Room, RatePlan, settlements, alerts)
//! - [`core`] - Business logic:
//!   - [`core::engine`] - Reservation lifecycle orchestration against the backend of record
//!   - [`core::availability`] - Availability checks and nightly rate resolution
//!   - [`core::settlement`] - Settlement and payment-status calculation
//!   - [`core::alerts`] - Alert rule evaluation with deduplication
//!   - [`core::scheduler`] - Background evaluation loop
//! - [`backend`] - Backend-of-record collaborator (HTTP and in-memory)
//! - [`io`] - Local JSON snapshot and CSV output
//! - [`config`] - Engine configuration
//! - [`logging`] - `tracing` subscriber setup
//! - [`cli`] - Command-line interface
//!
//! # Reservation Lifecycle
//!
//! - **Pending**: created, not yet confirmed (sent to the server as `DRAFT`)
//! - **Confirmed**: guaranteed booking
//! - **Checked in**: rooms assigned and occupied
//! - **Checked out**: settled, rooms released as dirty
//! - **Cancelled** / **No-show**: terminal, no further transitions
//!
//! Every change goes to the backend first; local state is updated only from the
//! server's response.

pub mod backend;
pub mod cli;
pub mod config;
pub mod core;
pub mod io;
pub mod logging;
pub mod types;

pub use backend::{HttpBackend, InMemoryBackend, ReservationBackend};
pub use config::EngineConfig;
pub use core::{AlertEngine, AlertScheduler, PropertyState, ReservationEngine};
pub use io::{write_alerts_csv, write_settlement_csv, JsonSnapshotStore, Snapshot};
pub use types::{
    AlertItem, AlertRule, OpsError, PaymentStatus, Reservation, ReservationStatus,
    SettlementSummary,
};
