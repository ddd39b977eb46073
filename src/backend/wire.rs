//! Server record shapes and their mapping onto the domain model
//!
//! The backend stores a flatter reservation than the domain: room types and rate plans
//! travel as short codes, rooms as ids, and money beyond the nightly rate is not stored
//! at all. [`WireMapper`] converts between the two, keeping locally-held data (tax rate,
//! discounts, payments, check-in/check-out details) when reconciling a server response.
//!
//! # Status Mapping
//!
//! The server knows `DRAFT, CONFIRMED, CHECKED_IN, CHECKED_OUT, CANCELLED`. A no-show
//! is sent as `CANCELLED`, which loses the distinction on the server; when the local
//! record already says no-show, reconciliation keeps it.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::core::catalog::RatePlanTable;
use crate::core::room_inventory::RoomInventory;
use crate::types::{NewReservation, RatePlan, Reservation, ReservationStatus, RoomType};

/// Reservation status codes on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerStatus {
    Draft,
    Confirmed,
    CheckedIn,
    CheckedOut,
    Cancelled,
}

impl From<ReservationStatus> for ServerStatus {
    fn from(status: ReservationStatus) -> Self {
        match status {
            ReservationStatus::Pending => ServerStatus::Draft,
            ReservationStatus::Confirmed => ServerStatus::Confirmed,
            ReservationStatus::CheckedIn => ServerStatus::CheckedIn,
            ReservationStatus::CheckedOut => ServerStatus::CheckedOut,
            ReservationStatus::Cancelled | ReservationStatus::NoShow => ServerStatus::Cancelled,
        }
    }
}

impl ServerStatus {
    /// Map back to the domain, keeping a local no-show that the wire flattened
    pub fn to_domain(self, local: Option<ReservationStatus>) -> ReservationStatus {
        match self {
            ServerStatus::Draft => ReservationStatus::Pending,
            ServerStatus::Confirmed => ReservationStatus::Confirmed,
            ServerStatus::CheckedIn => ReservationStatus::CheckedIn,
            ServerStatus::CheckedOut => ReservationStatus::CheckedOut,
            ServerStatus::Cancelled if local == Some(ReservationStatus::NoShow) => {
                ReservationStatus::NoShow
            }
            ServerStatus::Cancelled => ReservationStatus::Cancelled,
        }
    }
}

/// Reservation record as stored by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerReservation {
    pub id: String,
    #[serde(default)]
    pub confirmation_number: Option<String>,
    #[serde(default)]
    pub hotel_id: Option<String>,
    pub guest_id: String,
    /// Room type short code
    pub room_type: String,
    #[serde(default)]
    pub room_ids: Vec<String>,
    pub arrival_date: NaiveDate,
    pub departure_date: NaiveDate,
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
    pub nightly_rate: Decimal,
    #[serde(default)]
    pub rate_plan_code: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    pub status: ServerStatus,
}

impl ServerReservation {
    /// Merge a partial update payload into the record
    pub fn apply(&mut self, payload: &ReservationPayload) {
        if let Some(guest_id) = &payload.guest_id {
            self.guest_id = guest_id.clone();
        }
        if let Some(room_type) = &payload.room_type {
            self.room_type = room_type.clone();
        }
        if let Some(room_ids) = &payload.room_ids {
            self.room_ids = room_ids.clone();
        }
        if let Some(arrival) = payload.arrival_date {
            self.arrival_date = arrival;
        }
        if let Some(departure) = payload.departure_date {
            self.departure_date = departure;
        }
        if let Some(adults) = payload.adults {
            self.adults = adults;
        }
        if let Some(children) = payload.children {
            self.children = children;
        }
        if let Some(rate) = payload.nightly_rate {
            self.nightly_rate = rate;
        }
        if let Some(code) = &payload.rate_plan_code {
            self.rate_plan_code = Some(code.clone());
        }
        if let Some(source) = &payload.source {
            self.source = Some(source.clone());
        }
        if let Some(notes) = &payload.notes {
            self.notes = Some(notes.clone());
        }
        if let Some(currency) = &payload.currency {
            self.currency = Some(currency.clone());
        }
        if let Some(status) = payload.status {
            self.status = status;
        }
    }
}

/// Body of `POST /reservations` and `PUT /reservations/:id`
///
/// Every field is optional so the same shape serves full creates and partial updates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hotel_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hotel_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrival_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departure_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adults: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nightly_rate: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_plan_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ServerStatus>,
}

impl ReservationPayload {
    pub fn is_empty(&self) -> bool {
        *self == ReservationPayload::default()
    }
}

/// Converts between domain reservations and server records
#[derive(Debug, Clone)]
pub struct WireMapper {
    rooms: Arc<RoomInventory>,
    rate_plans: Arc<RatePlanTable>,
    hotel_id: String,
    hotel_code: String,
    currency: String,
    default_tax_rate: Decimal,
}

impl WireMapper {
    pub fn new(
        rooms: Arc<RoomInventory>,
        rate_plans: Arc<RatePlanTable>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            rooms,
            rate_plans,
            hotel_id: config.hotel_id.clone(),
            hotel_code: config.hotel_code.clone(),
            currency: config.currency.clone(),
            default_tax_rate: config.tax_rate,
        }
    }

    /// Full create body
    pub fn create_payload(
        &self,
        input: &NewReservation,
        guest_id: &str,
        room_type: &RoomType,
        plan: &RatePlan,
        nightly_rate: Decimal,
    ) -> ReservationPayload {
        ReservationPayload {
            hotel_id: Some(self.hotel_id.clone()),
            hotel_code: Some(self.hotel_code.clone()),
            guest_id: Some(guest_id.to_string()),
            room_type: Some(room_type.code.clone()),
            room_ids: None,
            arrival_date: Some(input.check_in),
            departure_date: Some(input.check_out),
            adults: Some(input.adults),
            children: Some(input.children),
            nightly_rate: Some(nightly_rate),
            rate_plan_code: Some(plan.code.clone()),
            source: input.source.clone(),
            notes: input.notes.clone(),
            currency: Some(self.currency.clone()),
            status: None,
        }
    }

    /// Partial update body holding only the server fields that differ
    pub fn update_payload(&self, current: &Reservation, next: &Reservation) -> ReservationPayload {
        fn diff<T: PartialEq + Clone>(current: &T, next: &T) -> Option<T> {
            (current != next).then(|| next.clone())
        }

        // Compared on the domain side so no-show still reaches the server as CANCELLED
        let status = (current.status != next.status).then(|| ServerStatus::from(next.status));

        ReservationPayload {
            room_type: (current.room_type_id != next.room_type_id)
                .then(|| self.room_type_code(&next.room_type_id)),
            room_ids: (current.room_numbers != next.room_numbers)
                .then(|| self.room_ids(&next.room_numbers)),
            arrival_date: diff(&current.check_in, &next.check_in),
            departure_date: diff(&current.check_out, &next.check_out),
            adults: diff(&current.adults, &next.adults),
            children: diff(&current.children, &next.children),
            nightly_rate: diff(&current.nightly_rate, &next.nightly_rate),
            rate_plan_code: (current.rate_plan_id != next.rate_plan_id)
                .then(|| self.rate_plan_code(&next.rate_plan_id)),
            notes: if current.notes != next.notes {
                Some(next.notes.clone().unwrap_or_default())
            } else {
                None
            },
            status,
            ..Default::default()
        }
    }

    /// Build the domain reservation from a server record
    ///
    /// With a local counterpart, server fields overwrite it and everything the
    /// server does not store is kept.
    pub fn to_domain(&self, server: &ServerReservation, local: Option<&Reservation>) -> Reservation {
        let room_type_id = self
            .rooms
            .room_type_by_code(&server.room_type)
            .map(|room_type| room_type.id)
            .unwrap_or_else(|| server.room_type.clone());
        let rate_plan_id = server
            .rate_plan_code
            .as_deref()
            .map(|code| {
                self.rate_plans
                    .by_code(code)
                    .map(|plan| plan.id)
                    .unwrap_or_else(|| code.to_string())
            })
            .or_else(|| local.map(|l| l.rate_plan_id.clone()))
            .unwrap_or_default();
        let room_numbers = server
            .room_ids
            .iter()
            .map(|id| {
                self.rooms
                    .room(id)
                    .map(|room| room.number)
                    .unwrap_or_else(|| id.clone())
            })
            .collect();

        let mut reservation = match local {
            Some(local) => local.clone(),
            None => {
                let mut fresh = Reservation::new(
                    &server.id,
                    &server.guest_id,
                    &room_type_id,
                    server.arrival_date,
                    server.departure_date,
                    server.nightly_rate,
                );
                fresh.tax_rate = self.default_tax_rate;
                fresh
            }
        };

        reservation.id = server.id.clone();
        if let Some(confirmation) = &server.confirmation_number {
            reservation.confirmation_number = confirmation.clone();
        }
        if reservation.confirmation_number.is_empty() {
            reservation.confirmation_number = server.id.clone();
        }
        reservation.guest_id = server.guest_id.clone();
        reservation.room_type_id = room_type_id;
        reservation.room_numbers = room_numbers;
        reservation.check_in = server.arrival_date;
        reservation.check_out = server.departure_date;
        reservation.adults = server.adults;
        reservation.children = server.children;
        reservation.nightly_rate = server.nightly_rate;
        reservation.rate_plan_id = rate_plan_id;
        reservation.source = server.source.clone();
        reservation.notes = server.notes.clone().filter(|notes| !notes.is_empty());
        reservation.status = server.status.to_domain(local.map(|l| l.status));
        reservation.recompute();
        reservation
    }

    fn room_type_code(&self, room_type_id: &str) -> String {
        self.rooms
            .room_type(room_type_id)
            .map(|room_type| room_type.code)
            .unwrap_or_else(|| room_type_id.to_string())
    }

    fn rate_plan_code(&self, rate_plan_id: &str) -> String {
        self.rate_plans
            .get(rate_plan_id)
            .map(|plan| plan.code)
            .unwrap_or_else(|| rate_plan_id.to_string())
    }

    fn room_ids(&self, numbers: &[String]) -> Vec<String> {
        numbers
            .iter()
            .map(|number| {
                self.rooms
                    .room_by_number(number)
                    .map(|room| room.id)
                    .unwrap_or_else(|| number.clone())
            })
            .collect()
    }
}
