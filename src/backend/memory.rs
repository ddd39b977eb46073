//! In-process backend
//!
//! Behaves like the REST backend closely enough for tests and offline runs: it assigns
//! ids and confirmation numbers, merges partial updates, and answers availability from
//! a per-room-type room count. A failure can be queued with [`InMemoryBackend::fail_next`]
//! to exercise error paths.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{
    AvailabilityQuery, AvailabilityResponse, BackendError, ReservationBackend, ReservationPayload,
    ServerReservation, ServerStatus,
};

#[derive(Debug, Default)]
pub struct InMemoryBackend {
    records: DashMap<String, ServerReservation>,
    /// Rooms per room type code
    inventory: DashMap<String, u32>,
    sequence: AtomicU64,
    calls: AtomicUsize,
    pending_failure: Mutex<Option<BackendError>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare how many rooms a room type code has
    pub fn with_inventory(self, room_type: &str, rooms: u32) -> Self {
        self.inventory.insert(room_type.to_string(), rooms);
        self
    }

    /// Make the next call fail with `error`
    pub fn fail_next(&self, error: BackendError) {
        let mut pending = self
            .pending_failure
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *pending = Some(error);
    }

    /// Number of calls received, failed ones included
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Insert a record as if another client had created it
    pub fn seed(&self, record: ServerReservation) {
        self.records.insert(record.id.clone(), record);
    }

    pub fn get(&self, id: &str) -> Option<ServerReservation> {
        self.records.get(id).map(|entry| entry.value().clone())
    }

    fn begin_call(&self) -> Result<(), BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut pending = self
            .pending_failure
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match pending.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn booked(&self, query: &AvailabilityQuery) -> u32 {
        self.records
            .iter()
            .filter(|entry| {
                let record = entry.value();
                record.room_type == query.room_type
                    && !matches!(
                        record.status,
                        ServerStatus::Cancelled | ServerStatus::CheckedOut
                    )
                    && record.arrival_date < query.departure_date
                    && query.arrival_date < record.departure_date
            })
            .map(|entry| entry.value().room_ids.len().max(1) as u32)
            .sum()
    }

    fn remaining(&self, query: &AvailabilityQuery) -> u32 {
        let total = self
            .inventory
            .get(&query.room_type)
            .map(|entry| *entry.value())
            .unwrap_or(0);
        total.saturating_sub(self.booked(query))
    }
}

fn rejected(status: u16, message: &str) -> BackendError {
    BackendError::Rejected {
        status,
        message: Some(message.to_string()),
    }
}

#[async_trait]
impl ReservationBackend for InMemoryBackend {
    async fn list_reservations(&self) -> Result<Vec<ServerReservation>, BackendError> {
        self.begin_call()?;
        let mut records: Vec<ServerReservation> =
            self.records.iter().map(|e| e.value().clone()).collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }

    async fn create_reservation(
        &self,
        payload: &ReservationPayload,
    ) -> Result<ServerReservation, BackendError> {
        self.begin_call()?;
        let (
            Some(guest_id),
            Some(room_type),
            Some(arrival_date),
            Some(departure_date),
            Some(nightly_rate),
        ) = (
            payload.guest_id.clone(),
            payload.room_type.clone(),
            payload.arrival_date,
            payload.departure_date,
            payload.nightly_rate,
        )
        else {
            return Err(rejected(400, "Missing required reservation fields"));
        };

        if self.inventory.contains_key(&room_type) {
            let query = AvailabilityQuery {
                arrival_date,
                departure_date,
                room_type: room_type.clone(),
            };
            if self.remaining(&query) == 0 {
                return Err(rejected(409, "No rooms available for selected dates"));
            }
        }

        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let record = ServerReservation {
            id: format!("res-{sequence}"),
            confirmation_number: Some(format!("CNF{sequence:06}")),
            hotel_id: payload.hotel_id.clone(),
            guest_id,
            room_type,
            room_ids: payload.room_ids.clone().unwrap_or_default(),
            arrival_date,
            departure_date,
            adults: payload.adults.unwrap_or(1),
            children: payload.children.unwrap_or(0),
            nightly_rate,
            rate_plan_code: payload.rate_plan_code.clone(),
            source: payload.source.clone(),
            notes: payload.notes.clone(),
            currency: payload.currency.clone(),
            status: payload.status.unwrap_or(ServerStatus::Draft),
        };
        self.records.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn update_reservation(
        &self,
        id: &str,
        payload: &ReservationPayload,
    ) -> Result<ServerReservation, BackendError> {
        self.begin_call()?;
        let mut entry = self
            .records
            .get_mut(id)
            .ok_or_else(|| rejected(404, "Reservation not found"))?;
        entry.value_mut().apply(payload);
        Ok(entry.value().clone())
    }

    async fn delete_reservation(&self, id: &str) -> Result<(), BackendError> {
        self.begin_call()?;
        self.records
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| rejected(404, "Reservation not found"))
    }

    async fn availability(
        &self,
        query: &AvailabilityQuery,
    ) -> Result<AvailabilityResponse, BackendError> {
        self.begin_call()?;
        Ok(AvailabilityResponse {
            available_rooms: Vec::new(),
            total_available: self.remaining(query),
        })
    }
}
