//! Reservation lifecycle engine
//!
//! This module provides the `ReservationEngine`, which drives a reservation through its
//! lifecycle by coordinating the availability resolver, the settlement calculator, the
//! backend of record and the local stores.
//!
//! # State Machine
//!
//! ```text
//! pending --confirm--> confirmed
//! pending/confirmed --check_in--> checked-in
//! checked-in --check_out--> checked-out
//! pending/confirmed/checked-in --cancel--> cancelled
//! pending/confirmed --mark_no_show--> no-show
//! ```
//!
//! # Failure Semantics
//!
//! Validation runs before any backend call, so a rejected request never reaches the
//! server. When the backend fails, its message (or the per-operation fallback) is
//! returned and the local collection is left as it was. Local changes are only written
//! after the backend has accepted them.
//!
//! # Write Serialization
//!
//! Every mutating operation on an existing reservation holds that reservation's lock
//! from [`ReservationStore::lock`] until it returns. Reconciled server responses are
//! stored with [`ReservationStore::replace_if_version`] against the version captured at
//! the start of the operation, so a response that lost a race with another writer (for
//! example a concurrent [`ReservationEngine::refresh`]) is discarded.

use chrono::{NaiveDate, NaiveDateTime};
use futures::future::try_join_all;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::availability::{AvailabilityResolver, AvailabilityResult};
use super::reservation_store::ReservationStore;
use super::settlement::build_settlement;
use super::state::PropertyState;
use super::traits::{Clock, RoomStatusSink, SnapshotStore};
use crate::backend::{BackendOperation, ReservationBackend, WireMapper};
use crate::config::EngineConfig;
use crate::types::{
    ChargeItem, CheckInDetails, CheckInRequest, CheckOutDetails, CheckOutRequest, DocumentInput,
    GuestSelection, IdentityDocument, NewReservation, OpsError, PaymentInput, Reservation,
    ReservationStatus, ReservationUpdate, RoomId, RoomStatus,
};

/// Reservation lifecycle engine
///
/// Cheap to share behind an `Arc`; all state lives in the [`PropertyState`] stores.
pub struct ReservationEngine {
    state: PropertyState,
    resolver: AvailabilityResolver,
    mapper: WireMapper,
    backend: Arc<dyn ReservationBackend>,
    room_sink: Arc<dyn RoomStatusSink>,
    snapshots: Arc<dyn SnapshotStore>,
    clock: Arc<dyn Clock>,
}

impl ReservationEngine {
    /// Create an engine over shared state
    ///
    /// Room status changes go to the state's own [`RoomInventory`](super::RoomInventory)
    /// unless another sink is supplied with [`ReservationEngine::with_room_sink`].
    pub fn new(
        state: PropertyState,
        backend: Arc<dyn ReservationBackend>,
        snapshots: Arc<dyn SnapshotStore>,
        clock: Arc<dyn Clock>,
        config: &EngineConfig,
    ) -> Self {
        let resolver = AvailabilityResolver::new(
            Arc::clone(&state.rooms),
            Arc::clone(&state.rate_plans),
            Arc::clone(&backend),
        );
        let mapper = WireMapper::new(
            Arc::clone(&state.rooms),
            Arc::clone(&state.rate_plans),
            config,
        );
        let room_sink: Arc<dyn RoomStatusSink> = state.rooms.clone();
        Self {
            state,
            resolver,
            mapper,
            backend,
            room_sink,
            snapshots,
            clock,
        }
    }

    pub fn with_room_sink(mut self, room_sink: Arc<dyn RoomStatusSink>) -> Self {
        self.room_sink = room_sink;
        self
    }

    pub fn state(&self) -> &PropertyState {
        &self.state
    }

    pub fn reservation(&self, id: &str) -> Option<Reservation> {
        self.store().get(id)
    }

    /// All local reservations sorted by check-in date
    pub fn reservations(&self) -> Vec<Reservation> {
        self.store().all()
    }

    /// Availability for a room type over a date range
    pub async fn check_availability(
        &self,
        room_type_id: &str,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<AvailabilityResult, OpsError> {
        self.resolver
            .check_availability(room_type_id, check_in, check_out)
            .await
    }

    /// Create a reservation
    ///
    /// A new guest profile is registered only once the backend has accepted the
    /// reservation.
    ///
    /// # Errors
    ///
    /// * `InvalidDateRange` / `InvalidPartySize` for bad input
    /// * `UnknownRoomType`, `UnknownRatePlan`, `InactiveRatePlan`, `UnknownGuest`
    /// * `RoomsUnavailable` when the room type is sold out for the dates
    /// * `Backend` when the availability query or the create is rejected
    pub async fn create_reservation(&self, input: NewReservation) -> Result<Reservation, OpsError> {
        input.validate()?;
        let (room_type, plan, nightly_rate) = self
            .resolver
            .resolve_rate(&input.room_type_id, &input.rate_plan_id)?;

        let party = input.adults + input.children;
        if party > room_type.capacity {
            return Err(OpsError::invalid_party_size(&format!(
                "party of {} exceeds {} capacity of {}",
                party, room_type.name, room_type.capacity
            )));
        }

        let (guest, is_new_guest) = match &input.guest {
            GuestSelection::Existing(id) => {
                let guest = self
                    .state
                    .guests
                    .get(id)
                    .ok_or_else(|| OpsError::unknown_guest(id))?;
                (guest, false)
            }
            GuestSelection::New(profile) => (self.state.guests.prepare(profile.clone()), true),
        };

        let availability = self
            .resolver
            .check_availability(&input.room_type_id, input.check_in, input.check_out)
            .await?;
        if !availability.available {
            return Err(OpsError::rooms_unavailable(
                availability
                    .message
                    .as_deref()
                    .unwrap_or("No rooms available for selected dates"),
            ));
        }

        let payload =
            self.mapper
                .create_payload(&input, &guest.id, &room_type, &plan, nightly_rate);
        let created = self
            .backend
            .create_reservation(&payload)
            .await
            .map_err(|e| e.into_ops(BackendOperation::Create))?;

        if is_new_guest {
            self.state.guests.upsert(guest);
        }
        let reservation = self.mapper.to_domain(&created, None);
        self.store().insert(reservation.clone());
        self.save_snapshot();

        info!(
            reservation = %reservation.id,
            confirmation = %reservation.confirmation_number,
            total = %reservation.total_amount,
            "reservation created"
        );
        Ok(reservation)
    }

    /// Apply a typed partial update
    ///
    /// Updates that only touch locally-held fields (such as the discount) are merged
    /// without a backend call; anything else is persisted and then reconciled.
    pub async fn update_reservation(
        &self,
        id: &str,
        update: ReservationUpdate,
    ) -> Result<Reservation, OpsError> {
        let _guard = self.store().lock(id).await;
        self.apply_update(id, update).await
    }

    /// Cancel a reservation, appending the reason to its notes
    pub async fn cancel_reservation(
        &self,
        id: &str,
        reason: Option<&str>,
    ) -> Result<Reservation, OpsError> {
        let _guard = self.store().lock(id).await;
        let current = self.existing(id, "cancel")?;
        let notes = reason
            .filter(|reason| !reason.trim().is_empty())
            .map(|reason| {
                Reservation::append_note(
                    current.notes.as_deref(),
                    &format!("Cancelled: {}", reason.trim()),
                )
            });
        let update = ReservationUpdate {
            status: Some(ReservationStatus::Cancelled),
            notes,
            ..Default::default()
        };
        self.apply_update(id, update).await
    }

    pub async fn confirm_reservation(&self, id: &str) -> Result<Reservation, OpsError> {
        self.update_reservation(id, ReservationUpdate::status(ReservationStatus::Confirmed))
            .await
    }

    /// Mark a reservation as a no-show
    ///
    /// The backend has no no-show status and records the reservation as cancelled;
    /// the local copy keeps the no-show status.
    pub async fn mark_no_show(&self, id: &str) -> Result<Reservation, OpsError> {
        self.update_reservation(id, ReservationUpdate::status(ReservationStatus::NoShow))
            .await
    }

    /// Record an advance payment against a reservation (local only)
    pub async fn record_payment(
        &self,
        id: &str,
        payment: PaymentInput,
    ) -> Result<Reservation, OpsError> {
        let _guard = self.store().lock(id).await;
        if payment.amount <= Decimal::ZERO {
            return Err(OpsError::invalid_amount("payment", payment.amount));
        }
        let current = self.existing(id, "record payment")?;
        if current.status.is_terminal() {
            return Err(OpsError::invalid_transition(
                id,
                current.status,
                "record payment for",
            ));
        }

        let record = payment.into_record(self.clock.now());
        let amount = record.amount;
        let updated = self.store().update(id, |reservation| {
            reservation.payments.push(record);
            reservation.recompute();
            Ok(())
        })?;
        self.save_snapshot();

        info!(
            reservation = id,
            %amount,
            status = %updated.payment_status.as_str(),
            "payment recorded"
        );
        Ok(updated)
    }

    /// Hard-delete a reservation on the backend and locally
    pub async fn delete_reservation(&self, id: &str) -> Result<(), OpsError> {
        let _guard = self.store().lock(id).await;
        self.existing(id, "delete")?;
        self.backend
            .delete_reservation(id)
            .await
            .map_err(|e| e.into_ops(BackendOperation::Delete))?;
        self.store().remove(id);
        self.save_snapshot();
        info!(reservation = id, "reservation deleted");
        Ok(())
    }

    /// Check a guest in
    ///
    /// # Errors
    ///
    /// * `InvalidTransition` unless the reservation is pending or confirmed
    /// * `NoRoomsAssigned` when no room numbers are given
    /// * `UnknownRoom` / `RoomNotAssignable` unless every room exists and is vacant or dirty
    /// * `Backend` when the status change is rejected
    pub async fn check_in(&self, request: CheckInRequest) -> Result<Reservation, OpsError> {
        let id = request.reservation_id.as_str();
        let _guard = self.store().lock(id).await;
        let current = self.existing(id, "check in")?;

        if !current.status.can_check_in() {
            return Err(OpsError::invalid_transition(id, current.status, "check in"));
        }
        if request.room_numbers.is_empty() {
            return Err(OpsError::no_rooms_assigned(id));
        }
        let room_ids = self.assignable_rooms(&request.room_numbers)?;
        if let Some(fee) = request.early_check_in_fee {
            if fee < Decimal::ZERO {
                return Err(OpsError::invalid_amount("early check-in fee", fee));
            }
        }

        let now = self.clock.now();
        let mut next = current.clone();
        next.status = ReservationStatus::CheckedIn;
        next.room_numbers = request.room_numbers.clone();
        next.check_in_details = Some(CheckInDetails {
            documents: normalize_documents(request.documents, now),
            assigned_rooms: request.room_numbers,
            checked_in_at: now,
            handled_by: request.handled_by,
            early_check_in_fee: request.early_check_in_fee,
            remarks: request.remarks,
        });

        let stored = self.persist(&current, next).await?;
        self.set_room_statuses(&room_ids, RoomStatus::Occupied).await?;
        self.save_snapshot();

        info!(
            reservation = %stored.id,
            rooms = ?stored.room_numbers,
            "guest checked in"
        );
        Ok(stored)
    }

    /// Check a guest out and settle the folio
    ///
    /// # Errors
    ///
    /// * `InvalidTransition` unless the reservation is checked in
    /// * `InvalidAmount` for negative discounts or fees, or a non-positive payment
    /// * `InsufficientPayment` when the desk payment does not cover the balance owed
    /// * `Backend` when the status change is rejected
    pub async fn check_out(&self, request: CheckOutRequest) -> Result<Reservation, OpsError> {
        let id = request.reservation_id.as_str();
        let _guard = self.store().lock(id).await;
        let current = self.existing(id, "check out")?;

        if current.status != ReservationStatus::CheckedIn {
            return Err(OpsError::invalid_transition(id, current.status, "check out"));
        }
        if request.discount < Decimal::ZERO {
            return Err(OpsError::invalid_amount("discount", request.discount));
        }
        if let Some(fee) = request.late_checkout_fee {
            if fee < Decimal::ZERO {
                return Err(OpsError::invalid_amount("late checkout fee", fee));
            }
        }
        if let Some(payment) = &request.payment {
            if payment.amount <= Decimal::ZERO {
                return Err(OpsError::invalid_amount("payment", payment.amount));
            }
        }

        let now = self.clock.now();
        let charges = folio_charges(&current, &request);
        let discounts = current.discount + request.discount;

        let folio = build_settlement(
            current.subtotal,
            charges.clone(),
            current.tax,
            discounts,
            current.payments.clone(),
        )?;
        if folio.total_charges < Decimal::ZERO {
            return Err(OpsError::invalid_amount("discount", request.discount));
        }
        let outstanding = folio.balance_due;
        let offered = request
            .payment
            .as_ref()
            .map_or(Decimal::ZERO, |payment| payment.amount);
        if offered < outstanding {
            return Err(OpsError::insufficient_payment(outstanding, offered));
        }

        let mut payments = current.payments.clone();
        if let Some(payment) = request.payment {
            payments.push(payment.into_record(now));
        }
        let settlement = build_settlement(
            current.subtotal,
            charges,
            current.tax,
            discounts,
            payments.clone(),
        )?;

        let mut next = current.clone();
        next.status = ReservationStatus::CheckedOut;
        next.discount = discounts;
        next.extra_charges = settlement.additional_total;
        next.payments = payments;
        next.check_out_details = Some(CheckOutDetails {
            settlement,
            late_checkout_fee: request.late_checkout_fee,
            checked_out_at: now,
            handled_by: request.handled_by,
        });
        next.recompute();

        let stored = self.persist(&current, next).await?;

        let occupied: Vec<RoomId> = stored
            .room_numbers
            .iter()
            .filter_map(|number| self.state.rooms.room_by_number(number))
            .filter(|room| {
                let occupied = room.status == RoomStatus::Occupied;
                if !occupied {
                    debug!(
                        reservation = %stored.id,
                        room = %room.number,
                        status = room.status.as_str(),
                        "room not occupied at check-out, leaving its status"
                    );
                }
                occupied
            })
            .map(|room| room.id)
            .collect();
        self.set_room_statuses(&occupied, RoomStatus::Dirty).await?;
        self.save_snapshot();

        info!(
            reservation = %stored.id,
            total = %stored.total_amount,
            paid = %stored.amount_paid,
            "guest checked out"
        );
        Ok(stored)
    }

    /// Load the local snapshot, then reconcile with the backend
    ///
    /// When the backend cannot be reached the snapshot data stays loaded and the
    /// backend error is returned.
    pub async fn hydrate(&self) -> Result<usize, OpsError> {
        if let Some(snapshot) = self.snapshots.load()? {
            debug!(
                reservations = snapshot.reservations.len(),
                "loaded local snapshot"
            );
            self.state.load(snapshot);
        }
        self.refresh().await
    }

    /// Reconcile the local collection with `GET /reservations`
    ///
    /// The server is authoritative for the fields it stores; locally-held data is kept.
    /// Each record is reconciled under its reservation's lock, and reservations written
    /// locally while the list was in flight are left alone. Returns the number of
    /// reservations held afterwards.
    pub async fn refresh(&self) -> Result<usize, OpsError> {
        let captured: HashMap<String, u64> = self
            .store()
            .all()
            .into_iter()
            .map(|reservation| (reservation.id, reservation.version))
            .collect();

        let records = self
            .backend
            .list_reservations()
            .await
            .map_err(|e| e.into_ops(BackendOperation::List))?;

        let mut stale = 0usize;
        let server_ids: HashSet<&str> = records.iter().map(|r| r.id.as_str()).collect();
        for record in &records {
            let _guard = self.store().lock(&record.id).await;
            match (self.store().get(&record.id), captured.get(&record.id)) {
                (Some(local), Some(&version)) if local.version == version => {
                    let reconciled = self.mapper.to_domain(record, Some(&local));
                    if self
                        .store()
                        .replace_if_version(reconciled, local.version)
                        .is_none()
                    {
                        stale += 1;
                    }
                }
                (None, None) => self.store().insert(self.mapper.to_domain(record, None)),
                // Created, written or deleted locally since the list was requested
                _ => stale += 1,
            }
        }

        for (id, version) in &captured {
            if server_ids.contains(id.as_str()) {
                continue;
            }
            let _guard = self.store().lock(id).await;
            let unchanged = self
                .store()
                .get(id)
                .is_some_and(|current| current.version == *version);
            if unchanged {
                self.store().remove(id);
            }
        }

        if stale > 0 {
            warn!(stale, "skipped reservations written during reconciliation");
        }
        self.save_snapshot();
        let held = self.store().len();
        info!(server = records.len(), held, "reservations reconciled");
        Ok(held)
    }

    fn store(&self) -> &ReservationStore {
        &self.state.reservations
    }

    fn existing(&self, id: &str, operation: &str) -> Result<Reservation, OpsError> {
        self.store()
            .get(id)
            .ok_or_else(|| OpsError::reservation_not_found(id, operation))
    }

    /// Update body shared by every status-changing operation; the caller holds the lock
    async fn apply_update(
        &self,
        id: &str,
        update: ReservationUpdate,
    ) -> Result<Reservation, OpsError> {
        let current = self.existing(id, "update")?;
        update.validate(&current)?;
        if let Some(plan) = &update.rate_plan_id {
            if self.state.rate_plans.get(plan).is_none() {
                return Err(OpsError::unknown_rate_plan(plan));
            }
        }

        let mut next = current.clone();
        update.apply_to(&mut next);

        if !update.touches_server_fields(&current) {
            let stored = self.store().update(id, |reservation| {
                *reservation = next;
                Ok(())
            })?;
            self.save_snapshot();
            debug!(reservation = id, "local-only update merged");
            return Ok(stored);
        }

        let stored = self.persist(&current, next).await?;
        info!(reservation = id, status = %stored.status, "reservation updated");
        Ok(stored)
    }

    /// Send the server-side difference between `current` and `next`, then store the
    /// reconciled result if nothing else wrote the reservation in the meantime
    async fn persist(
        &self,
        current: &Reservation,
        next: Reservation,
    ) -> Result<Reservation, OpsError> {
        let payload = self.mapper.update_payload(current, &next);
        let response = self
            .backend
            .update_reservation(&current.id, &payload)
            .await
            .map_err(|e| e.into_ops(BackendOperation::Update))?;

        let reconciled = self.mapper.to_domain(&response, Some(&next));
        let stored = match self.store().replace_if_version(reconciled, current.version) {
            Some(stored) => stored,
            None => {
                // Someone wrote the reservation outside the lock; keep their copy but
                // layer this operation's local state and the newer server record on top
                warn!(reservation = %current.id, "reservation changed during update, merging");
                self.store().update(&current.id, |stored| {
                    stored.carry_local_state(&next);
                    *stored = self.mapper.to_domain(&response, Some(&*stored));
                    Ok(())
                })?
            }
        };
        self.save_snapshot();
        Ok(stored)
    }

    /// Resolve room numbers to ids, requiring each room to be vacant or dirty
    fn assignable_rooms(&self, numbers: &[String]) -> Result<Vec<RoomId>, OpsError> {
        numbers
            .iter()
            .map(|number| {
                let room = self
                    .state
                    .rooms
                    .room_by_number(number)
                    .ok_or_else(|| OpsError::unknown_room(number))?;
                if !room.status.is_assignable() {
                    return Err(OpsError::room_not_assignable(number, room.status));
                }
                Ok(room.id)
            })
            .collect()
    }

    async fn set_room_statuses(
        &self,
        room_ids: &[RoomId],
        status: RoomStatus,
    ) -> Result<(), OpsError> {
        try_join_all(
            room_ids
                .iter()
                .map(|room_id| self.room_sink.update_room_status(room_id, status)),
        )
        .await?;
        Ok(())
    }

    fn save_snapshot(&self) {
        if let Err(e) = self.snapshots.save(&self.state.to_snapshot()) {
            warn!(error = %e, "failed to save local snapshot");
        }
    }
}

/// Submitted charges plus the early check-in and late checkout fees
fn folio_charges(current: &Reservation, request: &CheckOutRequest) -> Vec<ChargeItem> {
    let mut charges = request.additional_charges.clone();
    let early_fee = current
        .check_in_details
        .as_ref()
        .and_then(|details| details.early_check_in_fee)
        .filter(|fee| *fee > Decimal::ZERO);
    if let Some(fee) = early_fee {
        charges.push(ChargeItem::new("Early check-in fee", fee));
    }
    if let Some(fee) = request.late_checkout_fee.filter(|fee| *fee > Decimal::ZERO) {
        charges.push(ChargeItem::new("Late checkout fee", fee));
    }
    charges
}

fn normalize_documents(
    documents: Vec<DocumentInput>,
    verified_at: NaiveDateTime,
) -> Vec<IdentityDocument> {
    documents
        .into_iter()
        .map(|document| IdentityDocument {
            id: Uuid::new_v4().to_string(),
            kind: document.kind,
            number: document.number.trim().to_string(),
            issuing_country: document.issuing_country,
            verified_at,
        })
        .collect()
}
