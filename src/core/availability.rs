//! Rate and availability resolution
//!
//! Remaining inventory always comes from the backend; this module only applies the
//! sell/warn policy on top of the count and derives the nightly rate from the room
//! type and rate plan.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use std::sync::Arc;
use tracing::debug;

use super::catalog::RatePlanTable;
use super::room_inventory::RoomInventory;
use crate::backend::{AvailabilityQuery, BackendOperation, ReservationBackend};
use crate::types::{OpsError, RatePlan, RoomType};

/// Remaining count at or below which a low-inventory warning is attached
const LOW_INVENTORY_THRESHOLD: u32 = 2;

/// Outcome of an availability check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityResult {
    pub available: bool,
    pub available_rooms: u32,
    /// Shown to the operator when inventory is exhausted or low
    pub message: Option<String>,
}

impl AvailabilityResult {
    /// Apply the sell/warn policy to a remaining-room count
    pub fn from_remaining(remaining: u32) -> Self {
        let message = match remaining {
            0 => Some("No rooms available for selected dates".to_string()),
            n if n <= LOW_INVENTORY_THRESHOLD => {
                Some(format!("Only {n} room(s) left for selected dates"))
            }
            _ => None,
        };
        Self {
            available: remaining > 0,
            available_rooms: remaining,
            message,
        }
    }

    fn unknown_room_type() -> Self {
        Self {
            available: false,
            available_rooms: 0,
            message: Some("Selected room type is not available".to_string()),
        }
    }
}

/// Nightly rate for a room type under a rate plan
///
/// The plan's override replaces the room type's base rate; the discount is applied
/// and the result rounded half away from zero to whole currency units, never below 0.
pub fn nightly_rate(room_type: &RoomType, plan: &RatePlan) -> Decimal {
    let base = plan.base_rate_override.unwrap_or(room_type.base_rate);
    let factor = Decimal::ONE - plan.discount_percentage / Decimal::ONE_HUNDRED;
    (base * factor)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .max(Decimal::ZERO)
}

/// Resolves sellable inventory and pricing for new reservations
#[derive(Clone)]
pub struct AvailabilityResolver {
    rooms: Arc<RoomInventory>,
    rate_plans: Arc<RatePlanTable>,
    backend: Arc<dyn ReservationBackend>,
}

impl AvailabilityResolver {
    pub fn new(
        rooms: Arc<RoomInventory>,
        rate_plans: Arc<RatePlanTable>,
        backend: Arc<dyn ReservationBackend>,
    ) -> Self {
        Self {
            rooms,
            rate_plans,
            backend,
        }
    }

    /// Check whether a room type can still be sold for a date range
    ///
    /// An unknown room type fails closed without asking the backend.
    ///
    /// # Errors
    ///
    /// Returns a `Backend` error when the availability query fails.
    pub async fn check_availability(
        &self,
        room_type_id: &str,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<AvailabilityResult, OpsError> {
        let Some(room_type) = self.rooms.room_type(room_type_id) else {
            debug!(room_type = room_type_id, "availability check for unknown room type");
            return Ok(AvailabilityResult::unknown_room_type());
        };

        let query = AvailabilityQuery {
            arrival_date: check_in,
            departure_date: check_out,
            room_type: room_type.code.clone(),
        };
        let response = self
            .backend
            .availability(&query)
            .await
            .map_err(|e| e.into_ops(BackendOperation::Availability))?;

        debug!(
            room_type = %room_type.code,
            %check_in,
            %check_out,
            remaining = response.total_available,
            "availability resolved"
        );
        Ok(AvailabilityResult::from_remaining(response.total_available))
    }

    /// Look up the room type and an active rate plan, and price the stay
    ///
    /// # Errors
    ///
    /// * `UnknownRoomType` / `UnknownRatePlan` if either id is missing
    /// * `InactiveRatePlan` if the plan is switched off
    pub fn resolve_rate(
        &self,
        room_type_id: &str,
        rate_plan_id: &str,
    ) -> Result<(RoomType, RatePlan, Decimal), OpsError> {
        let room_type = self
            .rooms
            .room_type(room_type_id)
            .ok_or_else(|| OpsError::unknown_room_type(room_type_id))?;
        let plan = self
            .rate_plans
            .get(rate_plan_id)
            .ok_or_else(|| OpsError::unknown_rate_plan(rate_plan_id))?;
        if !plan.active {
            return Err(OpsError::inactive_rate_plan(rate_plan_id));
        }
        let rate = nightly_rate(&room_type, &plan);
        Ok((room_type, plan, rate))
    }
}
