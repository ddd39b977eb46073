//! Typed operation inputs for the reservation lifecycle engine
//!
//! Partial updates are an explicit struct of optional fields validated before any
//! backend call, rather than a free-form object merge.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::error::OpsError;
use super::guest::GuestSelection;
use super::reservation::{Reservation, ReservationId, ReservationStatus};
use super::settlement::{ChargeItem, PaymentInput};

/// Input for creating a reservation
#[derive(Debug, Clone, PartialEq)]
pub struct NewReservation {
    pub guest: GuestSelection,
    pub room_type_id: String,
    pub rate_plan_id: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub adults: u32,
    pub children: u32,
    /// Booking channel (walk-in, phone, website, ...)
    pub source: Option<String>,
    pub notes: Option<String>,
}

impl NewReservation {
    /// Local checks that need no lookup tables
    pub fn validate(&self) -> Result<(), OpsError> {
        if self.check_out <= self.check_in {
            return Err(OpsError::InvalidDateRange {
                check_in: self.check_in,
                check_out: self.check_out,
            });
        }
        if self.adults == 0 {
            return Err(OpsError::invalid_party_size("at least one adult is required"));
        }
        Ok(())
    }
}

/// Partial update of a reservation
///
/// Every field is optional; `None` leaves the current value alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReservationUpdate {
    pub status: Option<ReservationStatus>,
    pub notes: Option<String>,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub adults: Option<u32>,
    pub children: Option<u32>,
    pub room_numbers: Option<Vec<String>>,
    pub nightly_rate: Option<Decimal>,
    pub rate_plan_id: Option<String>,
    /// Local-only commercial adjustment, never sent to the backend
    pub discount: Option<Decimal>,
}

impl ReservationUpdate {
    pub fn status(status: ReservationStatus) -> Self {
        ReservationUpdate {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Check the update against the reservation it will be applied to
    ///
    /// Checking in and checking out carry room and settlement side effects, so a plain
    /// update may not move a reservation into either status.
    pub fn validate(&self, current: &Reservation) -> Result<(), OpsError> {
        if let Some(next) = self.status {
            let desk_only = next != current.status
                && matches!(
                    next,
                    ReservationStatus::CheckedIn | ReservationStatus::CheckedOut
                );
            if desk_only || !current.status.can_transition_to(next) {
                return Err(OpsError::invalid_transition(
                    &current.id,
                    current.status,
                    &format!("move to {}", next),
                ));
            }
        }

        let check_in = self.check_in.unwrap_or(current.check_in);
        let check_out = self.check_out.unwrap_or(current.check_out);
        if (self.check_in.is_some() || self.check_out.is_some()) && check_out <= check_in {
            return Err(OpsError::InvalidDateRange {
                check_in,
                check_out,
            });
        }

        if self.adults == Some(0) {
            return Err(OpsError::invalid_party_size("at least one adult is required"));
        }
        if let Some(rate) = self.nightly_rate {
            if rate < Decimal::ZERO {
                return Err(OpsError::invalid_amount("nightly rate", rate));
            }
        }
        if let Some(discount) = self.discount {
            if discount < Decimal::ZERO {
                return Err(OpsError::invalid_amount("discount", discount));
            }
        }

        let mut preview = current.clone();
        self.apply_to(&mut preview);
        if preview.total_amount < Decimal::ZERO {
            return Err(OpsError::invalid_amount("discount", preview.discount));
        }
        Ok(())
    }

    /// Whether any field the backend stores differs from the current reservation
    pub fn touches_server_fields(&self, current: &Reservation) -> bool {
        fn changed<T: PartialEq>(next: &Option<T>, current: &T) -> bool {
            next.as_ref().is_some_and(|value| value != current)
        }

        changed(&self.status, &current.status)
            || self
                .notes
                .as_ref()
                .is_some_and(|notes| current.notes.as_ref() != Some(notes))
            || changed(&self.check_in, &current.check_in)
            || changed(&self.check_out, &current.check_out)
            || changed(&self.adults, &current.adults)
            || changed(&self.children, &current.children)
            || changed(&self.room_numbers, &current.room_numbers)
            || changed(&self.nightly_rate, &current.nightly_rate)
            || changed(&self.rate_plan_id, &current.rate_plan_id)
    }

    /// Merge the update into a reservation and re-derive totals
    pub fn apply_to(&self, reservation: &mut Reservation) {
        if let Some(status) = self.status {
            reservation.status = status;
        }
        if let Some(notes) = &self.notes {
            reservation.notes = Some(notes.clone());
        }
        if let Some(check_in) = self.check_in {
            reservation.check_in = check_in;
        }
        if let Some(check_out) = self.check_out {
            reservation.check_out = check_out;
        }
        if let Some(adults) = self.adults {
            reservation.adults = adults;
        }
        if let Some(children) = self.children {
            reservation.children = children;
        }
        if let Some(rooms) = &self.room_numbers {
            reservation.room_numbers = rooms.clone();
        }
        if let Some(rate) = self.nightly_rate {
            reservation.nightly_rate = rate;
        }
        if let Some(plan) = &self.rate_plan_id {
            reservation.rate_plan_id = plan.clone();
        }
        if let Some(discount) = self.discount {
            reservation.discount = discount;
        }
        reservation.recompute();
    }
}

/// Identity document as submitted at the desk
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentInput {
    pub kind: String,
    pub number: String,
    pub issuing_country: Option<String>,
}

/// Check-in submission
#[derive(Debug, Clone, PartialEq)]
pub struct CheckInRequest {
    pub reservation_id: ReservationId,
    pub room_numbers: Vec<String>,
    pub documents: Vec<DocumentInput>,
    pub handled_by: String,
    pub early_check_in_fee: Option<Decimal>,
    pub remarks: Option<String>,
}

/// Check-out submission
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutRequest {
    pub reservation_id: ReservationId,
    pub additional_charges: Vec<ChargeItem>,
    /// Discount granted at the desk, on top of any booking discount
    pub discount: Decimal,
    /// Payment collected at the desk
    pub payment: Option<PaymentInput>,
    pub late_checkout_fee: Option<Decimal>,
    pub handled_by: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn reservation() -> Reservation {
        Reservation::new("r-1", "g-1", "dlx", date(10), date(13), Decimal::new(5000, 0))
    }

    #[test]
    fn test_discount_only_update_is_local() {
        let update = ReservationUpdate {
            discount: Some(Decimal::new(100, 0)),
            ..Default::default()
        };
        assert!(!update.touches_server_fields(&reservation()));
    }

    #[test]
    fn test_unchanged_values_are_not_server_changes() {
        let current = reservation();
        let update = ReservationUpdate {
            check_in: Some(current.check_in),
            adults: Some(current.adults),
            ..Default::default()
        };
        assert!(!update.touches_server_fields(&current));
    }

    #[rstest]
    #[case::status(ReservationUpdate::status(ReservationStatus::Confirmed))]
    #[case::notes(ReservationUpdate { notes: Some("late arrival".to_string()), ..Default::default() })]
    #[case::dates(ReservationUpdate { check_out: Some(date(15)), ..Default::default() })]
    #[case::party(ReservationUpdate { children: Some(2), ..Default::default() })]
    fn test_server_field_changes(#[case] update: ReservationUpdate) {
        assert!(update.touches_server_fields(&reservation()));
    }

    #[test]
    fn test_apply_recomputes_totals() {
        let mut current = reservation();
        let update = ReservationUpdate {
            check_out: Some(date(15)),
            ..Default::default()
        };
        update.apply_to(&mut current);

        assert_eq!(current.nights, 5);
        assert_eq!(current.subtotal, Decimal::new(25000, 0));
    }

    fn checked_in() -> Reservation {
        let mut current = reservation();
        current.status = ReservationStatus::CheckedIn;
        current
    }

    #[rstest]
    #[case::check_in_from_pending(reservation(), ReservationStatus::CheckedIn)]
    #[case::check_out_from_checked_in(checked_in(), ReservationStatus::CheckedOut)]
    fn test_desk_statuses_rejected_by_update(
        #[case] current: Reservation,
        #[case] target: ReservationStatus,
    ) {
        let error = ReservationUpdate::status(target)
            .validate(&current)
            .unwrap_err();

        assert!(matches!(error, OpsError::InvalidTransition { .. }), "{error:?}");
    }

    #[test]
    fn test_same_status_update_still_allowed() {
        let update = ReservationUpdate {
            status: Some(ReservationStatus::CheckedIn),
            notes: Some("extra towels".to_string()),
            ..Default::default()
        };
        assert!(update.validate(&checked_in()).is_ok());
    }

    #[rstest]
    #[case::covers_folio(15000, true)]
    #[case::exceeds_folio(15001, false)]
    #[case::far_exceeds_folio(100000, false)]
    fn test_discount_bounded_by_folio(#[case] discount: i64, #[case] accepted: bool) {
        let update = ReservationUpdate {
            discount: Some(Decimal::new(discount, 0)),
            ..Default::default()
        };

        let result = update.validate(&reservation());

        assert_eq!(result.is_ok(), accepted, "{result:?}");
        if !accepted {
            assert!(matches!(result, Err(OpsError::InvalidAmount { .. })));
        }
    }

    #[test]
    fn test_discount_checked_against_new_dates() {
        let update = ReservationUpdate {
            check_out: Some(date(11)),
            discount: Some(Decimal::new(10000, 0)),
            ..Default::default()
        };
        assert!(update.validate(&reservation()).is_err());
    }

    #[rstest]
    #[case::bad_transition(ReservationUpdate::status(ReservationStatus::CheckedOut))]
    #[case::reversed_dates(ReservationUpdate { check_out: Some(date(9)), ..Default::default() })]
    #[case::no_adults(ReservationUpdate { adults: Some(0), ..Default::default() })]
    #[case::negative_discount(ReservationUpdate { discount: Some(Decimal::NEGATIVE_ONE), ..Default::default() })]
    fn test_validate_rejects(#[case] update: ReservationUpdate) {
        assert!(update.validate(&reservation()).is_err());
    }
}
