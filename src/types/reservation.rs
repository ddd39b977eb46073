//! Reservation aggregate
//!
//! This module defines the central Reservation type, its lifecycle status and the
//! detail records attached at check-in and check-out.
//!
//! # Derived Fields
//!
//! `nights`, `subtotal`, `tax`, `total_amount`, `amount_paid` and `payment_status` are
//! never written directly by callers. [`Reservation::recompute`] derives them from the
//! stay dates, nightly rate, tax rate, discounts, posted charges and payments, so
//! `total_amount = subtotal + extra_charges + tax - discount` holds after every write.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::guest::GuestId;
use super::rate_plan::RatePlanId;
use super::room::RoomTypeId;
use super::settlement::{round_money, PaymentRecord, PaymentStatus, SettlementSummary};

/// Internal reservation identifier (assigned by the backend)
pub type ReservationId = String;

/// Lifecycle status of a reservation
///
/// ```text
/// pending --confirm--> confirmed
/// pending/confirmed --check in--> checked-in
/// checked-in --check out--> checked-out
/// pending/confirmed/checked-in --cancel--> cancelled
/// pending/confirmed --no-show--> no-show
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    CheckedIn,
    CheckedOut,
    Cancelled,
    NoShow,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::CheckedIn => "checked-in",
            ReservationStatus::CheckedOut => "checked-out",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::NoShow => "no-show",
        }
    }

    /// Terminal states accept no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReservationStatus::CheckedOut | ReservationStatus::Cancelled | ReservationStatus::NoShow
        )
    }

    /// Whether the reservation may be checked in from this status
    pub fn can_check_in(&self) -> bool {
        matches!(self, ReservationStatus::Pending | ReservationStatus::Confirmed)
    }

    /// Whether the state machine allows moving from `self` to `next`
    ///
    /// Staying in the same status is always allowed.
    pub fn can_transition_to(&self, next: ReservationStatus) -> bool {
        use ReservationStatus::*;
        if *self == next {
            return true;
        }
        matches!(
            (*self, next),
            (Pending, Confirmed)
                | (Pending, CheckedIn)
                | (Confirmed, CheckedIn)
                | (CheckedIn, CheckedOut)
                | (Pending, Cancelled)
                | (Confirmed, Cancelled)
                | (CheckedIn, Cancelled)
                | (Pending, NoShow)
                | (Confirmed, NoShow)
        )
    }

    /// Whether this reservation still holds inventory
    pub fn holds_inventory(&self) -> bool {
        !matches!(self, ReservationStatus::Cancelled | ReservationStatus::NoShow)
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity document verified at the desk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityDocument {
    pub id: String,
    /// Passport, national id, driving licence, ...
    pub kind: String,
    pub number: String,
    #[serde(default)]
    pub issuing_country: Option<String>,
    pub verified_at: NaiveDateTime,
}

/// Recorded when a guest checks in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInDetails {
    pub documents: Vec<IdentityDocument>,
    pub assigned_rooms: Vec<String>,
    pub checked_in_at: NaiveDateTime,
    pub handled_by: String,
    #[serde(default)]
    pub early_check_in_fee: Option<Decimal>,
    #[serde(default)]
    pub remarks: Option<String>,
}

/// Recorded when a guest checks out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutDetails {
    pub settlement: SettlementSummary,
    #[serde(default)]
    pub late_checkout_fee: Option<Decimal>,
    pub checked_out_at: NaiveDateTime,
    pub handled_by: String,
}

/// Reservation aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: ReservationId,
    pub confirmation_number: String,

    pub guest_id: GuestId,
    pub room_type_id: RoomTypeId,
    /// Room numbers linked to the stay (empty until assigned)
    #[serde(default)]
    pub room_numbers: Vec<String>,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
    pub nights: u32,

    pub rate_plan_id: RatePlanId,
    pub nightly_rate: Decimal,
    pub subtotal: Decimal,
    /// Tax rate in percent applied to the subtotal
    pub tax_rate: Decimal,
    pub tax: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    /// Additional charges (including their tax) settled at check-out
    #[serde(default)]
    pub extra_charges: Decimal,
    pub total_amount: Decimal,
    pub amount_paid: Decimal,
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub payments: Vec<PaymentRecord>,

    pub status: ReservationStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub source: Option<String>,

    #[serde(default)]
    pub check_in_details: Option<CheckInDetails>,
    #[serde(default)]
    pub check_out_details: Option<CheckOutDetails>,

    /// Bumped on every local write; stale reconciliations are discarded by comparing it
    #[serde(default)]
    pub version: u64,
}

/// Whole nights between two dates, never less than one
pub fn nights_between(check_in: NaiveDate, check_out: NaiveDate) -> u32 {
    let days = (check_out - check_in).num_days();
    u32::try_from(days).unwrap_or(0).max(1)
}

impl Reservation {
    /// Create a pending reservation with derived fields computed
    pub fn new(
        id: &str,
        guest_id: &str,
        room_type_id: &str,
        check_in: NaiveDate,
        check_out: NaiveDate,
        nightly_rate: Decimal,
    ) -> Self {
        let mut reservation = Reservation {
            id: id.to_string(),
            confirmation_number: String::new(),
            guest_id: guest_id.to_string(),
            room_type_id: room_type_id.to_string(),
            room_numbers: Vec::new(),
            check_in,
            check_out,
            adults: 1,
            children: 0,
            nights: 1,
            rate_plan_id: String::new(),
            nightly_rate,
            subtotal: Decimal::ZERO,
            tax_rate: Decimal::ZERO,
            tax: Decimal::ZERO,
            discount: Decimal::ZERO,
            extra_charges: Decimal::ZERO,
            total_amount: Decimal::ZERO,
            amount_paid: Decimal::ZERO,
            payment_status: PaymentStatus::Unpaid,
            payments: Vec::new(),
            status: ReservationStatus::Pending,
            notes: None,
            source: None,
            check_in_details: None,
            check_out_details: None,
            version: 0,
        };
        reservation.recompute();
        reservation
    }

    /// Re-derive nights, money totals and payment status
    pub fn recompute(&mut self) {
        self.nights = nights_between(self.check_in, self.check_out);
        self.subtotal = self.nightly_rate * Decimal::from(self.nights);
        self.tax = round_money(self.subtotal * self.tax_rate / Decimal::ONE_HUNDRED);
        self.total_amount = self.subtotal + self.extra_charges + self.tax - self.discount;
        self.amount_paid = self.payments.iter().map(|p| p.amount).sum();

        let balance_due = (self.total_amount - self.amount_paid).max(Decimal::ZERO);
        self.payment_status =
            PaymentStatus::classify(self.total_amount, balance_due, self.amount_paid);
    }

    /// Copy the locally-held state of `from`: status, desk details, payments and
    /// commercial adjustments. Derived fields are left for the next recompute.
    pub fn carry_local_state(&mut self, from: &Reservation) {
        self.status = from.status;
        self.check_in_details = from.check_in_details.clone();
        self.check_out_details = from.check_out_details.clone();
        self.payments = from.payments.clone();
        self.discount = from.discount;
        self.extra_charges = from.extra_charges;
    }

    /// Amount still owed on the folio
    pub fn balance_due(&self) -> Decimal {
        round_money((self.total_amount - self.amount_paid).max(Decimal::ZERO))
    }

    /// Rooms this reservation occupies for overbooking purposes
    pub fn rooms_booked(&self) -> u32 {
        u32::try_from(self.room_numbers.len()).unwrap_or(u32::MAX).max(1)
    }

    /// Append a line to the notes instead of overwriting them
    pub fn append_note(notes: Option<&str>, line: &str) -> String {
        match notes {
            Some(existing) if !existing.trim().is_empty() => format!("{}\n{}", existing, line),
            _ => line.to_string(),
        }
    }
}
