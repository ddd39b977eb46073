//! Operational alert rules
//!
//! The `AlertEngine` scans reservations and rooms for conditions the front desk needs to
//! act on and merges matches into an in-memory alert list.
//!
//! # Rules
//!
//! - **late-checkout**: a checked-in stay past the checkout cutoff on its departure day
//! - **room-not-cleaned**: a dirty room with no cleaning stamp, or a stale one
//! - **payment-pending**: a confirmed or checked-out reservation that is not fully paid
//! - **overbooking**: a night on which booked rooms exceed the room inventory
//!
//! # Merge Rules
//!
//! A match is raised only if no unacknowledged alert with the same rule and message
//! exists, so repeated evaluations over unchanged state raise nothing new. Existing
//! alerts are never expired by evaluation; the list is kept newest first and capped.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use super::state::PropertyState;
use super::traits::Clock;
use crate::config::EngineConfig;
use crate::types::{
    AlertCategory, AlertItem, AlertRule, OpsError, PaymentStatus, Reservation,
    ReservationStatus, RoomStatus,
};

/// Thresholds the rules evaluate against
#[derive(Debug, Clone, PartialEq)]
pub struct AlertSettings {
    pub checkout_cutoff: NaiveTime,
    pub cleaning_threshold: Duration,
    pub max_alerts: usize,
    pub currency: String,
}

impl From<&EngineConfig> for AlertSettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            checkout_cutoff: config.checkout_cutoff(),
            cleaning_threshold: Duration::minutes(config.cleaning_threshold_minutes),
            max_alerts: config.max_alerts,
            currency: config.currency.clone(),
        }
    }
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

/// A rule match before it is merged into the list
struct Candidate<'a> {
    rule: &'a AlertRule,
    title: String,
    message: String,
    /// Set for rules whose message changes while the condition persists
    subject: Option<String>,
}

pub struct AlertEngine {
    state: PropertyState,
    rules: Vec<AlertRule>,
    clock: Arc<dyn Clock>,
    settings: AlertSettings,
    alerts: RwLock<Vec<AlertItem>>,
}

impl AlertEngine {
    pub fn new(
        state: PropertyState,
        rules: Vec<AlertRule>,
        clock: Arc<dyn Clock>,
        settings: AlertSettings,
    ) -> Self {
        Self {
            state,
            rules,
            clock,
            settings,
            alerts: RwLock::new(Vec::new()),
        }
    }

    /// Evaluate all active rules at the current clock time
    ///
    /// Returns the alerts raised by this pass.
    pub async fn evaluate(&self) -> Vec<AlertItem> {
        self.evaluate_at(self.clock.now()).await
    }

    /// Evaluate all active rules as of `now`
    pub async fn evaluate_at(&self, now: NaiveDateTime) -> Vec<AlertItem> {
        let reservations = self.state.reservations.all();
        let mut candidates = Vec::new();

        for rule in self.rules.iter().filter(|rule| rule.active) {
            match rule.category {
                AlertCategory::LateCheckout => {
                    self.late_checkouts(rule, &reservations, now, &mut candidates)
                }
                AlertCategory::RoomNotCleaned => self.uncleaned_rooms(rule, now, &mut candidates),
                AlertCategory::PaymentPending => {
                    self.pending_payments(rule, &reservations, &mut candidates)
                }
                AlertCategory::Overbooking => {
                    self.overbooked_nights(rule, &reservations, &mut candidates)
                }
            }
        }

        let mut alerts = self.alerts.write().await;
        let mut raised: Vec<AlertItem> = Vec::new();
        for candidate in candidates {
            if let Some(subject) = candidate.subject.as_deref() {
                let open = alerts.iter_mut().find(|alert| {
                    !alert.is_acknowledged()
                        && alert.rule_id == candidate.rule.id
                        && alert.subject.as_deref() == Some(subject)
                });
                if let Some(open) = open {
                    open.message = candidate.message;
                    continue;
                }
            }
            let duplicate = alerts.iter().chain(raised.iter()).any(|alert| {
                !alert.is_acknowledged()
                    && alert.rule_id == candidate.rule.id
                    && alert.message == candidate.message
            });
            if duplicate {
                continue;
            }
            raised.push(AlertItem {
                id: Uuid::new_v4().to_string(),
                rule_id: candidate.rule.id.clone(),
                category: candidate.rule.category,
                severity: candidate.rule.severity,
                title: candidate.title,
                message: candidate.message,
                created_at: now,
                is_read: false,
                acknowledged_by: None,
                acknowledged_at: None,
                subject: candidate.subject,
            });
        }

        if !raised.is_empty() {
            let mut merged = raised.clone();
            merged.append(&mut alerts);
            *alerts = merged;
            alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            alerts.truncate(self.settings.max_alerts);
            info!(raised = raised.len(), total = alerts.len(), "alerts raised");
        } else {
            debug!(total = alerts.len(), "alert evaluation raised nothing");
        }
        raised
    }

    /// Current alerts, newest first
    pub async fn alerts(&self) -> Vec<AlertItem> {
        self.alerts.read().await.clone()
    }

    pub async fn unread_count(&self) -> usize {
        self.alerts
            .read()
            .await
            .iter()
            .filter(|alert| !alert.is_read)
            .count()
    }

    /// Unknown ids are ignored
    pub async fn mark_as_read(&self, id: &str) {
        if let Some(alert) = self.alerts.write().await.iter_mut().find(|a| a.id == id) {
            alert.is_read = true;
        }
    }

    pub async fn mark_all_read(&self) {
        for alert in self.alerts.write().await.iter_mut() {
            alert.is_read = true;
        }
    }

    /// Acknowledge an alert on behalf of `actor`; it is marked read as well
    pub async fn acknowledge_alert(&self, id: &str, actor: &str) -> Result<AlertItem, OpsError> {
        let now = self.clock.now();
        let mut alerts = self.alerts.write().await;
        let alert = alerts
            .iter_mut()
            .find(|alert| alert.id == id)
            .ok_or_else(|| OpsError::alert_not_found(id))?;
        alert.is_read = true;
        alert.acknowledged_by = Some(actor.to_string());
        alert.acknowledged_at = Some(now);
        info!(alert = id, actor, "alert acknowledged");
        Ok(alert.clone())
    }

    /// Remove an alert; returns whether it existed
    pub async fn dismiss_alert(&self, id: &str) -> bool {
        let mut alerts = self.alerts.write().await;
        let before = alerts.len();
        alerts.retain(|alert| alert.id != id);
        alerts.len() != before
    }

    fn guest_label(&self, reservation: &Reservation) -> String {
        self.state
            .guests
            .get(&reservation.guest_id)
            .map(|guest| guest.full_name())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "Guest".to_string())
    }

    fn late_checkouts<'a>(
        &self,
        rule: &'a AlertRule,
        reservations: &[Reservation],
        now: NaiveDateTime,
        out: &mut Vec<Candidate<'a>>,
    ) {
        for reservation in reservations
            .iter()
            .filter(|r| r.status == ReservationStatus::CheckedIn)
        {
            let deadline = reservation.check_out.and_time(self.settings.checkout_cutoff);
            if now <= deadline {
                continue;
            }
            let overdue = (now - deadline).num_minutes();
            let rooms = if reservation.room_numbers.is_empty() {
                "an unassigned room".to_string()
            } else {
                format!("room {}", reservation.room_numbers.join(", "))
            };
            out.push(Candidate {
                rule,
                title: "Late checkout".to_string(),
                message: format!(
                    "{} ({}) in {} is {} minutes past checkout",
                    self.guest_label(reservation),
                    reservation.confirmation_number,
                    rooms,
                    overdue
                ),
                subject: Some(reservation.id.clone()),
            });
        }
    }

    fn uncleaned_rooms<'a>(
        &self,
        rule: &'a AlertRule,
        now: NaiveDateTime,
        out: &mut Vec<Candidate<'a>>,
    ) {
        for room in self
            .state
            .rooms
            .rooms()
            .into_iter()
            .filter(|room| room.status == RoomStatus::Dirty)
        {
            let message = match room.last_cleaned {
                None => format!("Room {} is dirty with no cleaning record", room.number),
                Some(at) if now - at > self.settings.cleaning_threshold => format!(
                    "Room {} is dirty; last cleaned {}",
                    room.number,
                    at.format("%Y-%m-%d %H:%M")
                ),
                Some(_) => continue,
            };
            out.push(Candidate {
                rule,
                title: "Room not cleaned".to_string(),
                message,
                subject: None,
            });
        }
    }

    fn pending_payments<'a>(
        &self,
        rule: &'a AlertRule,
        reservations: &[Reservation],
        out: &mut Vec<Candidate<'a>>,
    ) {
        let currency = &self.settings.currency;
        for reservation in reservations.iter().filter(|r| {
            matches!(
                r.status,
                ReservationStatus::CheckedOut | ReservationStatus::Confirmed
            ) && r.payment_status != PaymentStatus::Paid
        }) {
            let guest = self.guest_label(reservation);
            let message = if reservation.payment_status == PaymentStatus::Refunded {
                format!(
                    "{} ({}) is due a refund of {} {:.2}",
                    guest,
                    reservation.confirmation_number,
                    currency,
                    reservation.amount_paid - reservation.total_amount
                )
            } else {
                format!(
                    "{} ({}) has an outstanding balance of {} {:.2}",
                    guest,
                    reservation.confirmation_number,
                    currency,
                    reservation.balance_due()
                )
            };
            out.push(Candidate {
                rule,
                title: "Payment pending".to_string(),
                message,
                subject: None,
            });
        }
    }

    fn overbooked_nights<'a>(
        &self,
        rule: &'a AlertRule,
        reservations: &[Reservation],
        out: &mut Vec<Candidate<'a>>,
    ) {
        let capacity = u32::try_from(self.state.rooms.total_rooms()).unwrap_or(u32::MAX);
        if capacity == 0 {
            return;
        }
        for (night, booked) in rooms_booked_per_night(reservations) {
            if booked > capacity {
                out.push(Candidate {
                    rule,
                    title: "Overbooking".to_string(),
                    message: format!(
                        "{}: {} rooms booked, {} available",
                        night, booked, capacity
                    ),
                    subject: None,
                });
            }
        }
    }
}

/// Rooms booked on each night spanned by reservations that still hold inventory
pub fn rooms_booked_per_night(reservations: &[Reservation]) -> BTreeMap<NaiveDate, u32> {
    let mut nights: BTreeMap<NaiveDate, u32> = BTreeMap::new();
    for reservation in reservations.iter().filter(|r| r.status.holds_inventory()) {
        let booked = reservation.rooms_booked();
        for night in reservation
            .check_in
            .iter_days()
            .take_while(|day| *day < reservation.check_out)
        {
            *nights.entry(night).or_insert(0) += booked;
        }
    }
    nights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::FixedClock;
    use crate::types::{AlertSeverity, PaymentMethod, PaymentRecord, Room};
    use rust_decimal::Decimal;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        date(d).and_hms_opt(h, m, 0).unwrap()
    }

    fn reservation(id: &str, check_in: u32, check_out: u32, status: ReservationStatus) -> Reservation {
        let mut r = Reservation::new(
            id,
            "g-1",
            "dlx",
            date(check_in),
            date(check_out),
            Decimal::new(5000, 0),
        );
        r.confirmation_number = format!("CNF-{id}");
        r.status = status;
        r
    }

    fn engine_with(state: PropertyState, now: NaiveDateTime) -> AlertEngine {
        AlertEngine::new(
            state,
            AlertRule::default_rules(),
            Arc::new(FixedClock::new(now)),
            AlertSettings::default(),
        )
    }

    fn state_with_rooms(count: usize) -> PropertyState {
        let state = PropertyState::new();
        for n in 0..count {
            state
                .rooms
                .upsert_room(Room::new(&format!("room-{n}"), &format!("{}", 101 + n), "dlx"));
        }
        state
    }

    #[tokio::test]
    async fn test_overbooking_six_reservations_five_rooms() {
        let state = state_with_rooms(5);
        for n in 0..6 {
            state
                .reservations
                .insert(reservation(&format!("r-{n}"), 10, 11, ReservationStatus::Pending));
        }
        let engine = engine_with(state, at(9, 9, 0));

        let raised = engine.evaluate().await;

        assert_eq!(raised.len(), 1);
        assert_eq!(raised[0].category, AlertCategory::Overbooking);
        assert_eq!(raised[0].severity, AlertSeverity::Critical);
        assert_eq!(raised[0].message, "2025-01-10: 6 rooms booked, 5 available");
    }

    #[tokio::test]
    async fn test_cancelled_and_no_show_do_not_count_toward_overbooking() {
        let state = state_with_rooms(1);
        state
            .reservations
            .insert(reservation("r-1", 10, 12, ReservationStatus::Confirmed));
        state
            .reservations
            .insert(reservation("r-2", 10, 12, ReservationStatus::Cancelled));
        state
            .reservations
            .insert(reservation("r-3", 11, 12, ReservationStatus::NoShow));
        let engine = engine_with(state, at(9, 9, 0));

        let raised = engine.evaluate().await;

        assert!(raised
            .iter()
            .all(|alert| alert.category != AlertCategory::Overbooking));
    }

    #[tokio::test]
    async fn test_late_checkout_single_alert() {
        let state = state_with_rooms(5);
        let mut stay = reservation("r-1", 8, 10, ReservationStatus::CheckedIn);
        stay.room_numbers = vec!["101".to_string()];
        state.reservations.insert(stay);
        let engine = engine_with(state, at(10, 13, 30));

        engine.evaluate().await;
        engine.evaluate().await;

        let alerts = engine.alerts().await;
        let late: Vec<_> = alerts
            .iter()
            .filter(|a| a.category == AlertCategory::LateCheckout)
            .collect();
        assert_eq!(late.len(), 1);
        assert_eq!(
            late[0].message,
            "Guest (CNF-r-1) in room 101 is 90 minutes past checkout"
        );
    }

    #[tokio::test]
    async fn test_late_checkout_refreshed_in_place_as_minutes_grow() {
        let state = state_with_rooms(5);
        let mut stay = reservation("r-1", 8, 10, ReservationStatus::CheckedIn);
        stay.room_numbers = vec!["101".to_string()];
        state.reservations.insert(stay);
        let engine = engine_with(state, at(10, 13, 30));

        let first = engine.evaluate().await;
        let first = first
            .iter()
            .find(|a| a.category == AlertCategory::LateCheckout)
            .expect("late checkout raised")
            .clone();
        engine.mark_as_read(&first.id).await;
        let later = engine.evaluate_at(at(10, 14, 45)).await;

        assert!(later.iter().all(|a| a.category != AlertCategory::LateCheckout));
        let alerts = engine.alerts().await;
        let late: Vec<_> = alerts
            .iter()
            .filter(|a| a.category == AlertCategory::LateCheckout)
            .collect();
        assert_eq!(late.len(), 1);
        assert_eq!(late[0].id, first.id);
        assert_eq!(late[0].created_at, at(10, 13, 30));
        assert!(late[0].is_read);
        assert_eq!(
            late[0].message,
            "Guest (CNF-r-1) in room 101 is 165 minutes past checkout"
        );
    }

    #[tokio::test]
    async fn test_not_late_before_cutoff() {
        let state = state_with_rooms(5);
        state
            .reservations
            .insert(reservation("r-1", 8, 10, ReservationStatus::CheckedIn));
        let engine = engine_with(state, at(10, 11, 59));

        assert!(engine.evaluate().await.is_empty());
    }

    #[tokio::test]
    async fn test_dirty_room_threshold() {
        let state = state_with_rooms(2);
        state.rooms.set_status("room-0", RoomStatus::Dirty).unwrap();
        state.rooms.mark_cleaned("room-1", at(10, 9, 0)).unwrap();
        state.rooms.set_status("room-1", RoomStatus::Dirty).unwrap();
        let engine = engine_with(state, at(10, 10, 0));

        let raised = engine.evaluate().await;
        assert_eq!(raised.len(), 1);
        assert_eq!(raised[0].message, "Room 101 is dirty with no cleaning record");

        let later = engine.evaluate_at(at(10, 10, 31)).await;
        assert_eq!(later.len(), 1);
        assert_eq!(later[0].message, "Room 102 is dirty; last cleaned 2025-01-10 09:00");
    }

    #[tokio::test]
    async fn test_payment_pending_reports_balance() {
        let state = state_with_rooms(5);
        let mut stay = reservation("r-1", 10, 13, ReservationStatus::Confirmed);
        stay.payments.push(PaymentRecord {
            method: PaymentMethod::Card,
            amount: Decimal::new(10000, 0),
            reference: None,
            collected_by: "desk".to_string(),
            collected_at: at(9, 10, 0),
        });
        stay.recompute();
        state.reservations.insert(stay);
        let engine = engine_with(state, at(9, 12, 0));

        let raised = engine.evaluate().await;

        assert_eq!(raised.len(), 1);
        assert_eq!(
            raised[0].message,
            "Guest (CNF-r-1) has an outstanding balance of INR 6800.00"
        );
    }

    #[tokio::test]
    async fn test_idempotent_evaluation() {
        let state = state_with_rooms(1);
        state.rooms.set_status("room-0", RoomStatus::Dirty).unwrap();
        state
            .reservations
            .insert(reservation("r-1", 10, 13, ReservationStatus::Confirmed));
        let engine = engine_with(state, at(9, 9, 0));

        let first = engine.evaluate().await;
        let second = engine.evaluate().await;

        assert_eq!(first.len(), 2);
        assert!(second.is_empty());
        assert_eq!(engine.alerts().await.len(), 2);
    }

    #[tokio::test]
    async fn test_acknowledged_alert_can_be_raised_again() {
        let state = state_with_rooms(1);
        state.rooms.set_status("room-0", RoomStatus::Dirty).unwrap();
        let engine = engine_with(state, at(9, 9, 0));
        let first = engine.evaluate().await;

        let acknowledged = engine
            .acknowledge_alert(&first[0].id, "housekeeping")
            .await
            .unwrap();
        assert!(acknowledged.is_read);
        assert_eq!(acknowledged.acknowledged_by.as_deref(), Some("housekeeping"));

        let again = engine.evaluate().await;
        assert_eq!(again.len(), 1);
        assert_eq!(engine.alerts().await.len(), 2);
    }

    #[tokio::test]
    async fn test_read_flags_and_dismiss() {
        let state = state_with_rooms(2);
        state.rooms.set_status("room-0", RoomStatus::Dirty).unwrap();
        state.rooms.set_status("room-1", RoomStatus::Dirty).unwrap();
        let engine = engine_with(state, at(9, 9, 0));
        let raised = engine.evaluate().await;
        assert_eq!(engine.unread_count().await, 2);

        engine.mark_as_read(&raised[0].id).await;
        engine.mark_as_read("missing").await;
        assert_eq!(engine.unread_count().await, 1);

        engine.mark_all_read().await;
        assert_eq!(engine.unread_count().await, 0);

        assert!(engine.dismiss_alert(&raised[0].id).await);
        assert!(!engine.dismiss_alert(&raised[0].id).await);
        assert_eq!(engine.alerts().await.len(), 1);
        assert_eq!(
            engine.acknowledge_alert("missing", "desk").await,
            Err(OpsError::alert_not_found("missing"))
        );
    }

    #[tokio::test]
    async fn test_alert_list_capped_newest_first() {
        let state = state_with_rooms(45);
        for n in 0..45 {
            state
                .rooms
                .set_status(&format!("room-{n}"), RoomStatus::Dirty)
                .unwrap();
        }
        let engine = engine_with(state, at(9, 9, 0));
        engine.evaluate().await;

        engine.state.rooms.set_status("room-0", RoomStatus::Vacant).unwrap();
        engine.state.rooms.mark_cleaned("room-0", at(9, 8, 0)).unwrap();
        engine.state.rooms.set_status("room-0", RoomStatus::Dirty).unwrap();
        engine.evaluate_at(at(9, 10, 0)).await;

        let alerts = engine.alerts().await;
        assert_eq!(alerts.len(), 40);
        assert_eq!(alerts[0].created_at, at(9, 10, 0));
    }

    #[test]
    fn test_rooms_booked_per_night_uses_assigned_rooms() {
        let mut group = reservation("r-1", 10, 12, ReservationStatus::Confirmed);
        group.room_numbers = vec!["101".to_string(), "102".to_string()];
        let single = reservation("r-2", 11, 12, ReservationStatus::Pending);

        let nights = rooms_booked_per_night(&[group, single]);

        assert_eq!(nights.get(&date(10)), Some(&2));
        assert_eq!(nights.get(&date(11)), Some(&3));
        assert_eq!(nights.get(&date(12)), None);
    }
}
