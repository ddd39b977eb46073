//! Integration tests across the lifecycle engine, the alert engine and persistence
//!
//! Both engines share one `PropertyState`, the backend of record is the in-memory
//! implementation, and time comes from a `FixedClock` so alert thresholds are exact.

use chrono::{NaiveDate, NaiveDateTime};
use clap::Parser;
use hotel_ops_engine::backend::{BackendError, InMemoryBackend};
use hotel_ops_engine::cli::{self, CliArgs};
use hotel_ops_engine::config::EngineConfig;
use hotel_ops_engine::core::{
    build_settlement, AlertEngine, AlertSettings, FixedClock, PropertyState, ReservationEngine,
    SnapshotStore,
};
use hotel_ops_engine::io::{JsonSnapshotStore, MemorySnapshotStore};
use hotel_ops_engine::types::{
    AlertCategory, AlertRule, CheckInRequest, CheckOutRequest, GuestSelection, NewGuest,
    NewReservation, OpsError, PaymentInput, PaymentMethod, PaymentRecord, PaymentStatus,
    RatePlan, ReservationStatus, Room, RoomStatus, RoomType,
};
use rstest::rstest;
use rust_decimal::Decimal;
use std::sync::Arc;

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
}

fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
    date(d).and_hms_opt(h, m, 0).unwrap()
}

fn property() -> PropertyState {
    let state = PropertyState::new();
    state.rooms.upsert_room_type(RoomType {
        id: "dlx".to_string(),
        code: "DLX".to_string(),
        name: "Deluxe".to_string(),
        base_rate: Decimal::new(5000, 0),
        capacity: 2,
    });
    state.rooms.upsert_room(Room::new("room-101", "101", "dlx"));
    state.rooms.upsert_room(Room::new("room-102", "102", "dlx"));
    state
        .rate_plans
        .upsert(RatePlan::new("bar", "BAR", Decimal::ZERO));
    state
}

struct Hotel {
    reservations: ReservationEngine,
    alerts: AlertEngine,
    backend: Arc<InMemoryBackend>,
    clock: Arc<FixedClock>,
}

fn hotel_with(snapshots: Arc<dyn SnapshotStore>, backend: Arc<InMemoryBackend>) -> Hotel {
    let state = property();
    let clock = Arc::new(FixedClock::new(at(10, 14, 0)));
    let config = EngineConfig::default();
    let reservations = ReservationEngine::new(
        state.clone(),
        backend.clone(),
        snapshots,
        clock.clone(),
        &config,
    );
    let alerts = AlertEngine::new(
        state,
        AlertRule::default_rules(),
        clock.clone(),
        AlertSettings::from(&config),
    );
    Hotel {
        reservations,
        alerts,
        backend,
        clock,
    }
}

fn hotel() -> Hotel {
    hotel_with(
        Arc::new(MemorySnapshotStore::new()),
        Arc::new(InMemoryBackend::new().with_inventory("DLX", 10)),
    )
}

fn booking(first_name: &str) -> NewReservation {
    NewReservation {
        guest: GuestSelection::New(NewGuest {
            first_name: first_name.to_string(),
            last_name: "Rao".to_string(),
            ..Default::default()
        }),
        room_type_id: "dlx".to_string(),
        rate_plan_id: "bar".to_string(),
        check_in: date(10),
        check_out: date(13),
        adults: 2,
        children: 0,
        source: Some("walk-in".to_string()),
        notes: None,
    }
}

fn check_in(id: &str, room: &str) -> CheckInRequest {
    CheckInRequest {
        reservation_id: id.to_string(),
        room_numbers: vec![room.to_string()],
        documents: vec![],
        handled_by: "desk-1".to_string(),
        early_check_in_fee: None,
        remarks: None,
    }
}

fn check_out(id: &str, amount: i64) -> CheckOutRequest {
    CheckOutRequest {
        reservation_id: id.to_string(),
        additional_charges: vec![],
        discount: Decimal::ZERO,
        payment: Some(PaymentInput {
            method: PaymentMethod::Card,
            amount: Decimal::new(amount, 0),
            reference: Some("auth-778".to_string()),
            collected_by: "desk-1".to_string(),
        }),
        late_checkout_fee: None,
        handled_by: "desk-1".to_string(),
    }
}

fn room_status(hotel: &Hotel, id: &str) -> RoomStatus {
    hotel
        .reservations
        .state()
        .rooms
        .room(id)
        .map(|room| room.status)
        .unwrap()
}

#[tokio::test]
async fn test_stay_drives_room_status_and_alerts() {
    let hotel = hotel();
    let created = hotel
        .reservations
        .create_reservation(booking("Asha"))
        .await
        .unwrap();
    hotel
        .reservations
        .confirm_reservation(&created.id)
        .await
        .unwrap();

    let checked_in = hotel
        .reservations
        .check_in(check_in(&created.id, "101"))
        .await
        .unwrap();
    assert_eq!(checked_in.status, ReservationStatus::CheckedIn);
    assert_eq!(room_status(&hotel, "room-101"), RoomStatus::Occupied);
    assert_eq!(room_status(&hotel, "room-102"), RoomStatus::Vacant);

    hotel.clock.set(at(13, 13, 30));
    let raised = hotel.alerts.evaluate().await;
    let late: Vec<_> = raised
        .iter()
        .filter(|alert| alert.category == AlertCategory::LateCheckout)
        .collect();
    assert_eq!(late.len(), 1);
    assert_eq!(
        late[0].message,
        format!(
            "Asha Rao ({}) in room 101 is 90 minutes past checkout",
            created.confirmation_number
        )
    );

    let checked_out = hotel
        .reservations
        .check_out(check_out(&created.id, 16800))
        .await
        .unwrap();
    assert_eq!(checked_out.status, ReservationStatus::CheckedOut);
    assert_eq!(checked_out.payment_status, PaymentStatus::Paid);
    assert_eq!(room_status(&hotel, "room-101"), RoomStatus::Dirty);

    let raised = hotel.alerts.evaluate().await;
    assert_eq!(raised.len(), 1);
    assert_eq!(raised[0].message, "Room 101 is dirty with no cleaning record");
}

#[rstest]
#[case::cancelled(ReservationStatus::Cancelled)]
#[case::no_show(ReservationStatus::NoShow)]
#[tokio::test]
async fn test_terminal_reservation_cannot_check_in(#[case] terminal: ReservationStatus) {
    let hotel = hotel();
    let created = hotel
        .reservations
        .create_reservation(booking("Asha"))
        .await
        .unwrap();
    match terminal {
        ReservationStatus::Cancelled => {
            hotel
                .reservations
                .cancel_reservation(&created.id, Some("plans changed"))
                .await
                .unwrap();
        }
        _ => {
            hotel.reservations.mark_no_show(&created.id).await.unwrap();
        }
    }
    let calls = hotel.backend.call_count();

    let error = hotel
        .reservations
        .check_in(check_in(&created.id, "101"))
        .await
        .unwrap_err();

    assert!(matches!(error, OpsError::InvalidTransition { .. }), "{error:?}");
    assert_eq!(hotel.backend.call_count(), calls);
    assert_eq!(room_status(&hotel, "room-101"), RoomStatus::Vacant);
    assert_eq!(
        hotel.reservations.reservation(&created.id).unwrap().status,
        terminal
    );
}

#[tokio::test]
async fn test_short_payment_blocks_check_out() {
    let hotel = hotel();
    let created = hotel
        .reservations
        .create_reservation(booking("Asha"))
        .await
        .unwrap();
    hotel
        .reservations
        .check_in(check_in(&created.id, "101"))
        .await
        .unwrap();

    let error = hotel
        .reservations
        .check_out(check_out(&created.id, 10000))
        .await
        .unwrap_err();

    assert_eq!(
        error,
        OpsError::InsufficientPayment {
            required: Decimal::new(16800, 0),
            offered: Decimal::new(10000, 0),
        }
    );
    let held = hotel.reservations.reservation(&created.id).unwrap();
    assert_eq!(held.status, ReservationStatus::CheckedIn);
    assert_eq!(room_status(&hotel, "room-101"), RoomStatus::Occupied);
}

#[tokio::test]
async fn test_backend_rejection_leaves_local_state_alone() {
    let hotel = hotel();
    let created = hotel
        .reservations
        .create_reservation(booking("Asha"))
        .await
        .unwrap();
    hotel.backend.fail_next(BackendError::Rejected {
        status: 503,
        message: Some("Maintenance window".to_string()),
    });

    let error = hotel
        .reservations
        .check_in(check_in(&created.id, "101"))
        .await
        .unwrap_err();

    assert!(error.to_string().contains("Maintenance window"), "{error}");
    assert_eq!(hotel.reservations.reservation(&created.id).unwrap(), created);
    assert_eq!(room_status(&hotel, "room-101"), RoomStatus::Vacant);
}

#[tokio::test]
async fn test_overbooked_nights_raise_one_alert_each() {
    let hotel = hotel();
    for name in ["Asha", "Ravi", "Meera"] {
        hotel
            .reservations
            .create_reservation(booking(name))
            .await
            .unwrap();
    }

    let raised = hotel.alerts.evaluate().await;
    let mut messages: Vec<_> = raised
        .iter()
        .filter(|alert| alert.category == AlertCategory::Overbooking)
        .map(|alert| alert.message.as_str())
        .collect();
    messages.sort();

    assert_eq!(
        messages,
        vec![
            "2025-01-10: 3 rooms booked, 2 available",
            "2025-01-11: 3 rooms booked, 2 available",
            "2025-01-12: 3 rooms booked, 2 available",
        ]
    );
    assert!(hotel.alerts.evaluate().await.is_empty());
}

#[tokio::test]
async fn test_hydrate_restores_from_json_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("property.json");
    let backend = Arc::new(InMemoryBackend::new().with_inventory("DLX", 10));

    let first = hotel_with(Arc::new(JsonSnapshotStore::new(&path)), backend.clone());
    let created = first
        .reservations
        .create_reservation(booking("Asha"))
        .await
        .unwrap();
    first
        .reservations
        .check_in(check_in(&created.id, "101"))
        .await
        .unwrap();

    let second = hotel_with(Arc::new(JsonSnapshotStore::new(&path)), backend);
    let held = second.reservations.hydrate().await.unwrap();

    assert_eq!(held, 1);
    let restored = second.reservations.reservation(&created.id).unwrap();
    assert_eq!(restored.status, ReservationStatus::CheckedIn);
    assert_eq!(restored.room_numbers, vec!["101".to_string()]);
    assert!(restored.check_in_details.is_some());
    assert!(second
        .reservations
        .state()
        .guests
        .contains(&restored.guest_id));
    assert_eq!(room_status(&second, "room-101"), RoomStatus::Occupied);
}

#[tokio::test]
async fn test_alerts_command_reads_engine_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("property.json");
    let hotel = hotel_with(
        Arc::new(JsonSnapshotStore::new(&path)),
        Arc::new(InMemoryBackend::new().with_inventory("DLX", 5)),
    );
    let created = hotel
        .reservations
        .create_reservation(booking("Asha"))
        .await
        .unwrap();
    hotel
        .reservations
        .check_in(check_in(&created.id, "101"))
        .await
        .unwrap();

    let args =
        CliArgs::try_parse_from(["hotel-ops", "alerts", "--state", path.to_str().unwrap()])
            .unwrap();
    let mut output = Vec::new();
    cli::run(args, &mut output).await.unwrap();

    // The stay ended in 2025, so the system clock always sees it as overdue
    let csv = String::from_utf8(output).unwrap();
    assert!(csv.contains("late-checkout"), "{csv}");
    assert!(csv.contains("Asha Rao"), "{csv}");
    assert!(csv.contains("minutes past checkout"), "{csv}");
}

#[rstest]
#[case::paid(16800, PaymentStatus::Paid, 0)]
#[case::partial(10000, PaymentStatus::Partial, 6800)]
#[case::refunded(17000, PaymentStatus::Refunded, 0)]
fn test_settlement_for_three_night_stay(
    #[case] paid: i64,
    #[case] expected_status: PaymentStatus,
    #[case] expected_balance: i64,
) {
    let payment = PaymentRecord {
        method: PaymentMethod::Cash,
        amount: Decimal::new(paid, 0),
        reference: None,
        collected_by: "desk-1".to_string(),
        collected_at: at(13, 11, 0),
    };

    let summary = build_settlement(
        Decimal::new(15000, 0),
        vec![],
        Decimal::new(1800, 0),
        Decimal::ZERO,
        vec![payment],
    )
    .unwrap();

    assert_eq!(summary.total_charges, Decimal::new(16800, 0));
    assert_eq!(summary.balance_due, Decimal::new(expected_balance, 0));
    assert_eq!(
        PaymentStatus::classify(summary.total_charges, summary.balance_due, summary.payments_total),
        expected_status
    );
}
