//! Benchmarks for settlement and alert evaluation
//!
//! ```bash
//! cargo bench
//! ```
//!
//! Alert evaluation is measured over properties of increasing size: every reservation
//! is checked in and overdue, every other room is dirty, and the property is overbooked
//! on each night, so all four rules produce candidates.

use chrono::{NaiveDate, NaiveDateTime};
use hotel_ops_engine::core::{
    build_settlement, AlertEngine, AlertSettings, FixedClock, PropertyState,
};
use hotel_ops_engine::types::{
    AlertRule, ChargeItem, PaymentMethod, PaymentRecord, Reservation, ReservationStatus, Room,
    RoomStatus,
};
use rust_decimal::Decimal;
use std::sync::Arc;

fn main() {
    divan::main();
}

fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, day)
        .and_then(|date| date.and_hms_opt(hour, 0, 0))
        .expect("valid benchmark timestamp")
}

fn property(reservations: usize) -> PropertyState {
    let state = PropertyState::new();
    for n in 0..reservations / 2 {
        let number = format!("{}", 100 + n);
        let mut room = Room::new(&format!("room-{number}"), &number, "dlx");
        if n % 2 == 0 {
            room.status = RoomStatus::Dirty;
        }
        state.rooms.upsert_room(room);
    }
    for n in 0..reservations {
        let mut reservation = Reservation::new(
            &format!("res-{n}"),
            &format!("g-{n}"),
            "dlx",
            at(10, 0).date(),
            at(13, 0).date(),
            Decimal::new(5000, 0),
        );
        reservation.status = ReservationStatus::CheckedIn;
        reservation.confirmation_number = format!("CNF{n:06}");
        reservation.room_numbers = vec![format!("{}", 100 + n)];
        state.reservations.insert(reservation);
    }
    state
}

#[divan::bench]
fn settlement_with_folio_items() -> Decimal {
    let charges: Vec<ChargeItem> = (0..50)
        .map(|n| ChargeItem {
            description: format!("Room service #{n}"),
            amount: Decimal::new(45_000 + n, 2),
            tax_amount: Some(Decimal::new(8_100, 2)),
        })
        .collect();
    let payments = vec![PaymentRecord {
        method: PaymentMethod::Card,
        amount: Decimal::new(20_000, 0),
        reference: None,
        collected_by: "bench".to_string(),
        collected_at: at(13, 11),
    }];

    let summary = build_settlement(
        divan::black_box(Decimal::new(15_000, 0)),
        charges,
        Decimal::new(1_800, 0),
        Decimal::new(500, 0),
        payments,
    )
    .expect("non-negative amounts");
    summary.balance_due
}

#[divan::bench(args = [10, 100, 1_000])]
fn evaluate_alerts(bencher: divan::Bencher, reservations: usize) {
    let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");

    bencher
        .with_inputs(|| {
            AlertEngine::new(
                property(reservations),
                AlertRule::default_rules(),
                Arc::new(FixedClock::new(at(13, 15))),
                AlertSettings::default(),
            )
        })
        .bench_local_values(|engine| runtime.block_on(engine.evaluate()).len());
}
