//! Periodic alert evaluation
//!
//! The `AlertScheduler` runs [`AlertEngine::evaluate`] as a background task on a fixed
//! interval, and on demand through [`AlertScheduler::trigger`] (e.g. when an operator
//! opens the alert list). Newly raised alerts are published on a broadcast channel.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::alerts::AlertEngine;
use crate::types::AlertItem;

const RAISED_CHANNEL_CAPACITY: usize = 256;

pub struct AlertScheduler {
    trigger: Arc<Notify>,
    shutdown: watch::Sender<bool>,
    raised: broadcast::Sender<AlertItem>,
    handle: JoinHandle<()>,
}

impl AlertScheduler {
    /// Spawn the evaluation loop; the first pass runs immediately
    pub fn spawn(engine: Arc<AlertEngine>, period: Duration) -> Self {
        let trigger = Arc::new(Notify::new());
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let (raised, _) = broadcast::channel(RAISED_CHANNEL_CAPACITY);

        let handle = {
            let trigger = Arc::clone(&trigger);
            let raised = raised.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

                loop {
                    tokio::select! {
                        _ = ticker.tick() => {}
                        _ = trigger.notified() => debug!("alert evaluation triggered"),
                        changed = shutdown_rx.changed() => {
                            if changed.is_err() || *shutdown_rx.borrow() {
                                break;
                            }
                            continue;
                        }
                    }

                    for alert in engine.evaluate().await {
                        // No subscribers is fine
                        let _ = raised.send(alert);
                    }
                }
                info!("alert scheduler stopped");
            })
        };

        Self {
            trigger,
            shutdown,
            raised,
            handle,
        }
    }

    /// Run an evaluation now instead of waiting for the next tick
    pub fn trigger(&self) {
        self.trigger.notify_one();
    }

    /// Receive alerts raised after this call
    pub fn subscribe(&self) -> broadcast::Receiver<AlertItem> {
        self.raised.subscribe()
    }

    /// Stop the loop and wait for the task to finish
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            warn!(error = %e, "alert scheduler task failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::alerts::AlertSettings;
    use crate::core::clock::FixedClock;
    use crate::core::state::PropertyState;
    use crate::types::{AlertRule, Room, RoomStatus};
    use chrono::NaiveDate;

    fn engine() -> (Arc<AlertEngine>, PropertyState) {
        let state = PropertyState::new();
        state.rooms.upsert_room(Room::new("room-101", "101", "dlx"));
        let clock = Arc::new(FixedClock::new(
            NaiveDate::from_ymd_opt(2025, 1, 10)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
        ));
        let engine = AlertEngine::new(
            state.clone(),
            AlertRule::default_rules(),
            clock,
            AlertSettings::default(),
        );
        (Arc::new(engine), state)
    }

    #[tokio::test]
    async fn test_trigger_evaluates_between_ticks() {
        let (engine, state) = engine();
        let scheduler = AlertScheduler::spawn(Arc::clone(&engine), Duration::from_secs(3600));
        let mut raised = scheduler.subscribe();
        tokio::time::sleep(Duration::from_millis(20)).await;

        state.rooms.set_status("room-101", RoomStatus::Dirty).unwrap();
        scheduler.trigger();

        let alert = tokio::time::timeout(Duration::from_secs(1), raised.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(alert.message, "Room 101 is dirty with no cleaning record");
        scheduler.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_stops_loop() {
        let (engine, _) = engine();
        let scheduler = AlertScheduler::spawn(engine, Duration::from_millis(10));

        let stopped = tokio::time::timeout(Duration::from_secs(1), scheduler.shutdown()).await;

        assert!(stopped.is_ok());
    }
}
