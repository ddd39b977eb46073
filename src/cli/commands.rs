//! Subcommand execution
//!
//! Each command writes its CSV result to the given output; logs go through `tracing`.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use super::args::{CliArgs, Command, SettleArgs, StateArgs};
use crate::config::EngineConfig;
use crate::core::{
    build_settlement, split_tax, AlertEngine, AlertScheduler, AlertSettings, Clock,
    PropertyState, SnapshotStore, SystemClock,
};
use crate::io::{read_charges_csv, write_alerts_csv, write_settlement_csv, JsonSnapshotStore};
use crate::types::{AlertRule, OpsError, PaymentMethod, PaymentRecord};

/// Resolve configuration and run the selected subcommand
pub async fn run(args: CliArgs, output: &mut dyn Write) -> Result<(), OpsError> {
    let config = match &args.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    let config = args.apply_overrides(config);

    match args.command {
        Command::Alerts(state) => run_alerts(&state, &config, output).await,
        Command::Watch { state, .. } => run_watch(&state, &config, output).await,
        Command::Settle(settle) => run_settle(&settle, output),
    }
}

fn load_state(path: &Path) -> Result<PropertyState, OpsError> {
    let store = JsonSnapshotStore::new(path);
    match store.load()? {
        Some(snapshot) => {
            info!(
                path = %path.display(),
                reservations = snapshot.reservations.len(),
                rooms = snapshot.rooms.len(),
                "loaded property snapshot"
            );
            Ok(PropertyState::from_snapshot(snapshot))
        }
        None => {
            warn!(path = %path.display(), "no snapshot found, evaluating an empty property");
            Ok(PropertyState::new())
        }
    }
}

fn alert_engine(state: &StateArgs, config: &EngineConfig) -> Result<AlertEngine, OpsError> {
    let property = load_state(&state.state)?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    Ok(AlertEngine::new(
        property,
        AlertRule::default_rules(),
        clock,
        AlertSettings::from(config),
    ))
}

async fn run_alerts(
    state: &StateArgs,
    config: &EngineConfig,
    output: &mut dyn Write,
) -> Result<(), OpsError> {
    let engine = alert_engine(state, config)?;
    let raised = engine.evaluate().await;
    info!(raised = raised.len(), "alert evaluation complete");

    write_alerts_csv(&engine.alerts().await, output)
}

/// Evaluate on the configured interval until Ctrl-C, then print the alert list
async fn run_watch(
    state: &StateArgs,
    config: &EngineConfig,
    output: &mut dyn Write,
) -> Result<(), OpsError> {
    let engine = Arc::new(alert_engine(state, config)?);
    let scheduler = AlertScheduler::spawn(Arc::clone(&engine), config.evaluation_interval());
    let mut raised = scheduler.subscribe();
    info!(
        interval_secs = config.evaluation_interval_secs,
        "watching for alerts, press Ctrl-C to stop"
    );

    loop {
        tokio::select! {
            alert = raised.recv() => match alert {
                Ok(alert) => info!(
                    severity = %alert.severity,
                    category = %alert.category,
                    message = %alert.message,
                    "alert raised"
                ),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "alert listener fell behind");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    warn!(error = %e, "failed to listen for Ctrl-C");
                }
                break;
            }
        }
    }

    scheduler.shutdown().await;
    write_alerts_csv(&engine.alerts().await, output)
}

fn run_settle(settle: &SettleArgs, output: &mut dyn Write) -> Result<(), OpsError> {
    let charges = match &settle.charges {
        Some(path) => read_charges_csv(File::open(path)?)?,
        None => Vec::new(),
    };

    let payments = if settle.payment.is_zero() {
        Vec::new()
    } else {
        vec![PaymentRecord {
            method: PaymentMethod::Other("desk".to_string()),
            amount: settle.payment,
            reference: None,
            collected_by: "cli".to_string(),
            collected_at: SystemClock.now(),
        }]
    };

    let summary = build_settlement(
        settle.room_charges,
        charges,
        settle.taxes,
        settle.discounts,
        payments,
    )?;
    info!(
        total = %summary.total_charges,
        balance_due = %summary.balance_due,
        refund_due = %summary.refund_due,
        "settlement computed"
    );

    write_settlement_csv(&summary, split_tax(summary.total_tax), output)
}
