use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;

use crate::config::EngineConfig;

/// Hotel operations: alert evaluation and folio settlement
#[derive(Parser, Debug)]
#[command(name = "hotel-ops")]
#[command(about = "Evaluate operational alerts and settle guest folios", long_about = None)]
pub struct CliArgs {
    /// Engine configuration file (JSON)
    #[arg(
        long = "config",
        value_name = "FILE",
        global = true,
        help = "Path to a JSON engine configuration file"
    )]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one alert evaluation pass and print the alert list as CSV
    Alerts(StateArgs),

    /// Evaluate alerts periodically until interrupted
    Watch {
        #[command(flatten)]
        state: StateArgs,

        /// Seconds between evaluation passes
        #[arg(
            long = "interval",
            value_name = "SECONDS",
            help = "Seconds between evaluation passes (default: from config, 60)"
        )]
        interval: Option<u64>,
    },

    /// Compute a settlement and print it as CSV
    Settle(SettleArgs),
}

#[derive(Args, Debug)]
pub struct StateArgs {
    /// Property snapshot to evaluate
    #[arg(long = "state", value_name = "FILE", help = "Path to a JSON property snapshot")]
    pub state: PathBuf,

    #[arg(
        long = "checkout-cutoff-hour",
        value_name = "HOUR",
        help = "Hour of the checkout cutoff (default: 12)"
    )]
    pub checkout_cutoff_hour: Option<u32>,

    #[arg(
        long = "cleaning-threshold",
        value_name = "MINUTES",
        help = "Minutes a room may stay dirty after its last cleaning (default: 90)"
    )]
    pub cleaning_threshold_minutes: Option<i64>,
}

#[derive(Args, Debug)]
pub struct SettleArgs {
    #[arg(long = "room-charges", value_name = "AMOUNT")]
    pub room_charges: Decimal,

    #[arg(long = "taxes", value_name = "AMOUNT", default_value = "0")]
    pub taxes: Decimal,

    #[arg(long = "discounts", value_name = "AMOUNT", default_value = "0")]
    pub discounts: Decimal,

    #[arg(long = "payment", value_name = "AMOUNT", default_value = "0")]
    pub payment: Decimal,

    /// Additional charges with a `description,amount,tax` header
    #[arg(long = "charges", value_name = "CSV")]
    pub charges: Option<PathBuf>,
}

impl CliArgs {
    /// Apply command-line overrides on top of a loaded configuration
    ///
    /// The result is sanitized, so zero overrides fall back to defaults with a warning.
    pub fn apply_overrides(&self, mut config: EngineConfig) -> EngineConfig {
        let state = match &self.command {
            Command::Alerts(state) => Some(state),
            Command::Watch { state, interval } => {
                if let Some(interval) = interval {
                    config.evaluation_interval_secs = *interval;
                }
                Some(state)
            }
            Command::Settle(_) => None,
        };

        if let Some(state) = state {
            if let Some(hour) = state.checkout_cutoff_hour {
                config.checkout_cutoff_hour = hour;
            }
            if let Some(minutes) = state.cleaning_threshold_minutes {
                config.cleaning_threshold_minutes = minutes;
            }
        }

        config.sanitized()
    }
}
