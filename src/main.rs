//! Hotel operations CLI
//!
//! # Usage
//!
//! ```bash
//! hotel-ops alerts --state property.json > alerts.csv
//! hotel-ops watch --state property.json --interval 30
//! hotel-ops settle --room-charges 15000 --taxes 1800 --payment 10000 > settlement.csv
//! hotel-ops --config ops.json settle --room-charges 5000 --charges extras.csv
//! ```
//!
//! CSV results go to stdout, logs to stderr (`RUST_LOG` selects the level).
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (unreadable snapshot or config, invalid amounts, etc.)

use hotel_ops_engine::{cli, logging};
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    logging::init();
    let args = cli::parse_args();

    let mut output = std::io::stdout();
    if let Err(e) = cli::run(args, &mut output).await {
        error!(error = %e, "command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
