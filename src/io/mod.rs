//! I/O module
//!
//! Handles local persistence and CSV input/output.
//!
//! # Components
//!
//! - `snapshot` - JSON snapshot of local state and the stores that hold it
//! - `csv_format` - charge input and alert/settlement output in CSV

pub mod csv_format;
pub mod snapshot;

pub use csv_format::{
    convert_charge_record, read_charges_csv, write_alerts_csv, write_settlement_csv,
    ChargeCsvRecord,
};
pub use snapshot::{JsonSnapshotStore, MemorySnapshotStore, Snapshot};
