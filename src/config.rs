//! Engine configuration
//!
//! Property-level settings shared by the lifecycle engine, the alert engine and the
//! scheduler. Values come from `Default`, an optional JSON file, and CLI overrides, and
//! pass through [`EngineConfig::sanitized`] before use.

use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::types::OpsError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Property id sent with reservation creates
    pub hotel_id: String,
    /// Property short code sent with reservation creates
    pub hotel_code: String,
    pub currency: String,
    /// Tax rate in percent applied to room subtotals
    pub tax_rate: Decimal,
    /// Hour of the departure day after which a checked-in stay is overdue
    pub checkout_cutoff_hour: u32,
    /// Minutes after which a dirty room without a fresh cleaning stamp raises an alert
    pub cleaning_threshold_minutes: i64,
    /// Alerts retained, newest first
    pub max_alerts: usize,
    pub evaluation_interval_secs: u64,
    pub backend_timeout_secs: u64,
    pub backend_url: Option<String>,
    pub snapshot_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hotel_id: "default-hotel".to_string(),
            hotel_code: "HOTEL".to_string(),
            currency: "INR".to_string(),
            tax_rate: Decimal::new(12, 0),
            checkout_cutoff_hour: 12,
            cleaning_threshold_minutes: 90,
            max_alerts: 40,
            evaluation_interval_secs: 60,
            backend_timeout_secs: 30,
            backend_url: None,
            snapshot_path: None,
        }
    }
}

impl EngineConfig {
    /// Load from a JSON file; missing keys take their defaults
    pub fn from_file(path: &Path) -> Result<Self, OpsError> {
        let contents = std::fs::read_to_string(path)?;
        let config: EngineConfig =
            serde_json::from_str(&contents).map_err(|e| OpsError::Config {
                message: format!("invalid config {}: {}", path.display(), e),
            })?;
        Ok(config.sanitized())
    }

    /// Replace out-of-range values with defaults, warning for each
    pub fn sanitized(mut self) -> Self {
        let default = Self::default();

        if self.tax_rate < Decimal::ZERO {
            warn!(
                tax_rate = %self.tax_rate,
                default = %default.tax_rate,
                "invalid tax rate, using default"
            );
            self.tax_rate = default.tax_rate;
        }
        if self.checkout_cutoff_hour > 23 {
            warn!(
                hour = self.checkout_cutoff_hour,
                default = default.checkout_cutoff_hour,
                "invalid checkout cutoff hour, using default"
            );
            self.checkout_cutoff_hour = default.checkout_cutoff_hour;
        }
        if self.cleaning_threshold_minutes <= 0 {
            warn!(
                minutes = self.cleaning_threshold_minutes,
                default = default.cleaning_threshold_minutes,
                "invalid cleaning threshold, using default"
            );
            self.cleaning_threshold_minutes = default.cleaning_threshold_minutes;
        }
        if self.max_alerts == 0 {
            warn!(default = default.max_alerts, "invalid alert cap (0), using default");
            self.max_alerts = default.max_alerts;
        }
        if self.evaluation_interval_secs == 0 {
            warn!(
                default = default.evaluation_interval_secs,
                "invalid evaluation interval (0), using default"
            );
            self.evaluation_interval_secs = default.evaluation_interval_secs;
        }
        if self.backend_timeout_secs == 0 {
            warn!(
                default = default.backend_timeout_secs,
                "invalid backend timeout (0), using default"
            );
            self.backend_timeout_secs = default.backend_timeout_secs;
        }
        self
    }

    pub fn checkout_cutoff(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.checkout_cutoff_hour, 0, 0).unwrap_or(NaiveTime::MIN)
    }

    pub fn evaluation_interval(&self) -> Duration {
        Duration::from_secs(self.evaluation_interval_secs)
    }

    pub fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();

        assert_eq!(config.tax_rate, Decimal::new(12, 0));
        assert_eq!(config.checkout_cutoff(), NaiveTime::from_hms_opt(12, 0, 0).unwrap());
        assert_eq!(config.max_alerts, 40);
        assert_eq!(config.evaluation_interval(), Duration::from_secs(60));
    }

    #[rstest]
    #[case::zero_alert_cap(EngineConfig { max_alerts: 0, ..Default::default() })]
    #[case::zero_interval(EngineConfig { evaluation_interval_secs: 0, ..Default::default() })]
    #[case::negative_tax(EngineConfig { tax_rate: Decimal::NEGATIVE_ONE, ..Default::default() })]
    #[case::cutoff_out_of_range(EngineConfig { checkout_cutoff_hour: 24, ..Default::default() })]
    #[case::zero_cleaning(EngineConfig { cleaning_threshold_minutes: 0, ..Default::default() })]
    fn test_sanitized_falls_back_to_defaults(#[case] config: EngineConfig) {
        assert_eq!(config.sanitized(), EngineConfig::default());
    }

    #[test]
    fn test_from_file_fills_missing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{ "hotelCode": "GRAND", "checkoutCutoffHour": 11 }"#).unwrap();

        let config = EngineConfig::from_file(&path).unwrap();

        assert_eq!(config.hotel_code, "GRAND");
        assert_eq!(config.checkout_cutoff_hour, 11);
        assert_eq!(config.currency, "INR");
    }
}
