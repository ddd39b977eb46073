//! Alert rule configuration and the alert items derived from rule matches

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Alert rule identifier
pub type AlertRuleId = String;

/// Alert item identifier
pub type AlertId = String;

/// What condition a rule looks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlertCategory {
    LateCheckout,
    RoomNotCleaned,
    PaymentPending,
    Overbooking,
}

impl AlertCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertCategory::LateCheckout => "late-checkout",
            AlertCategory::RoomNotCleaned => "room-not-cleaned",
            AlertCategory::PaymentPending => "payment-pending",
            AlertCategory::Overbooking => "overbooking",
        }
    }
}

impl fmt::Display for AlertCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "low",
            AlertSeverity::Medium => "medium",
            AlertSeverity::High => "high",
            AlertSeverity::Critical => "critical",
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static alert rule configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRule {
    pub id: AlertRuleId,
    pub name: String,
    pub category: AlertCategory,
    pub severity: AlertSeverity,
    pub active: bool,
}

impl AlertRule {
    pub fn new(id: &str, name: &str, category: AlertCategory, severity: AlertSeverity) -> Self {
        AlertRule {
            id: id.to_string(),
            name: name.to_string(),
            category,
            severity,
            active: true,
        }
    }

    /// One active rule per category
    pub fn default_rules() -> Vec<AlertRule> {
        vec![
            AlertRule::new(
                "late-checkout",
                "Late checkout",
                AlertCategory::LateCheckout,
                AlertSeverity::High,
            ),
            AlertRule::new(
                "room-not-cleaned",
                "Room not cleaned",
                AlertCategory::RoomNotCleaned,
                AlertSeverity::Medium,
            ),
            AlertRule::new(
                "payment-pending",
                "Payment pending",
                AlertCategory::PaymentPending,
                AlertSeverity::Medium,
            ),
            AlertRule::new(
                "overbooking",
                "Overbooking",
                AlertCategory::Overbooking,
                AlertSeverity::Critical,
            ),
        ]
    }
}

/// An alert raised by a rule match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertItem {
    pub id: AlertId,
    pub rule_id: AlertRuleId,
    pub category: AlertCategory,
    pub severity: AlertSeverity,
    pub title: String,
    pub message: String,
    pub created_at: NaiveDateTime,
    pub is_read: bool,
    #[serde(default)]
    pub acknowledged_by: Option<String>,
    #[serde(default)]
    pub acknowledged_at: Option<NaiveDateTime>,
    /// Record the alert tracks when its message changes from pass to pass
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

impl AlertItem {
    pub fn is_acknowledged(&self) -> bool {
        self.acknowledged_at.is_some()
    }
}
