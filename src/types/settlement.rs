//! Settlement-related types
//!
//! This module defines charges, payments and the settlement summary produced at
//! check-out. A summary is created once and never modified afterward.

use chrono::NaiveDateTime;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Payment status of a reservation
///
/// Derived from totals by [`PaymentStatus::classify`]; never set by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Partial,
    Paid,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl PaymentStatus {
    /// Classify a folio given its total, outstanding balance and amount collected
    ///
    /// Overpayment wins over everything else, then a cleared balance, then an
    /// untouched balance; anything in between is partial.
    pub fn classify(total_amount: Decimal, balance_due: Decimal, amount_paid: Decimal) -> Self {
        if amount_paid > total_amount {
            PaymentStatus::Refunded
        } else if balance_due <= Decimal::ZERO {
            PaymentStatus::Paid
        } else if balance_due >= total_amount {
            PaymentStatus::Unpaid
        } else {
            PaymentStatus::Partial
        }
    }
}

/// Round a money amount to 2 decimals, half away from zero
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a payment was tendered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Upi,
    BankTransfer,
    Other(String),
}

/// Charge posted to the folio in addition to room nights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeItem {
    pub description: String,
    pub amount: Decimal,
    /// Tax levied on this charge, if any
    #[serde(default)]
    pub tax_amount: Option<Decimal>,
}

impl ChargeItem {
    pub fn new(description: &str, amount: Decimal) -> Self {
        ChargeItem {
            description: description.to_string(),
            amount,
            tax_amount: None,
        }
    }

    /// Amount including its own tax
    pub fn gross(&self) -> Decimal {
        self.amount + self.tax_amount.unwrap_or(Decimal::ZERO)
    }
}

/// Payment collected against a reservation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub method: PaymentMethod,
    pub amount: Decimal,
    #[serde(default)]
    pub reference: Option<String>,
    pub collected_by: String,
    pub collected_at: NaiveDateTime,
}

/// Payment submitted by a caller, stamped into a `PaymentRecord` by the engine
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentInput {
    pub method: PaymentMethod,
    pub amount: Decimal,
    pub reference: Option<String>,
    pub collected_by: String,
}

impl PaymentInput {
    pub fn into_record(self, collected_at: NaiveDateTime) -> PaymentRecord {
        PaymentRecord {
            method: self.method,
            amount: self.amount,
            reference: self.reference,
            collected_by: self.collected_by,
            collected_at,
        }
    }
}

/// Final charge/payment reconciliation produced at check-out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementSummary {
    pub room_charges: Decimal,
    pub additional_charges: Vec<ChargeItem>,
    /// Sum of additional charges including their tax
    pub additional_total: Decimal,
    pub total_tax: Decimal,
    pub total_discounts: Decimal,
    pub payments: Vec<PaymentRecord>,
    pub total_charges: Decimal,
    pub payments_total: Decimal,
    pub balance_due: Decimal,
    pub refund_due: Decimal,
}

/// Combined GST split into two equal display components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxSplit {
    pub cgst: Decimal,
    pub sgst: Decimal,
}
