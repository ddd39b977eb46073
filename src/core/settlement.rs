//! Settlement calculator
//!
//! Pure functions turning room charges, additional charges, taxes, discounts and
//! payments into a [`SettlementSummary`], plus the payment-status classification and
//! the GST display split used on invoices.
//!
//! # Identities
//!
//! For every summary `balance_due - refund_due == total_charges - payments_total`,
//! and at most one of the two is nonzero.

use rust_decimal::Decimal;

use crate::types::{
    round_money, ChargeItem, OpsError, PaymentRecord, PaymentStatus, SettlementSummary, TaxSplit,
};

/// Build the settlement summary for a folio
///
/// # Arguments
///
/// * `room_charges` - Nights multiplied by the nightly rate
/// * `additional_charges` - Folio items, each optionally carrying its own tax
/// * `taxes` - Tax on the room charges
/// * `discounts` - Total discounts granted
/// * `payments` - Every payment collected against the folio
///
/// # Errors
///
/// Returns `InvalidAmount` when any amount is negative.
pub fn build_settlement(
    room_charges: Decimal,
    additional_charges: Vec<ChargeItem>,
    taxes: Decimal,
    discounts: Decimal,
    payments: Vec<PaymentRecord>,
) -> Result<SettlementSummary, OpsError> {
    ensure_non_negative("room charges", room_charges)?;
    ensure_non_negative("taxes", taxes)?;
    ensure_non_negative("discounts", discounts)?;
    for charge in &additional_charges {
        ensure_non_negative(&charge.description, charge.amount)?;
        ensure_non_negative(&charge.description, charge.tax_amount.unwrap_or_default())?;
    }
    for payment in &payments {
        ensure_non_negative("payment", payment.amount)?;
    }

    let additional_total: Decimal = additional_charges.iter().map(ChargeItem::gross).sum();
    let additional_tax: Decimal = additional_charges
        .iter()
        .filter_map(|charge| charge.tax_amount)
        .sum();
    let total_charges = room_charges + additional_total + taxes - discounts;
    let payments_total: Decimal = payments.iter().map(|p| p.amount).sum();

    let balance_due = round_money((total_charges - payments_total).max(Decimal::ZERO));
    let refund_due = round_money((payments_total - total_charges).max(Decimal::ZERO));

    Ok(SettlementSummary {
        room_charges,
        additional_charges,
        additional_total,
        total_tax: taxes + additional_tax,
        total_discounts: discounts,
        payments,
        total_charges,
        payments_total,
        balance_due,
        refund_due,
    })
}

/// Classify a reservation's payment status
///
/// Exact four-way classification: overpaid → refunded, nothing owed → paid,
/// nothing collected against the total → unpaid, otherwise partial.
pub fn classify_payment(
    total_amount: Decimal,
    balance_due: Decimal,
    amount_paid: Decimal,
) -> PaymentStatus {
    PaymentStatus::classify(total_amount, balance_due, amount_paid)
}

/// Split a combined GST amount into CGST and SGST display components
///
/// The second half is derived by subtraction so the two always sum to `total`.
pub fn split_tax(total: Decimal) -> TaxSplit {
    let cgst = round_money(total / Decimal::TWO);
    TaxSplit {
        cgst,
        sgst: total - cgst,
    }
}

/// Tax on an amount at a percentage rate, rounded to 2 decimals
pub fn tax_for(amount: Decimal, rate_percent: Decimal) -> Decimal {
    round_money(amount * rate_percent / Decimal::ONE_HUNDRED)
}

fn ensure_non_negative(field: &str, amount: Decimal) -> Result<(), OpsError> {
    if amount < Decimal::ZERO {
        return Err(OpsError::invalid_amount(field, amount));
    }
    Ok(())
}
