//! CSV format handling for folio charges, alerts and settlements
//!
//! This module centralizes all CSV format concerns, providing:
//! - ChargeCsvRecord structure for reading additional charges
//! - Conversion from CSV records to `ChargeItem`
//! - Alert list and settlement output serialization
//!
//! Conversion and writers are pure over `Read`/`Write` so they can be tested in memory.

use crate::types::{AlertItem, ChargeItem, OpsError, SettlementSummary, TaxSplit};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::{Read, Write};
use std::str::FromStr;

/// CSV record for one additional charge
///
/// Columns: description, amount, tax. The tax column may be empty.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ChargeCsvRecord {
    pub description: String,
    pub amount: String,
    pub tax: Option<String>,
}

fn parse_amount(raw: &str, description: &str) -> Result<Decimal, String> {
    let amount = Decimal::from_str(raw.trim())
        .map_err(|_| format!("Invalid amount '{}' for charge '{}'", raw, description))?;
    if amount < Decimal::ZERO {
        return Err(format!(
            "Negative amount {} for charge '{}'",
            amount, description
        ));
    }
    Ok(amount)
}

/// Convert a ChargeCsvRecord into a ChargeItem
///
/// Rejects an empty description, an unparseable or negative amount, and an
/// unparseable tax value. A blank tax column means the charge carries no tax.
pub fn convert_charge_record(record: ChargeCsvRecord) -> Result<ChargeItem, String> {
    let description = record.description.trim();
    if description.is_empty() {
        return Err("Charge description is required".to_string());
    }

    let amount = parse_amount(&record.amount, description)?;
    let tax_amount = match record.tax {
        Some(tax) if !tax.trim().is_empty() => Some(parse_amount(&tax, description)?),
        _ => None,
    };

    Ok(ChargeItem {
        description: description.to_string(),
        amount,
        tax_amount,
    })
}

/// Read additional charges from CSV with a `description,amount,tax` header
pub fn read_charges_csv(input: impl Read) -> Result<Vec<ChargeItem>, OpsError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(input);

    let mut charges = Vec::new();
    for result in reader.deserialize::<ChargeCsvRecord>() {
        let record = result?;
        let charge = convert_charge_record(record).map_err(|message| OpsError::Csv { message })?;
        charges.push(charge);
    }
    Ok(charges)
}

/// Write alerts in CSV format, in the order given
///
/// Columns: created_at, severity, category, title, message, read, acknowledged_by
pub fn write_alerts_csv(alerts: &[AlertItem], output: &mut dyn Write) -> Result<(), OpsError> {
    let mut writer = csv::Writer::from_writer(output);

    writer.write_record([
        "created_at",
        "severity",
        "category",
        "title",
        "message",
        "read",
        "acknowledged_by",
    ])?;

    for alert in alerts {
        writer.write_record(&[
            alert.created_at.format("%Y-%m-%d %H:%M").to_string(),
            alert.severity.to_string(),
            alert.category.to_string(),
            alert.title.clone(),
            alert.message.clone(),
            alert.is_read.to_string(),
            alert.acknowledged_by.clone().unwrap_or_default(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Write a settlement breakdown as `line,amount` rows with two-decimal amounts
pub fn write_settlement_csv(
    summary: &SettlementSummary,
    split: TaxSplit,
    output: &mut dyn Write,
) -> Result<(), OpsError> {
    let mut writer = csv::Writer::from_writer(output);
    let money = |amount: Decimal| format!("{:.2}", amount);

    writer.write_record(["line", "amount"])?;
    writer.write_record(["room_charges", money(summary.room_charges).as_str()])?;
    for charge in &summary.additional_charges {
        writer.write_record([charge.description.as_str(), money(charge.gross()).as_str()])?;
    }
    writer.write_record(["total_tax", money(summary.total_tax).as_str()])?;
    writer.write_record(["cgst", money(split.cgst).as_str()])?;
    writer.write_record(["sgst", money(split.sgst).as_str()])?;
    writer.write_record(["total_discounts", money(summary.total_discounts).as_str()])?;
    writer.write_record(["total_charges", money(summary.total_charges).as_str()])?;
    writer.write_record(["payments_total", money(summary.payments_total).as_str()])?;
    writer.write_record(["balance_due", money(summary.balance_due).as_str()])?;
    writer.write_record(["refund_due", money(summary.refund_due).as_str()])?;

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AlertCategory, AlertSeverity};
    use chrono::NaiveDate;
    use rstest::rstest;

    fn record(description: &str, amount: &str, tax: Option<&str>) -> ChargeCsvRecord {
        ChargeCsvRecord {
            description: description.to_string(),
            amount: amount.to_string(),
            tax: tax.map(|s| s.to_string()),
        }
    }

    #[rstest]
    #[case::with_tax("Minibar", "450.00", Some("54.00"), Some(Decimal::new(5400, 2)))]
    #[case::blank_tax("Laundry", "200", Some("  "), None)]
    #[case::no_tax_column("Parking", "100", None, None)]
    fn test_convert_charge_record_valid(
        #[case] description: &str,
        #[case] amount: &str,
        #[case] tax: Option<&str>,
        #[case] expected_tax: Option<Decimal>,
    ) {
        let charge = convert_charge_record(record(description, amount, tax)).unwrap();

        assert_eq!(charge.description, description);
        assert_eq!(charge.tax_amount, expected_tax);
    }

    #[rstest]
    #[case::empty_description("  ", "100", None, "description is required")]
    #[case::bad_amount("Minibar", "abc", None, "Invalid amount")]
    #[case::negative_amount("Minibar", "-5", None, "Negative amount")]
    #[case::bad_tax("Minibar", "100", Some("x"), "Invalid amount")]
    fn test_convert_charge_record_errors(
        #[case] description: &str,
        #[case] amount: &str,
        #[case] tax: Option<&str>,
        #[case] expected_error: &str,
    ) {
        let error = convert_charge_record(record(description, amount, tax)).unwrap_err();
        assert!(error.contains(expected_error), "{error}");
    }

    #[test]
    fn test_read_charges_csv() {
        let input = "description,amount,tax\nMinibar, 450.00 ,54.00\nLaundry,200,\n";

        let charges = read_charges_csv(input.as_bytes()).unwrap();

        assert_eq!(charges.len(), 2);
        assert_eq!(charges[0].gross(), Decimal::new(50400, 2));
        assert_eq!(charges[1].tax_amount, None);
    }

    #[test]
    fn test_read_charges_csv_reports_bad_row() {
        let input = "description,amount,tax\nMinibar,lots,\n";

        let result = read_charges_csv(input.as_bytes());

        assert!(matches!(result, Err(OpsError::Csv { .. })));
    }

    #[test]
    fn test_write_alerts_csv() {
        let alert = AlertItem {
            id: "a-1".to_string(),
            rule_id: "overbooking".to_string(),
            category: AlertCategory::Overbooking,
            severity: AlertSeverity::Critical,
            title: "Overbooking".to_string(),
            message: "2025-01-10: 6 rooms booked, 5 available".to_string(),
            created_at: NaiveDate::from_ymd_opt(2025, 1, 10)
                .unwrap()
                .and_hms_opt(8, 5, 0)
                .unwrap(),
            is_read: false,
            acknowledged_by: None,
            acknowledged_at: None,
            subject: None,
        };
        let mut output = Vec::new();

        write_alerts_csv(&[alert], &mut output).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "created_at,severity,category,title,message,read,acknowledged_by\n\
             2025-01-10 08:05,critical,overbooking,Overbooking,\"2025-01-10: 6 rooms booked, 5 available\",false,\n"
        );
    }

    #[test]
    fn test_write_settlement_csv() {
        let summary = SettlementSummary {
            room_charges: Decimal::new(15000, 0),
            additional_charges: vec![ChargeItem::new("Minibar", Decimal::new(450, 0))],
            additional_total: Decimal::new(450, 0),
            total_tax: Decimal::new(1800, 0),
            total_discounts: Decimal::ZERO,
            payments: vec![],
            total_charges: Decimal::new(17250, 0),
            payments_total: Decimal::new(17250, 0),
            balance_due: Decimal::ZERO,
            refund_due: Decimal::ZERO,
        };
        let split = TaxSplit {
            cgst: Decimal::new(900, 0),
            sgst: Decimal::new(900, 0),
        };
        let mut output = Vec::new();

        write_settlement_csv(&summary, split, &mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        assert!(text.starts_with("line,amount\nroom_charges,15000.00\nMinibar,450.00\n"));
        assert!(text.contains("cgst,900.00\nsgst,900.00\n"));
        assert!(text.ends_with("balance_due,0.00\nrefund_due,0.00\n"));
    }
}
