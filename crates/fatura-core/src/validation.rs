//! Financial reconciliation checks for extracted invoices.
//!
//! Pure functions over the data model, run once at construction time.
//! The tolerance absorbs OCR/LLM rounding noise while still catching gross
//! extraction errors (wrong magnitude, missing tax line, swapped totals).
//! All arithmetic is fixed-point decimal; floating point never enters a
//! comparison.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::models::invoice::{Invoice, LineItem};

/// Absolute tolerance for amount reconciliation: 0.01.
pub const AMOUNT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// How far in the future an invoice date may plausibly lie.
///
/// Forward-dated invoices are legitimate; dates beyond this window are
/// almost always OCR digit transposition.
pub const FUTURE_DATE_GRACE_DAYS: i64 = 30;

fn check_non_negative(name: &str, value: Decimal, issues: &mut Vec<String>) {
    if value < Decimal::ZERO {
        issues.push(format!("{name} must not be negative, got {value}"));
    }
}

fn line_item_issues(index: usize, item: &LineItem, issues: &mut Vec<String>) {
    let field = |name: &str| format!("line_items[{index}].{name}");

    if item.description.trim().is_empty() {
        issues.push(format!("{} must not be empty", field("description")));
    }
    if item.quantity <= Decimal::ZERO {
        issues.push(format!(
            "{} must be greater than zero, got {}",
            field("quantity"),
            item.quantity
        ));
    }
    check_non_negative(&field("discount"), item.discount, issues);
    check_non_negative(&field("tax_rate"), item.tax_rate, issues);
    check_non_negative(&field("tax_amount"), item.tax_amount, issues);

    let expected = item.quantity * item.unit_price - item.discount + item.tax_amount;
    if (expected - item.line_total).abs() > AMOUNT_TOLERANCE {
        issues.push(format!(
            "{}: Line total mismatch: expected {}, got {}",
            field("line_total"),
            expected,
            item.line_total
        ));
    }
}

/// Check a single line item's constraints and reconciliation.
pub fn check_line_item(index: usize, item: &LineItem) -> Result<()> {
    let mut issues = Vec::new();
    line_item_issues(index, item, &mut issues);
    issues_to_result(issues, Some(format!("line_items[{index}]")))
}

/// Check the invoice date against the future-date window.
///
/// Exactly [`FUTURE_DATE_GRACE_DAYS`] days ahead passes; one more fails.
pub fn check_invoice_date(invoice_date: NaiveDate, today: NaiveDate) -> Result<()> {
    if (invoice_date - today).num_days() > FUTURE_DATE_GRACE_DAYS {
        return Err(PipelineError::Validation {
            message: format!("Invoice date {invoice_date} is too far in the future"),
            field: Some("invoice_date".to_string()),
            validation_errors: Vec::new(),
        });
    }
    Ok(())
}

/// Check every constraint on an invoice, anchoring the date window at
/// `today`. Collects all issues before failing so the caller sees the
/// complete picture in one `VALIDATION_ERROR`.
pub fn check_invoice_at(invoice: &Invoice, today: NaiveDate) -> Result<()> {
    let mut issues = Vec::new();

    if invoice.invoice_number.trim().is_empty() {
        issues.push("invoice_number must not be empty".to_string());
    }
    if invoice.vendor.name.trim().is_empty() {
        issues.push("vendor.name must not be empty".to_string());
    }
    if let Some(customer) = &invoice.customer {
        if customer.name.trim().is_empty() {
            issues.push("customer.name must not be empty".to_string());
        }
    }

    if invoice.line_items.is_empty() {
        issues.push("at least one line item is required".to_string());
    }
    for (index, item) in invoice.line_items.iter().enumerate() {
        line_item_issues(index, item, &mut issues);
    }

    check_non_negative("subtotal", invoice.subtotal, &mut issues);
    check_non_negative("total_discount", invoice.total_discount, &mut issues);
    check_non_negative("total_tax", invoice.total_tax, &mut issues);
    check_non_negative("total_amount", invoice.total_amount, &mut issues);

    let expected = invoice.subtotal - invoice.total_discount + invoice.total_tax;
    if (expected - invoice.total_amount).abs() > AMOUNT_TOLERANCE {
        issues.push(format!(
            "Total amount mismatch: expected {}, got {}",
            expected, invoice.total_amount
        ));
    }

    // Breakdown rows are informational; range checks only, no cross-check
    // against total_tax.
    if let Some(breakdown) = &invoice.tax_breakdown {
        for (index, row) in breakdown.iter().enumerate() {
            let field = |name: &str| format!("tax_breakdown[{index}].{name}");
            check_non_negative(&field("tax_rate"), row.tax_rate, &mut issues);
            check_non_negative(&field("taxable_amount"), row.taxable_amount, &mut issues);
            check_non_negative(&field("tax_amount"), row.tax_amount, &mut issues);
        }
    }

    if !(0.0..=1.0).contains(&invoice.confidence_score) {
        issues.push(format!(
            "confidence_score must be between 0 and 1, got {}",
            invoice.confidence_score
        ));
    }

    if let Err(err) = check_invoice_date(invoice.invoice_date, today) {
        issues.push(err.to_string());
    }

    if !issues.is_empty() {
        debug!(
            invoice_number = %invoice.invoice_number,
            issues = issues.len(),
            "invoice failed validation"
        );
    }
    issues_to_result(issues, None)
}

fn issues_to_result(issues: Vec<String>, field: Option<String>) -> Result<()> {
    if issues.is_empty() {
        return Ok(());
    }
    Err(PipelineError::Validation {
        message: issues.join("; "),
        field,
        validation_errors: issues,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::invoice::{Currency, InvoiceType, Language, TaxBreakdown, VendorInfo};
    use chrono::{Duration, Utc};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn line_item(quantity: Decimal, unit_price: Decimal, tax: Decimal, total: Decimal) -> LineItem {
        LineItem {
            description: "Widget".to_string(),
            description_ar: None,
            description_en: None,
            quantity,
            unit_price,
            unit: None,
            discount: dec!(0),
            tax_rate: dec!(15),
            tax_amount: tax,
            line_total: total,
            item_code: None,
        }
    }

    fn invoice(subtotal: Decimal, tax: Decimal, total: Decimal) -> Invoice {
        Invoice {
            invoice_number: "INV-1".to_string(),
            invoice_type: InvoiceType::Standard,
            invoice_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            currency: Currency::Sar,
            language_detected: Language::Ar,
            vendor: VendorInfo {
                name: "Vendor".to_string(),
                ..VendorInfo::default()
            },
            customer: None,
            line_items: vec![line_item(dec!(2), dec!(100.00), dec!(30.00), dec!(230.00))],
            subtotal,
            total_discount: dec!(0),
            total_tax: tax,
            total_amount: total,
            tax_breakdown: None,
            payment_info: None,
            po_number: None,
            reference_number: None,
            notes: None,
            qr_code: None,
            confidence_score: 0.9,
            extraction_timestamp: Utc::now(),
            source_file: None,
            page_count: None,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
    }

    #[test]
    fn consistent_line_item_passes() {
        // 2 * 100.00 - 0 + 30.00 = 230.00
        let item = line_item(dec!(2), dec!(100.00), dec!(30.00), dec!(230.00));
        assert!(check_line_item(0, &item).is_ok());
    }

    #[test]
    fn line_total_mismatch_names_expected_and_actual() {
        let item = line_item(dec!(2), dec!(100.00), dec!(30.00), dec!(235.00));
        let err = check_line_item(0, &item).unwrap_err();

        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert!(
            err.to_string()
                .contains("Line total mismatch: expected 230.00, got 235.00"),
            "{err}"
        );
    }

    #[test]
    fn line_total_within_tolerance_passes() {
        let item = line_item(dec!(2), dec!(100.00), dec!(30.00), dec!(230.01));
        assert!(check_line_item(0, &item).is_ok());

        let item = line_item(dec!(2), dec!(100.00), dec!(30.00), dec!(230.02));
        assert!(check_line_item(0, &item).is_err());
    }

    #[test]
    fn zero_quantity_fails() {
        let item = line_item(dec!(0), dec!(100.00), dec!(0), dec!(0));
        let err = check_line_item(3, &item).unwrap_err();
        assert!(
            err.to_string()
                .contains("line_items[3].quantity must be greater than zero"),
            "{err}"
        );
    }

    #[test]
    fn fractional_quantity_reconciles() {
        // 2.5 * 40.00 + 15.00 = 115.00
        let item = line_item(dec!(2.5), dec!(40.00), dec!(15.00), dec!(115.00));
        assert!(check_line_item(0, &item).is_ok());
    }

    #[test]
    fn consistent_invoice_passes() {
        let inv = invoice(dec!(200.00), dec!(30.00), dec!(230.00));
        assert!(check_invoice_at(&inv, today()).is_ok());
    }

    #[test]
    fn total_amount_mismatch_fails() {
        let inv = invoice(dec!(200.00), dec!(30.00), dec!(250.00));
        let err = check_invoice_at(&inv, today()).unwrap_err();

        assert!(
            err.to_string()
                .contains("Total amount mismatch: expected 230.00, got 250.00"),
            "{err}"
        );
    }

    #[test]
    fn total_discount_enters_reconciliation() {
        let mut inv = invoice(dec!(200.00), dec!(30.00), dec!(220.00));
        inv.total_discount = dec!(10.00);
        assert!(check_invoice_at(&inv, today()).is_ok());
    }

    #[test]
    fn date_thirty_days_ahead_passes_thirty_one_fails() {
        let today = today();
        let mut inv = invoice(dec!(200.00), dec!(30.00), dec!(230.00));

        inv.invoice_date = today + Duration::days(30);
        assert!(check_invoice_at(&inv, today).is_ok());

        inv.invoice_date = today + Duration::days(31);
        let err = check_invoice_at(&inv, today).unwrap_err();
        assert!(err.to_string().contains("too far in the future"), "{err}");
    }

    #[test]
    fn missing_vendor_name_and_empty_lines_are_both_reported() {
        let mut inv = invoice(dec!(200.00), dec!(30.00), dec!(230.00));
        inv.vendor.name = String::new();
        inv.line_items.clear();

        let err = check_invoice_at(&inv, today()).unwrap_err();
        match err {
            PipelineError::Validation {
                validation_errors, ..
            } => {
                assert_eq!(
                    validation_errors,
                    vec![
                        "vendor.name must not be empty".to_string(),
                        "at least one line item is required".to_string(),
                    ]
                );
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn negative_amounts_fail() {
        let mut inv = invoice(dec!(200.00), dec!(30.00), dec!(230.00));
        inv.total_discount = dec!(-5.00);
        // Keep totals reconciled so only the range check fires.
        inv.total_amount = dec!(235.00);

        let err = check_invoice_at(&inv, today()).unwrap_err();
        assert!(
            err.to_string().contains("total_discount must not be negative"),
            "{err}"
        );
    }

    #[test]
    fn confidence_out_of_range_fails() {
        let mut inv = invoice(dec!(200.00), dec!(30.00), dec!(230.00));
        inv.confidence_score = 1.2;
        let err = check_invoice_at(&inv, today()).unwrap_err();
        assert!(
            err.to_string().contains("confidence_score must be between 0 and 1"),
            "{err}"
        );
    }

    #[test]
    fn tax_breakdown_is_range_checked_but_never_reconciled() {
        let mut inv = invoice(dec!(200.00), dec!(30.00), dec!(230.00));
        // Deliberately inconsistent with total_tax; only negative values fail.
        inv.tax_breakdown = Some(vec![TaxBreakdown {
            tax_type: "VAT".to_string(),
            tax_rate: dec!(15),
            taxable_amount: dec!(999.00),
            tax_amount: dec!(1.00),
        }]);
        assert!(check_invoice_at(&inv, today()).is_ok());

        inv.tax_breakdown = Some(vec![TaxBreakdown {
            tax_type: "VAT".to_string(),
            tax_rate: dec!(-15),
            taxable_amount: dec!(100.00),
            tax_amount: dec!(15.00),
        }]);
        assert!(check_invoice_at(&inv, today()).is_err());
    }

    #[test]
    fn tolerance_constant_is_one_cent() {
        assert_eq!(AMOUNT_TOLERANCE, dec!(0.01));
    }
}
