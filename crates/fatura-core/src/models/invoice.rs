//! Invoice data models for extracted invoices (ZATCA-oriented defaults).
//!
//! These are immutable value records: the extraction pipeline builds them
//! once through [`Invoice::from_value`] (or deserialization plus
//! [`Invoice::validate`]) and never mutates them afterwards. A correction
//! means constructing a new instance, so the reconciliation invariants in
//! [`crate::validation`] cannot be bypassed post-construction.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::validation;

/// Type of invoice document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceType {
    /// Standard tax invoice.
    Standard,
    /// Credit note (reduces a prior invoice).
    CreditNote,
    /// Debit note (increases a prior invoice).
    DebitNote,
    /// Proforma invoice.
    Proforma,
}

impl Default for InvoiceType {
    fn default() -> Self {
        Self::Standard
    }
}

/// Supported invoice currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Saudi riyal.
    Sar,
    /// US dollar.
    Usd,
    /// Euro.
    Eur,
    /// UAE dirham.
    Aed,
    /// Egyptian pound.
    Egp,
}

impl Default for Currency {
    fn default() -> Self {
        Self::Sar
    }
}

/// Languages the extractor can detect on a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Arabic.
    Ar,
    /// English.
    En,
    /// French.
    Fr,
    /// Mixed Arabic/Latin document.
    Mixed,
}

impl Default for Language {
    fn default() -> Self {
        Self::Ar
    }
}

/// A single line item on the invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product/service description as printed.
    pub description: String,

    /// Arabic description, if the document carries both.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_ar: Option<String>,

    /// English description, if the document carries both.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_en: Option<String>,

    /// Quantity (may be fractional, must be positive).
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub quantity: Decimal,

    /// Unit price before discount and tax.
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub unit_price: Decimal,

    /// Unit of measure (kg, piece, meter, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// Discount applied to this line.
    #[serde(default, with = "rust_decimal::serde::arbitrary_precision")]
    pub discount: Decimal,

    /// Tax rate in percent.
    #[serde(default, with = "rust_decimal::serde::arbitrary_precision")]
    pub tax_rate: Decimal,

    /// Tax amount for this line.
    #[serde(default, with = "rust_decimal::serde::arbitrary_precision")]
    pub tax_amount: Decimal,

    /// Declared line total (quantity * unit_price - discount + tax_amount).
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub line_total: Decimal,

    /// Item code (SKU, EAN, internal code).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_code: Option<String>,
}

/// Vendor (seller) information.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VendorInfo {
    /// Legal name as printed on the invoice.
    pub name: String,

    /// Arabic name variant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_ar: Option<String>,

    /// English name variant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_en: Option<String>,

    /// VAT registration number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,

    /// Commercial registration number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_number: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,

    /// Vendor code in the customer's ERP, once mapped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapped_vendor_code: Option<String>,
}

/// Customer (buyer) information.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerInfo {
    /// Legal name as printed on the invoice.
    pub name: String,

    /// VAT registration number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,

    /// Commercial registration number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_number: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// One row of the tax breakdown table.
///
/// Informational only. Entries are not cross-checked against the invoice's
/// `total_tax`; reconciliation happens at the invoice level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxBreakdown {
    /// Tax type label (VAT, GST, Excise, ...).
    pub tax_type: String,

    /// Tax rate in percent.
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub tax_rate: Decimal,

    /// Amount the rate applies to.
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub taxable_amount: Decimal,

    /// Resulting tax amount.
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub tax_amount: Decimal,
}

/// Payment terms and bank details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentInfo {
    /// Payment method (cash, transfer, credit).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,

    /// Payment terms (Net 30, Net 60, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_terms: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_account: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub iban: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub swift_code: Option<String>,
}

/// A complete extracted invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    /// Invoice number/identifier.
    pub invoice_number: String,

    /// Type of invoice.
    #[serde(default)]
    pub invoice_type: InvoiceType,

    /// Date the invoice was issued.
    pub invoice_date: NaiveDate,

    /// Invoice currency.
    #[serde(default)]
    pub currency: Currency,

    /// Language detected on the document.
    #[serde(default)]
    pub language_detected: Language,

    /// Vendor (seller) information.
    pub vendor: VendorInfo,

    /// Customer (buyer) information, when printed on the document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerInfo>,

    /// Line items, in document order.
    pub line_items: Vec<LineItem>,

    /// Sum of line amounts before discount and tax.
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub subtotal: Decimal,

    /// Total discount across the invoice.
    #[serde(default, with = "rust_decimal::serde::arbitrary_precision")]
    pub total_discount: Decimal,

    /// Total tax across the invoice.
    #[serde(default, with = "rust_decimal::serde::arbitrary_precision")]
    pub total_tax: Decimal,

    /// Final amount due (subtotal - total_discount + total_tax).
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub total_amount: Decimal,

    /// Tax breakdown table, when printed on the document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_breakdown: Option<Vec<TaxBreakdown>>,

    /// Payment terms and bank details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_info: Option<PaymentInfo>,

    /// Purchase order number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub po_number: Option<String>,

    /// Free-form reference number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_number: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Raw QR payload (ZATCA TLV base64).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_code: Option<String>,

    /// Overall extraction confidence (0.0 - 1.0).
    #[serde(default)]
    pub confidence_score: f32,

    /// When the extraction ran. Stamped at construction if absent.
    #[serde(default = "Utc::now")]
    pub extraction_timestamp: DateTime<Utc>,

    /// Name of the source file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,

    /// Number of pages in the source document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
}

impl Invoice {
    /// Build a validated invoice from the pipeline's key/value tree.
    ///
    /// This is the checked construction path: the tree is deserialized
    /// (unknown enum values and shape errors are rejected), then every
    /// field constraint and reconciliation invariant is enforced. Fails
    /// with the `VALIDATION_ERROR` kind on any mismatch.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let invoice: Invoice =
            serde_json::from_value(value).map_err(|e| PipelineError::Validation {
                message: e.to_string(),
                field: None,
                validation_errors: Vec::new(),
            })?;
        invoice.validate()?;
        debug!(
            invoice_number = %invoice.invoice_number,
            line_items = invoice.line_items.len(),
            "invoice constructed and reconciled"
        );
        Ok(invoice)
    }

    /// Serialize to a generic key/value tree.
    ///
    /// Absent optional fields are omitted, decimals appear as JSON
    /// numbers, dates and timestamps as ISO-8601 strings. Feeding the
    /// tree back through [`Invoice::from_value`] reproduces the invoice.
    pub fn to_value(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| PipelineError::Validation {
            message: e.to_string(),
            field: None,
            validation_errors: Vec::new(),
        })
    }

    /// Check every field constraint and reconciliation invariant,
    /// with the future-date window anchored at today's date.
    pub fn validate(&self) -> Result<()> {
        validation::check_invoice_at(self, Utc::now().date_naive())
    }
}

/// Terminal artifact of a single extraction attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Whether extraction produced an accepted invoice.
    pub success: bool,

    /// The extracted invoice, present on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice: Option<Invoice>,

    /// Fatal errors encountered.
    #[serde(default)]
    pub errors: Vec<String>,

    /// Non-fatal warnings encountered.
    #[serde(default)]
    pub warnings: Vec<String>,

    /// Wall-clock processing time in seconds.
    pub processing_time: f64,

    /// Number of retry attempts consumed.
    #[serde(default)]
    pub retry_count: u32,

    /// Identifier of the LLM used, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_model_used: Option<String>,
}

impl ExtractionResult {
    /// Result for a successful extraction.
    pub fn completed(invoice: Invoice, processing_time: f64, retry_count: u32) -> Self {
        Self {
            success: true,
            invoice: Some(invoice),
            errors: Vec::new(),
            warnings: Vec::new(),
            processing_time,
            retry_count,
            llm_model_used: None,
        }
    }

    /// Result for a failed extraction.
    pub fn failed(errors: Vec<String>, processing_time: f64, retry_count: u32) -> Self {
        Self {
            success: false,
            invoice: None,
            errors,
            warnings: Vec::new(),
            processing_time,
            retry_count,
            llm_model_used: None,
        }
    }

    /// Attach non-fatal warnings.
    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    /// Record which model produced this result.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.llm_model_used = Some(model.into());
        self
    }
}
