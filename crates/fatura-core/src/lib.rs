//! Core library for AI invoice extraction.
//!
//! This crate provides:
//! - Invoice data models (line items, parties, tax breakdown, payment info)
//! - Financial validation (decimal reconciliation of line and invoice totals,
//!   date sanity) enforced at construction time
//! - Error taxonomy with stable codes and central translation to a uniform
//!   API envelope
//! - Per-customer processing configuration
//!
//! Everything here is synchronous, side-effect-free value construction and
//! classification: validating one invoice has no data dependency on any
//! other, so callers may run many validations concurrently with no
//! coordination.

pub mod error;
pub mod models;
pub mod validation;

pub use error::{ErrorClass, ErrorEnvelope, PipelineError, Result, translate, translate_dyn};
pub use models::config::CustomerConfig;
pub use models::invoice::{
    Currency, CustomerInfo, ExtractionResult, Invoice, InvoiceType, Language, LineItem,
    PaymentInfo, TaxBreakdown, VendorInfo,
};
pub use validation::{AMOUNT_TOLERANCE, FUTURE_DATE_GRACE_DAYS, check_invoice_at, check_line_item};
