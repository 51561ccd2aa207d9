//! Error types for the fatura-core library.
//!
//! Every failure mode in the processing pipeline (file handling, OCR, LLM
//! extraction, validation, ERP connectors, configuration, auth, retry
//! control) has a tagged variant here with a stable machine-readable code
//! and a structured detail payload. [`translate`] maps any error, known or
//! not, to the uniform [`ErrorEnvelope`] the API boundary emits.

use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

/// Main error type for the fatura pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Failed to read or process an input file.
    #[error("{message}")]
    FileProcessing {
        message: String,
        filename: Option<String>,
    },

    /// The uploaded file type is not one we can process.
    #[error("File type '{file_type}' is not supported")]
    UnsupportedFileType {
        file_type: String,
        supported_types: Vec<String>,
    },

    /// OCR failed on a page or image.
    #[error("{message}")]
    Ocr {
        message: String,
        image_path: Option<String>,
    },

    /// The file contains no readable content.
    #[error("File '{filename}' is empty or contains no readable content")]
    EmptyFile { filename: String },

    /// The LLM returned unusable output.
    #[error("{message}")]
    LlmExtraction {
        message: String,
        model: Option<String>,
    },

    /// The LLM request did not complete in time.
    #[error("LLM request timed out after {timeout_seconds} seconds")]
    LlmTimeout { timeout_seconds: u64 },

    /// The LLM provider rejected the request for rate limiting.
    #[error("LLM rate limit exceeded")]
    LlmRateLimit { retry_after_seconds: Option<u64> },

    /// Extracted data failed a consistency or range check.
    #[error("{message}")]
    Validation {
        message: String,
        field: Option<String>,
        validation_errors: Vec<String>,
    },

    /// Extraction succeeded but confidence is below the accept threshold.
    #[error("Extraction confidence ({confidence_score:.2}) below threshold ({threshold:.2})")]
    LowConfidence { confidence_score: f64, threshold: f64 },

    /// Could not reach the ERP system.
    #[error("{message}")]
    ErpConnection { message: String, erp_system: String },

    /// The ERP system rejected our credentials.
    #[error("Authentication failed for {erp_system}")]
    ErpAuthentication { erp_system: String },

    /// The ERP system rejected the payload format.
    #[error("{message}")]
    ErpDataFormat {
        message: String,
        expected_format: Option<String>,
    },

    /// The ERP call did not complete in time.
    #[error("Connection to {erp_system} timed out after {timeout_seconds} seconds")]
    ErpTimeout {
        erp_system: String,
        timeout_seconds: u64,
    },

    /// The invoice already exists in the target system.
    #[error("Invoice '{invoice_number}' already exists")]
    DuplicateInvoice {
        invoice_number: String,
        existing_id: Option<String>,
    },

    /// No configuration exists for the requested customer.
    #[error("Customer '{customer_id}' not found")]
    CustomerNotFound { customer_id: String },

    /// Customer or system configuration is missing or invalid.
    #[error("{message}")]
    Configuration {
        message: String,
        config_file: Option<String>,
    },

    /// The extracted vendor has no entry in the customer's vendor mapping.
    #[error("Vendor '{vendor_name}' not found in mapping for customer '{customer_id}'")]
    VendorMapping {
        vendor_name: String,
        customer_id: String,
    },

    /// Caller identity could not be established.
    #[error("{message}")]
    Authentication { message: String },

    /// Caller identity is known but lacks permission.
    #[error("{message}")]
    Authorization {
        message: String,
        required_permission: Option<String>,
    },

    /// A retried operation exhausted its attempt budget.
    #[error("Operation '{operation}' failed after {max_retries} retries")]
    MaxRetriesExceeded { operation: String, max_retries: u32 },
}

/// Recovery classification for a pipeline error.
///
/// Drives the caller's retry policy; the taxonomy itself never retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Input/data problem. Re-OCR, route to human review, or reject.
    Recoverable,
    /// Infrastructure hiccup. Backoff and retry may succeed.
    Transient,
    /// Stop retrying and escalate.
    Terminal,
}

impl PipelineError {
    /// Stable machine-readable code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::FileProcessing { .. } => "FILE_PROCESSING_ERROR",
            Self::UnsupportedFileType { .. } => "UNSUPPORTED_FILE_TYPE",
            Self::Ocr { .. } => "OCR_ERROR",
            Self::EmptyFile { .. } => "EMPTY_FILE",
            Self::LlmExtraction { .. } => "LLM_EXTRACTION_ERROR",
            Self::LlmTimeout { .. } => "LLM_TIMEOUT",
            Self::LlmRateLimit { .. } => "LLM_RATE_LIMIT",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::LowConfidence { .. } => "LOW_CONFIDENCE",
            Self::ErpConnection { .. } => "ERP_CONNECTION_ERROR",
            Self::ErpAuthentication { .. } => "ERP_AUTH_ERROR",
            Self::ErpDataFormat { .. } => "ERP_DATA_FORMAT_ERROR",
            Self::ErpTimeout { .. } => "ERP_TIMEOUT",
            Self::DuplicateInvoice { .. } => "DUPLICATE_INVOICE",
            Self::CustomerNotFound { .. } => "CUSTOMER_NOT_FOUND",
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::VendorMapping { .. } => "VENDOR_MAPPING_ERROR",
            Self::Authentication { .. } => "AUTHENTICATION_ERROR",
            Self::Authorization { .. } => "AUTHORIZATION_ERROR",
            Self::MaxRetriesExceeded { .. } => "MAX_RETRIES_EXCEEDED",
        }
    }

    /// Kind-specific detail mapping.
    ///
    /// Keys are always present for a given kind; absent optional values
    /// serialize as `null`.
    pub fn details(&self) -> Value {
        match self {
            Self::FileProcessing { filename, .. } => json!({ "filename": filename }),
            Self::UnsupportedFileType {
                file_type,
                supported_types,
            } => json!({
                "file_type": file_type,
                "supported_types": supported_types,
            }),
            Self::Ocr { image_path, .. } => json!({ "image_path": image_path }),
            Self::EmptyFile { filename } => json!({ "filename": filename }),
            Self::LlmExtraction { model, .. } => json!({ "model": model }),
            Self::LlmTimeout { timeout_seconds } => {
                json!({ "timeout_seconds": timeout_seconds })
            }
            Self::LlmRateLimit {
                retry_after_seconds,
            } => json!({ "retry_after_seconds": retry_after_seconds }),
            Self::Validation {
                field,
                validation_errors,
                ..
            } => json!({
                "field": field,
                "validation_errors": validation_errors,
            }),
            Self::LowConfidence {
                confidence_score,
                threshold,
            } => json!({
                "confidence_score": confidence_score,
                "threshold": threshold,
            }),
            Self::ErpConnection { erp_system, .. } => json!({ "erp_system": erp_system }),
            Self::ErpAuthentication { erp_system } => json!({ "erp_system": erp_system }),
            Self::ErpDataFormat {
                expected_format, ..
            } => json!({ "expected_format": expected_format }),
            Self::ErpTimeout {
                erp_system,
                timeout_seconds,
            } => json!({
                "erp_system": erp_system,
                "timeout_seconds": timeout_seconds,
            }),
            Self::DuplicateInvoice {
                invoice_number,
                existing_id,
            } => json!({
                "invoice_number": invoice_number,
                "existing_id": existing_id,
            }),
            Self::CustomerNotFound { customer_id } => json!({ "customer_id": customer_id }),
            Self::Configuration { config_file, .. } => json!({ "config_file": config_file }),
            Self::VendorMapping {
                vendor_name,
                customer_id,
            } => json!({
                "vendor_name": vendor_name,
                "customer_id": customer_id,
            }),
            Self::Authentication { .. } => json!({}),
            Self::Authorization {
                required_permission,
                ..
            } => json!({ "required_permission": required_permission }),
            Self::MaxRetriesExceeded {
                operation,
                max_retries,
            } => json!({
                "operation": operation,
                "max_retries": max_retries,
            }),
        }
    }

    /// Recovery classification (see [`ErrorClass`]).
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::FileProcessing { .. }
            | Self::UnsupportedFileType { .. }
            | Self::Ocr { .. }
            | Self::EmptyFile { .. }
            | Self::LlmExtraction { .. }
            | Self::Validation { .. }
            | Self::LowConfidence { .. }
            | Self::ErpDataFormat { .. }
            | Self::DuplicateInvoice { .. } => ErrorClass::Recoverable,

            Self::LlmTimeout { .. }
            | Self::LlmRateLimit { .. }
            | Self::ErpConnection { .. }
            | Self::ErpTimeout { .. } => ErrorClass::Transient,

            Self::ErpAuthentication { .. }
            | Self::CustomerNotFound { .. }
            | Self::Configuration { .. }
            | Self::VendorMapping { .. }
            | Self::Authentication { .. }
            | Self::Authorization { .. }
            | Self::MaxRetriesExceeded { .. } => ErrorClass::Terminal,
        }
    }

    /// Convert to the uniform API envelope.
    pub fn to_envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            error: self.code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }
}

/// Uniform externally-facing representation of any failure.
///
/// Serializes directly as a JSON response body; no further transformation
/// is expected at the API layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEnvelope {
    /// Stable machine-readable code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
    /// Kind-specific structured details.
    pub details: Value,
}

impl ErrorEnvelope {
    fn internal(message: String, exception_type: &str) -> Self {
        Self {
            error: "INTERNAL_ERROR".to_string(),
            message,
            details: json!({ "exception_type": exception_type }),
        }
    }
}

/// Translate any error into the uniform envelope.
///
/// Known [`PipelineError`] kinds keep their code, message, and details.
/// Anything else (a programming fault, an unanticipated external failure)
/// becomes an `INTERNAL_ERROR` envelope carrying the runtime type name, so
/// the boundary never observes a raw, untranslated failure.
pub fn translate<E>(err: &E) -> ErrorEnvelope
where
    E: std::error::Error + 'static,
{
    let any = err as &dyn std::any::Any;
    match any.downcast_ref::<PipelineError>() {
        Some(known) => known.to_envelope(),
        None => ErrorEnvelope::internal(err.to_string(), std::any::type_name::<E>()),
    }
}

/// Translate a type-erased error into the uniform envelope.
///
/// Same contract as [`translate`] for callers holding `dyn Error` trait
/// objects, where only the erased type name is available for unknown kinds.
pub fn translate_dyn(err: &(dyn std::error::Error + 'static)) -> ErrorEnvelope {
    match err.downcast_ref::<PipelineError>() {
        Some(known) => known.to_envelope(),
        None => ErrorEnvelope::internal(err.to_string(), std::any::type_name_of_val(err)),
    }
}

/// Result type for the fatura library.
pub type Result<T> = std::result::Result<T, PipelineError>;
