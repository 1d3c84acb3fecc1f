//! Quotation error types for validation and state errors.

use rust_decimal::Decimal;
use thiserror::Error;

use super::types::{QuotationStatus, ServiceStatus};

/// A single violated field in a validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// The input field that failed validation.
    pub field: &'static str,
    /// Human-readable reason.
    pub message: String,
}

impl FieldViolation {
    /// Creates a new field violation.
    #[must_use]
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Errors that can occur during quotation operations.
#[derive(Debug, Error)]
pub enum QuotationError {
    /// Input validation failed; every violated field is listed.
    #[error("validation failed: {}", format_violations(violations))]
    Validation {
        /// All violated fields with their messages.
        violations: Vec<FieldViolation>,
    },

    /// Financing term must be at least one week.
    #[error("financing term must be at least one week")]
    InvalidTerm,

    /// The quotation is financed but carries no financing sub-record.
    #[error("quotation has no financing sub-record")]
    MissingFinancing,

    /// The operation requires a financed quotation.
    #[error("quotation is not financed")]
    NotFinanced,

    /// The operation requires a cash quotation.
    #[error("quotation is not paid in cash")]
    NotCash,

    /// Only pending (draft or sent) quotations can be approved.
    #[error("quotation cannot be approved from status {0}")]
    NotApprovable(QuotationStatus),

    /// Service state-machine guard violation.
    #[error("invalid service transition from {from} to {to}")]
    InvalidServiceTransition {
        /// Current service status.
        from: ServiceStatus,
        /// Requested service status.
        to: ServiceStatus,
    },

    /// A financed service cannot complete while a balance is outstanding.
    #[error("cannot complete service with outstanding balance {0}")]
    BalanceOutstanding(Decimal),

    /// Quotations can only be deleted while the service is pending.
    #[error("quotation cannot be deleted while service status is {0}")]
    NotDeletable(ServiceStatus),

    /// Cancellation guard violation.
    #[error("quotation in status {0} cannot be cancelled")]
    NotCancellable(QuotationStatus),
}

fn format_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl QuotationError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::InvalidTerm => "INVALID_FINANCING_TERM",
            Self::MissingFinancing => "MISSING_FINANCING",
            Self::NotFinanced => "NOT_FINANCED",
            Self::NotCash => "NOT_CASH",
            Self::NotApprovable(_) => "NOT_APPROVABLE",
            Self::InvalidServiceTransition { .. } => "INVALID_SERVICE_TRANSITION",
            Self::BalanceOutstanding(_) => "BALANCE_OUTSTANDING",
            Self::NotDeletable(_) => "QUOTATION_NOT_DELETABLE",
            Self::NotCancellable(_) => "QUOTATION_NOT_CANCELLABLE",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::Validation { .. }
            | Self::InvalidTerm
            | Self::MissingFinancing
            | Self::NotFinanced
            | Self::NotCash
            | Self::NotApprovable(_)
            | Self::InvalidServiceTransition { .. }
            | Self::BalanceOutstanding(_)
            | Self::NotCancellable(_) => 400,

            Self::NotDeletable(_) => 409,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validation_display_lists_every_field() {
        let err = QuotationError::Validation {
            violations: vec![
                FieldViolation::new("detalles", "at least one line item is required"),
                FieldViolation::new("vigencia", "must be after the creation date"),
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("detalles"));
        assert!(msg.contains("vigencia"));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            QuotationError::Validation { violations: vec![] }.error_code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(QuotationError::InvalidTerm.error_code(), "INVALID_FINANCING_TERM");
        assert_eq!(
            QuotationError::BalanceOutstanding(dec!(10)).error_code(),
            "BALANCE_OUTSTANDING"
        );
        assert_eq!(
            QuotationError::NotDeletable(ServiceStatus::InProcess).error_code(),
            "QUOTATION_NOT_DELETABLE"
        );
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(
            QuotationError::Validation { violations: vec![] }.http_status_code(),
            400
        );
        assert_eq!(
            QuotationError::NotApprovable(QuotationStatus::Approved).http_status_code(),
            400
        );
        assert_eq!(
            QuotationError::NotDeletable(ServiceStatus::InProcess).http_status_code(),
            409
        );
    }
}
