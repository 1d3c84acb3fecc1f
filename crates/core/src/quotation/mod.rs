//! Quotation aggregate: domain types, validation, and lifecycle guards.
//!
//! This module implements the quotation root aggregate:
//! - Tagged-union domain types (payment form, statuses, line items, financing)
//! - Typed creation input with field-collecting validation
//! - Explicit recomputation of all derived monetary fields
//! - State-machine guards for approval, service activation, and completion

pub mod aggregate;
pub mod error;
pub mod types;

pub use types::Quotation;
pub use error::{FieldViolation, QuotationError};
pub use types::{
    CreateQuotationInput, Financing, FinancingInput, LineItem, LineItemInput, PaymentForm,
    QuotationStatus, ServiceStatus,
};
