//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the
//! application. Balance-mutating writes all go through `PaymentLedger`;
//! `QuotationLifecycle` wraps each multi-step operation in one transaction.

pub mod lifecycle;
pub mod payment;
pub mod quotation;
pub mod statement;

pub use lifecycle::{CreatedQuotation, LifecycleError, QuotationLifecycle, RegisterPaymentInput};
pub use payment::{InstallmentReceipt, PaymentError, PaymentLedger, UpdatePaymentInput};
pub use quotation::{QuotationFilter, QuotationRepoError, QuotationRepository};
pub use statement::{StatementError, StatementRepository};
