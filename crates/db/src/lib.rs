//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions for quotations, payments, and account statements
//! - Repository abstractions for data access
//! - The quotation lifecycle orchestrator and payment ledger
//! - Database migrations

pub mod entities;
pub mod migration;
pub mod repositories;

pub use repositories::{
    CreatedQuotation, LifecycleError, PaymentError, PaymentLedger, QuotationFilter,
    QuotationLifecycle, QuotationRepoError, QuotationRepository, RegisterPaymentInput,
    StatementError, StatementRepository, UpdatePaymentInput,
};

use sea_orm::{Database, DatabaseConnection, DbErr};

/// Establishes a connection to the database.
///
/// The connection is handed to each repository explicitly; no global state.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}
