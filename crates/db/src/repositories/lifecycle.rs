//! Quotation lifecycle controller.
//!
//! Orchestrates the state machine over quotation, payments, and account
//! statement. Each operation opens exactly one transaction; any step's
//! failure aborts the whole operation and leaves prior state unchanged.

use chrono::Utc;
use cotiza_core::payment::PaymentMethod;
use cotiza_core::quotation::{
    CreateQuotationInput, FieldViolation, PaymentForm, Quotation, QuotationError,
};
use cotiza_core::statement::StatementStatus;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, Set, TransactionTrait};
use tracing::info;
use uuid::Uuid;

use crate::entities::{account_statements, payments};

use super::payment::{PaymentError, PaymentLedger};
use super::quotation::{QuotationRepoError, QuotationRepository};
use super::statement::{StatementError, StatementRepository};

/// Error types for lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// Quotation not found.
    #[error("Quotation not found: {0}")]
    NotFound(Uuid),

    /// Domain-rule violation raised by the aggregate.
    #[error(transparent)]
    Domain(#[from] QuotationError),

    /// Payment ledger failure.
    #[error(transparent)]
    Payment(#[from] PaymentError),

    /// Statement failure.
    #[error(transparent)]
    Statement(#[from] StatementError),

    /// The enclosing transaction aborted; no partial state is visible.
    #[error("Transaction aborted: {0}")]
    TransactionAborted(DbErr),
}

impl From<DbErr> for LifecycleError {
    fn from(err: DbErr) -> Self {
        Self::TransactionAborted(err)
    }
}

impl From<QuotationRepoError> for LifecycleError {
    fn from(err: QuotationRepoError) -> Self {
        match err {
            QuotationRepoError::NotFound(id) => Self::NotFound(id),
            QuotationRepoError::Database(db) => Self::TransactionAborted(db),
        }
    }
}

/// Input for registering a payment against a financed quotation.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct RegisterPaymentInput {
    /// Amount to apply to the balance.
    pub monto: Decimal,
    /// How the money was received.
    pub metodo_pago: PaymentMethod,
}

/// Outcome of a quotation creation, including the auto-created documents.
#[derive(Debug, Clone)]
pub struct CreatedQuotation {
    /// The persisted aggregate.
    pub quotation: Quotation,
    /// The settling cash payment or the advance payment, when one was
    /// created.
    pub initial_payment: Option<payments::Model>,
    /// The statement, on the financed branch.
    pub statement: Option<account_statements::Model>,
}

/// Lifecycle controller for quotations.
#[derive(Debug, Clone)]
pub struct QuotationLifecycle {
    db: DatabaseConnection,
    quotations: QuotationRepository,
    ledger: PaymentLedger,
    statements: StatementRepository,
}

impl QuotationLifecycle {
    /// Creates a new lifecycle controller over the given connection.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            quotations: QuotationRepository::new(db.clone()),
            ledger: PaymentLedger::new(db.clone()),
            statements: StatementRepository::new(db.clone()),
            db,
        }
    }

    /// Creates a quotation with its payment-form side effects.
    ///
    /// Cash: the settling payment is created and the service completes on
    /// the spot. Financed: the advance payment (when a down payment exists)
    /// and the account statement are created.
    ///
    /// # Errors
    ///
    /// Returns a validation error listing every violated field, or a
    /// transaction abort with no partial state.
    pub async fn create(
        &self,
        input: CreateQuotationInput,
        created_by: Uuid,
    ) -> Result<CreatedQuotation, LifecycleError> {
        let now = Utc::now();
        let method = input.metodo_pago;
        let mut quotation = Quotation::create(input, created_by, now)?;

        let txn = self.db.begin().await?;
        self.quotations.insert_in(&txn, &quotation).await?;

        let mut initial_payment = None;
        let mut statement = None;
        match quotation.payment_form {
            PaymentForm::Cash => {
                let method = method.ok_or_else(required_method)?;
                let payment = self
                    .ledger
                    .create_cash_payment_in(&txn, &quotation, method, now)
                    .await?;
                quotation.settle_cash(payment.id, now)?;
                self.quotations.update_in(&txn, &quotation).await?;
                initial_payment = Some(payment);
            }
            PaymentForm::Financed => {
                let financing = quotation.financing()?.clone();
                if financing.down_payment > Decimal::ZERO {
                    let method = method.ok_or_else(required_method)?;
                    initial_payment = self
                        .ledger
                        .create_advance_payment_in(&txn, &quotation, &financing, method, now)
                        .await?;
                }
                statement = Some(
                    self.statements
                        .create_for_financed_in(&txn, &quotation, &financing)
                        .await?,
                );
            }
        }

        txn.commit().await?;
        info!(
            quotation_id = %quotation.id,
            sale_total = %quotation.sale_total,
            "Quotation persisted"
        );
        Ok(CreatedQuotation {
            quotation,
            initial_payment,
            statement,
        })
    }

    /// Approves a pending quotation, generating the installment schedule
    /// on the financed branch.
    ///
    /// # Errors
    ///
    /// Returns `NotApprovable` unless the quotation is pending.
    pub async fn approve(&self, id: Uuid) -> Result<Quotation, LifecycleError> {
        let now = Utc::now();
        let txn = self.db.begin().await?;

        let mut quotation = self.quotations.find_in(&txn, id).await?;
        quotation.approve()?;
        if quotation.payment_form == PaymentForm::Financed {
            let financing = quotation.financing()?.clone();
            self.ledger
                .generate_scheduled_payments_in(&txn, &quotation, &financing, now)
                .await?;
        }
        self.quotations.update_in(&txn, &quotation).await?;

        txn.commit().await?;
        Ok(quotation)
    }

    /// Starts service delivery on an approved quotation.
    ///
    /// # Errors
    ///
    /// Returns an invalid-transition error unless the quotation is
    /// approved with a pending service.
    pub async fn activate_service(&self, id: Uuid) -> Result<Quotation, LifecycleError> {
        let now = Utc::now();
        let txn = self.db.begin().await?;

        let mut quotation = self.quotations.find_in(&txn, id).await?;
        quotation.start_service(now)?;
        self.quotations.update_in(&txn, &quotation).await?;

        txn.commit().await?;
        Ok(quotation)
    }

    /// Registers a payment against a financed quotation in process.
    ///
    /// Balances on the quotation and the statement move together; when the
    /// balance reaches zero the service auto-completes.
    ///
    /// # Errors
    ///
    /// Returns `ExceedsBalance` for an overpayment, `ServiceNotActive`
    /// unless the service is in process, or a transaction abort.
    pub async fn register_payment(
        &self,
        id: Uuid,
        input: RegisterPaymentInput,
    ) -> Result<(Quotation, payments::Model), LifecycleError> {
        let now = Utc::now();
        let txn = self.db.begin().await?;

        let mut quotation = self.quotations.find_in(&txn, id).await?;
        let receipt = self
            .ledger
            .register_installment_in(&txn, &mut quotation, input.metodo_pago, input.monto, now)
            .await?;
        if receipt.settled {
            quotation.complete_service(now)?;
        }
        self.quotations.update_in(&txn, &quotation).await?;

        txn.commit().await?;
        info!(
            quotation_id = %id,
            reference = %receipt.payment.reference,
            new_balance = %receipt.statement.current_balance,
            settled = receipt.settled,
            "Installment applied"
        );
        Ok((quotation, receipt.payment))
    }

    /// Completes the service and the quotation.
    ///
    /// The statement, when present, is marked settled in the same
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns `BalanceOutstanding` if a financed balance remains, or an
    /// invalid-transition error unless the service is in process.
    pub async fn complete_service(&self, id: Uuid) -> Result<Quotation, LifecycleError> {
        let now = Utc::now();
        let txn = self.db.begin().await?;

        let mut quotation = self.quotations.find_in(&txn, id).await?;
        quotation.complete_service(now)?;
        self.quotations.update_in(&txn, &quotation).await?;

        if quotation.payment_form == PaymentForm::Financed {
            let statement = self.statements.find_by_quotation_in(&txn, id).await?;
            if !StatementStatus::from(statement.status).is_closed() {
                let mut active: account_statements::ActiveModel = statement.into();
                active.status = Set(StatementStatus::Settled.into());
                active.updated_at = Set(now.into());
                active.update(&txn).await?;
            }
        }

        txn.commit().await?;
        Ok(quotation)
    }

    /// Deletes a quotation whose service never started, cascading to its
    /// payments and statement.
    ///
    /// # Errors
    ///
    /// Returns `NotDeletable` once the service has started.
    pub async fn delete(&self, id: Uuid) -> Result<(), LifecycleError> {
        let txn = self.db.begin().await?;

        let quotation = self.quotations.find_in(&txn, id).await?;
        quotation.ensure_deletable()?;

        self.ledger.delete_by_quotation_in(&txn, id).await?;
        self.statements.delete_by_quotation_in(&txn, id).await?;
        self.quotations.delete_in(&txn, id).await?;

        txn.commit().await?;
        Ok(())
    }
}

fn required_method() -> LifecycleError {
    LifecycleError::Domain(QuotationError::Validation {
        violations: vec![FieldViolation::new(
            "metodo_pago",
            "payment method is required",
        )],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_error_mapping() {
        let id = Uuid::new_v4();
        let err: LifecycleError = QuotationRepoError::NotFound(id).into();
        assert!(matches!(err, LifecycleError::NotFound(found) if found == id));

        let err: LifecycleError =
            QuotationRepoError::Database(DbErr::Custom("boom".to_string())).into();
        assert!(matches!(err, LifecycleError::TransactionAborted(_)));
    }

    #[test]
    fn test_domain_errors_pass_through() {
        let err: LifecycleError = QuotationError::NotCash.into();
        assert!(matches!(
            err,
            LifecycleError::Domain(QuotationError::NotCash)
        ));
    }
}
