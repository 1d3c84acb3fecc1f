//! Payment ledger: the single code path that can move a balance.
//!
//! Every payment insert, update, or delete that affects a financed balance
//! updates the quotation's financing sub-record and the account statement
//! inside the same transaction, so the two figures never diverge.

use chrono::{DateTime, NaiveDate, Utc};
use cotiza_core::payment::{PaymentMethod, PaymentStatus, PaymentType, payment_reference};
use cotiza_core::pricing::{installment_amounts, installment_due_dates, round_money};
use cotiza_core::quotation::{Financing, Quotation, QuotationStatus, ServiceStatus};
use cotiza_core::statement::{StatementStatus, apply_payment, reapply_delta};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbErr, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{account_statements, payments, quotations};

use super::quotation::select_for_update;

/// How many reference suffixes to try before giving up on uniqueness.
const MAX_REFERENCE_ATTEMPTS: u32 = 8;

/// Error types for payment ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// Payment not found.
    #[error("Payment not found: {0}")]
    NotFound(Uuid),

    /// Quotation not found.
    #[error("Quotation not found: {0}")]
    QuotationNotFound(Uuid),

    /// No account statement exists for the quotation.
    #[error("No account statement for quotation {0}")]
    MissingStatement(Uuid),

    /// The operation requires a financed quotation.
    #[error("Quotation is not financed")]
    NotFinanced,

    /// Installments can only be registered while the service is in process.
    #[error("Service is not in process")]
    ServiceNotActive,

    /// Payment amounts must be positive.
    #[error("Payment amount must be positive")]
    InvalidAmount,

    /// An installment cannot exceed the remaining balance.
    #[error("Payment exceeds remaining balance of {remaining}")]
    ExceedsBalance {
        /// Balance left before the rejected payment.
        remaining: Decimal,
    },

    /// Cash payments settle the quotation and cannot be changed.
    #[error("Cash payments cannot be modified or deleted")]
    CashImmutable,

    /// No unique reference could be derived.
    #[error("Could not derive a unique payment reference")]
    ReferenceExhausted,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Result of registering an installment against a financed quotation.
#[derive(Debug, Clone)]
pub struct InstallmentReceipt {
    /// The persisted payment row.
    pub payment: payments::Model,
    /// The statement after the balance was applied.
    pub statement: account_statements::Model,
    /// True when the payment drove the balance to zero.
    pub settled: bool,
}

/// Input for updating a non-cash payment.
#[derive(Debug, Clone, Default)]
pub struct UpdatePaymentInput {
    /// New amount; the balance delta is re-applied transactionally.
    pub amount: Option<Decimal>,
    /// New payment method.
    pub method: Option<PaymentMethod>,
    /// New free-form notes.
    pub notes: Option<String>,
}

/// One row of a scheduled installment plan, before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledInstallment {
    /// Unique human-readable reference.
    pub reference: String,
    /// Installment amount; the last one absorbs the rounding remainder.
    pub amount: Decimal,
    /// Date the installment falls due.
    pub due_date: NaiveDate,
}

/// Derives the full installment plan for a financing sub-record.
///
/// Produces exactly `term_weeks` rows dated one week apart from the start
/// date. Reference suffixes use the row index as the retry nonce, so the
/// batch never collides with itself.
#[must_use]
pub fn scheduled_installments(
    financing: &Financing,
    now: DateTime<Utc>,
) -> Vec<ScheduledInstallment> {
    let amounts = installment_amounts(
        financing.remaining_balance,
        financing.weekly_payment,
        financing.term_weeks,
    );
    let due_dates = installment_due_dates(financing.start_date, financing.term_weeks);

    amounts
        .into_iter()
        .zip(due_dates)
        .enumerate()
        .map(|(i, (amount, due_date))| ScheduledInstallment {
            reference: payment_reference(
                PaymentType::Installment,
                now,
                u32::try_from(i).unwrap_or(u32::MAX),
            ),
            amount,
            due_date,
        })
        .collect()
}

/// What a new payment row looks like before the reference is assigned.
struct NewPayment {
    quotation_id: Uuid,
    client_id: Uuid,
    payment_type: PaymentType,
    method: PaymentMethod,
    status: PaymentStatus,
    amount: Decimal,
    balance_after: Option<Decimal>,
    due_date: Option<NaiveDate>,
    paid_at: Option<DateTime<Utc>>,
}

/// Payment ledger service.
#[derive(Debug, Clone)]
pub struct PaymentLedger {
    db: DatabaseConnection,
}

impl PaymentLedger {
    /// Creates a new payment ledger.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists the payment history of a quotation, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub async fn list_by_quotation(
        &self,
        quotation_id: Uuid,
    ) -> Result<Vec<payments::Model>, PaymentError> {
        Ok(payments::Entity::find()
            .filter(payments::Column::QuotationId.eq(quotation_id))
            .order_by_asc(payments::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    /// Creates the single settling payment of a cash quotation.
    ///
    /// The payment is completed on the spot for the full sale total, with a
    /// zero remaining balance.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` for a non-positive sale total, or a database
    /// error.
    pub async fn create_cash_payment_in(
        &self,
        txn: &DatabaseTransaction,
        quotation: &Quotation,
        method: PaymentMethod,
        now: DateTime<Utc>,
    ) -> Result<payments::Model, PaymentError> {
        if quotation.sale_total <= Decimal::ZERO {
            return Err(PaymentError::InvalidAmount);
        }
        self.insert_payment_in(
            txn,
            NewPayment {
                quotation_id: quotation.id,
                client_id: quotation.client_id,
                payment_type: PaymentType::Cash,
                method,
                status: PaymentStatus::Completed,
                amount: quotation.sale_total,
                balance_after: Some(Decimal::ZERO),
                due_date: None,
                paid_at: Some(now),
            },
            now,
        )
        .await
    }

    /// Creates the down-payment ("anticipo") record of a financed quotation.
    ///
    /// Returns `None` when the financing carries no down payment.
    ///
    /// # Errors
    ///
    /// Returns a database error if the insert fails.
    pub async fn create_advance_payment_in(
        &self,
        txn: &DatabaseTransaction,
        quotation: &Quotation,
        financing: &Financing,
        method: PaymentMethod,
        now: DateTime<Utc>,
    ) -> Result<Option<payments::Model>, PaymentError> {
        if financing.down_payment <= Decimal::ZERO {
            return Ok(None);
        }
        let payment = self
            .insert_payment_in(
                txn,
                NewPayment {
                    quotation_id: quotation.id,
                    client_id: quotation.client_id,
                    payment_type: PaymentType::Advance,
                    method,
                    status: PaymentStatus::Completed,
                    amount: financing.down_payment,
                    balance_after: Some(financing.remaining_balance),
                    due_date: None,
                    paid_at: Some(now),
                },
                now,
            )
            .await?;
        Ok(Some(payment))
    }

    /// Bulk-inserts the pending installment schedule of a financed
    /// quotation.
    ///
    /// All rows land in one `insert_many`; a failure aborts the enclosing
    /// transaction and leaves no partial schedule.
    ///
    /// # Errors
    ///
    /// Returns a database error if the insert fails.
    pub async fn generate_scheduled_payments_in(
        &self,
        txn: &DatabaseTransaction,
        quotation: &Quotation,
        financing: &Financing,
        now: DateTime<Utc>,
    ) -> Result<u32, PaymentError> {
        let plan = scheduled_installments(financing, now);
        if plan.is_empty() {
            return Ok(0);
        }
        let count = u32::try_from(plan.len()).unwrap_or(u32::MAX);

        let created_at: sea_orm::prelude::DateTimeWithTimeZone = now.into();
        let rows: Vec<payments::ActiveModel> = plan
            .into_iter()
            .map(|installment| payments::ActiveModel {
                id: Set(Uuid::new_v4()),
                quotation_id: Set(quotation.id),
                client_id: Set(quotation.client_id),
                reference: Set(installment.reference),
                payment_type: Set(PaymentType::Installment.into()),
                // No method until the installment is collected
                method: Set(None),
                status: Set(PaymentStatus::Pending.into()),
                amount: Set(installment.amount),
                balance_after: Set(None),
                due_date: Set(Some(installment.due_date)),
                paid_at: Set(None),
                notes: Set(None),
                created_at: Set(created_at),
                updated_at: Set(created_at),
            })
            .collect();

        payments::Entity::insert_many(rows).exec(txn).await?;
        Ok(count)
    }

    /// Registers an installment against a financed quotation, decrementing
    /// the financing balance and the statement balance together.
    ///
    /// The quotation aggregate is mutated in place; the caller persists it
    /// within the same transaction.
    ///
    /// # Errors
    ///
    /// Returns `ServiceNotActive` unless the service is in process,
    /// `NotFinanced` on the cash branch, `InvalidAmount` for a non-positive
    /// amount, and `ExceedsBalance` when the amount overshoots the
    /// remaining balance.
    pub async fn register_installment_in(
        &self,
        txn: &DatabaseTransaction,
        quotation: &mut Quotation,
        method: PaymentMethod,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<InstallmentReceipt, PaymentError> {
        if quotation.service_status != ServiceStatus::InProcess {
            return Err(PaymentError::ServiceNotActive);
        }
        if amount <= Decimal::ZERO {
            return Err(PaymentError::InvalidAmount);
        }
        let quotation_id = quotation.id;
        let client_id = quotation.client_id;
        let financing = quotation
            .financing
            .as_mut()
            .ok_or(PaymentError::NotFinanced)?;
        if amount > financing.remaining_balance {
            return Err(PaymentError::ExceedsBalance {
                remaining: financing.remaining_balance,
            });
        }

        let application = apply_payment(financing.remaining_balance, amount);
        financing.remaining_balance = application.new_balance;

        let payment = self
            .insert_payment_in(
                txn,
                NewPayment {
                    quotation_id,
                    client_id,
                    payment_type: PaymentType::Installment,
                    method,
                    status: PaymentStatus::Completed,
                    amount,
                    balance_after: Some(application.new_balance),
                    due_date: None,
                    paid_at: Some(now),
                },
                now,
            )
            .await?;

        let statement = account_statements::Entity::find()
            .filter(account_statements::Column::QuotationId.eq(quotation_id))
            .one(txn)
            .await?
            .ok_or(PaymentError::MissingStatement(quotation_id))?;

        let new_status = if application.settled {
            StatementStatus::Settled
        } else {
            StatementStatus::from(statement.status)
        };
        let payments_total = round_money(statement.payments_total + amount);
        let mut active: account_statements::ActiveModel = statement.into();
        active.payments_total = Set(payments_total);
        active.current_balance = Set(application.new_balance);
        active.status = Set(new_status.into());
        active.updated_at = Set(now.into());
        let statement = active.update(txn).await?;

        Ok(InstallmentReceipt {
            payment,
            statement,
            settled: application.settled,
        })
    }

    /// Updates a non-cash payment, re-applying any amount delta to both
    /// balances in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns `CashImmutable` for cash payments, `ExceedsBalance` if the
    /// new amount would drive the balance negative, or a database error.
    pub async fn update_payment(
        &self,
        id: Uuid,
        input: UpdatePaymentInput,
    ) -> Result<payments::Model, PaymentError> {
        let txn = self.db.begin().await?;

        let payment = payments::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(PaymentError::NotFound(id))?;
        if PaymentType::from(payment.payment_type) == PaymentType::Cash {
            return Err(PaymentError::CashImmutable);
        }
        if let Some(amount) = input.amount {
            if amount <= Decimal::ZERO {
                return Err(PaymentError::InvalidAmount);
            }
        }

        let moves_balance = PaymentStatus::from(payment.status) == PaymentStatus::Completed
            && matches!(
                PaymentType::from(payment.payment_type),
                PaymentType::Advance | PaymentType::Installment
            );

        let mut balance_after = payment.balance_after;
        if let Some(new_amount) = input.amount {
            if moves_balance && new_amount != payment.amount {
                // Undo the old amount, apply the new one
                let delta = payment.amount - new_amount;
                let new_balance =
                    reapply_balance_in(&txn, payment.quotation_id, delta).await?;
                balance_after = Some(new_balance);
            }
        }

        let mut active: payments::ActiveModel = payment.into();
        if let Some(amount) = input.amount {
            active.amount = Set(amount);
            active.balance_after = Set(balance_after);
        }
        if let Some(method) = input.method {
            active.method = Set(Some(method.into()));
        }
        if let Some(notes) = input.notes {
            active.notes = Set(Some(notes));
        }
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Deletes a non-cash payment, reversing its effect on both balances.
    ///
    /// # Errors
    ///
    /// Returns `CashImmutable` for cash payments, or a database error.
    pub async fn delete_payment(&self, id: Uuid) -> Result<(), PaymentError> {
        let txn = self.db.begin().await?;

        let payment = payments::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(PaymentError::NotFound(id))?;
        if PaymentType::from(payment.payment_type) == PaymentType::Cash {
            return Err(PaymentError::CashImmutable);
        }

        let moves_balance = PaymentStatus::from(payment.status) == PaymentStatus::Completed
            && matches!(
                PaymentType::from(payment.payment_type),
                PaymentType::Advance | PaymentType::Installment
            );
        if moves_balance {
            reapply_balance_in(&txn, payment.quotation_id, payment.amount).await?;
        }

        payments::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }

    /// Bulk-deletes every payment of a quotation inside an open
    /// transaction. Used only when the quotation itself is deleted.
    ///
    /// # Errors
    ///
    /// Returns a database error if the delete fails.
    pub async fn delete_by_quotation_in(
        &self,
        txn: &DatabaseTransaction,
        quotation_id: Uuid,
    ) -> Result<(), PaymentError> {
        payments::Entity::delete_many()
            .filter(payments::Column::QuotationId.eq(quotation_id))
            .exec(txn)
            .await?;
        Ok(())
    }

    /// Inserts one payment row, retrying the reference suffix on
    /// collision.
    async fn insert_payment_in(
        &self,
        txn: &DatabaseTransaction,
        new: NewPayment,
        now: DateTime<Utc>,
    ) -> Result<payments::Model, PaymentError> {
        let reference = self
            .unique_reference_in(txn, new.payment_type, now)
            .await?;
        let created_at: sea_orm::prelude::DateTimeWithTimeZone = now.into();

        let payment = payments::ActiveModel {
            id: Set(Uuid::new_v4()),
            quotation_id: Set(new.quotation_id),
            client_id: Set(new.client_id),
            reference: Set(reference),
            payment_type: Set(new.payment_type.into()),
            method: Set(Some(new.method.into())),
            status: Set(new.status.into()),
            amount: Set(new.amount),
            balance_after: Set(new.balance_after),
            due_date: Set(new.due_date),
            paid_at: Set(new.paid_at.map(Into::into)),
            notes: Set(None),
            created_at: Set(created_at),
            updated_at: Set(created_at),
        };
        Ok(payment.insert(txn).await?)
    }

    /// Derives a reference not yet present in the payments table.
    async fn unique_reference_in(
        &self,
        txn: &DatabaseTransaction,
        payment_type: PaymentType,
        now: DateTime<Utc>,
    ) -> Result<String, PaymentError> {
        for attempt in 0..MAX_REFERENCE_ATTEMPTS {
            let candidate = payment_reference(payment_type, now, attempt);
            let taken = payments::Entity::find()
                .filter(payments::Column::Reference.eq(&candidate))
                .one(txn)
                .await?
                .is_some();
            if !taken {
                return Ok(candidate);
            }
        }
        Err(PaymentError::ReferenceExhausted)
    }
}

/// Adds `delta` back onto the financing balance and the statement balance
/// of a quotation, reopening settled state when the balance becomes
/// positive again.
///
/// The quotation row is fetched under the exclusive lock; conflicting
/// balance writers queue on it. The decision itself lives in
/// `reapply_delta`; this applies its outcome to both rows.
async fn reapply_balance_in<C: ConnectionTrait>(
    conn: &C,
    quotation_id: Uuid,
    delta: Decimal,
) -> Result<Decimal, PaymentError> {
    let model = select_for_update(quotation_id)
        .one(conn)
        .await?
        .ok_or(PaymentError::QuotationNotFound(quotation_id))?;
    let mut quotation = model.into_domain()?;
    let service_completed = quotation.service_status == ServiceStatus::Completed;

    let statement = account_statements::Entity::find()
        .filter(account_statements::Column::QuotationId.eq(quotation_id))
        .one(conn)
        .await?
        .ok_or(PaymentError::MissingStatement(quotation_id))?;

    let financing = quotation
        .financing
        .as_mut()
        .ok_or(PaymentError::NotFinanced)?;
    let reversal = reapply_delta(
        financing.remaining_balance,
        delta,
        service_completed,
        StatementStatus::from(statement.status),
    )
    .map_err(|err| PaymentError::ExceedsBalance {
        remaining: err.remaining,
    })?;
    financing.remaining_balance = reversal.new_balance;

    // A restored balance reopens an auto-completed quotation
    if reversal.reopen_quotation {
        quotation.service_status = ServiceStatus::InProcess;
        quotation.status = QuotationStatus::Approved;
        quotation.service_completed_at = None;
    }
    quotations::active_model(&quotation)?.update(conn).await?;

    let payments_total = round_money(statement.payments_total - delta);
    let mut active: account_statements::ActiveModel = statement.into();
    active.payments_total = Set(payments_total);
    active.current_balance = Set(reversal.new_balance);
    active.status = Set(reversal.statement_status.into());
    active.updated_at = Set(Utc::now().into());
    active.update(conn).await?;

    Ok(reversal.new_balance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn financing_fixture() -> Financing {
        Financing {
            down_payment: dec!(100),
            term_weeks: 10,
            interest_rate: dec!(0.34),
            remaining_balance: dec!(1240.00),
            weekly_payment: dec!(124.00),
            start_date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 3, 16).unwrap(),
        }
    }

    #[test]
    fn test_scheduled_installments_count_and_dates() {
        let financing = financing_fixture();
        let plan = scheduled_installments(&financing, Utc::now());
        assert_eq!(plan.len(), 10);
        for (i, row) in plan.iter().enumerate() {
            let week = u64::try_from(i).unwrap() + 1;
            assert_eq!(row.due_date, financing.start_date + chrono::Days::new(7 * week));
            assert_eq!(row.amount, dec!(124.00));
        }
    }

    #[test]
    fn test_scheduled_installments_sum_to_balance() {
        let mut financing = financing_fixture();
        financing.remaining_balance = dec!(1000.00);
        financing.weekly_payment = dec!(333.33);
        financing.term_weeks = 3;
        let plan = scheduled_installments(&financing, Utc::now());
        let total: Decimal = plan.iter().map(|p| p.amount).sum();
        assert_eq!(total, dec!(1000.00));
        // Last row absorbs the rounding remainder
        assert_eq!(plan[2].amount, dec!(333.34));
    }

    #[test]
    fn test_scheduled_installments_references_are_distinct() {
        let plan = scheduled_installments(&financing_fixture(), Utc::now());
        for (i, a) in plan.iter().enumerate() {
            assert!(a.reference.starts_with("ABO-"));
            for b in &plan[i + 1..] {
                assert_ne!(a.reference, b.reference);
            }
        }
    }
}
