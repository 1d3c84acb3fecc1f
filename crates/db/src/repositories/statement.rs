//! Account statement repository: creation and arrears recalculation.
//!
//! Payment-driven balance movement lives in the payment ledger; this
//! repository owns statement creation and the periodic moratory-interest
//! recompute.

use chrono::{NaiveDate, Utc};
use cotiza_core::quotation::{Financing, Quotation};
use cotiza_core::statement::{self, DEFAULT_MORATORY_DAILY_RATE, StatementStatus};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::account_statements;

/// Error types for statement operations.
#[derive(Debug, thiserror::Error)]
pub enum StatementError {
    /// Statement not found.
    #[error("Account statement not found: {0}")]
    NotFound(Uuid),

    /// No statement exists for the quotation.
    #[error("No account statement for quotation {0}")]
    NotFoundForQuotation(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Account statement repository.
#[derive(Debug, Clone)]
pub struct StatementRepository {
    db: DatabaseConnection,
}

impl StatementRepository {
    /// Creates a new statement repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates the one statement for a financed quotation.
    ///
    /// `initial_balance` is the financed sale total; `current_balance`
    /// starts at the remaining balance left after the down payment, so
    /// `payments_total` starts at the down payment. The due date is the
    /// end of the financing term.
    ///
    /// # Errors
    ///
    /// Returns a database error if the insert fails (including the unique
    /// violation when a statement already exists for the quotation).
    pub async fn create_for_financed_in(
        &self,
        txn: &DatabaseTransaction,
        quotation: &Quotation,
        financing: &Financing,
    ) -> Result<account_statements::Model, StatementError> {
        let now = Utc::now().into();
        let statement = account_statements::ActiveModel {
            id: Set(Uuid::new_v4()),
            quotation_id: Set(quotation.id),
            client_id: Set(quotation.client_id),
            initial_balance: Set(quotation.sale_total),
            payments_total: Set(financing.down_payment),
            current_balance: Set(financing.remaining_balance),
            due_date: Set(financing.end_date),
            weekly_payment: Set(financing.weekly_payment),
            days_in_arrears: Set(0),
            moratory_interest: Set(rust_decimal::Decimal::ZERO),
            moratory_daily_rate: Set(DEFAULT_MORATORY_DAILY_RATE),
            status: Set(StatementStatus::Active.into()),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(statement.insert(txn).await?)
    }

    /// Fetches a statement by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no row exists, or a database error.
    pub async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<account_statements::Model, StatementError> {
        account_statements::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(StatementError::NotFound(id))
    }

    /// Fetches the statement of a quotation.
    ///
    /// # Errors
    ///
    /// Returns `NotFoundForQuotation` if the quotation has no statement.
    pub async fn find_by_quotation(
        &self,
        quotation_id: Uuid,
    ) -> Result<account_statements::Model, StatementError> {
        account_statements::Entity::find()
            .filter(account_statements::Column::QuotationId.eq(quotation_id))
            .one(&self.db)
            .await?
            .ok_or(StatementError::NotFoundForQuotation(quotation_id))
    }

    /// Fetches the statement of a quotation inside an open transaction.
    ///
    /// # Errors
    ///
    /// Returns `NotFoundForQuotation` if the quotation has no statement.
    pub async fn find_by_quotation_in(
        &self,
        txn: &DatabaseTransaction,
        quotation_id: Uuid,
    ) -> Result<account_statements::Model, StatementError> {
        account_statements::Entity::find()
            .filter(account_statements::Column::QuotationId.eq(quotation_id))
            .one(txn)
            .await?
            .ok_or(StatementError::NotFoundForQuotation(quotation_id))
    }

    /// Deletes the statement of a quotation, if any, inside an open
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns a database error if the delete fails.
    pub async fn delete_by_quotation_in(
        &self,
        txn: &DatabaseTransaction,
        quotation_id: Uuid,
    ) -> Result<(), StatementError> {
        account_statements::Entity::delete_many()
            .filter(account_statements::Column::QuotationId.eq(quotation_id))
            .exec(txn)
            .await?;
        Ok(())
    }

    /// Recomputes moratory interest for the given day.
    ///
    /// Arrears are derived from scratch on every call, so running this
    /// twice on the same day yields the same row. Closed statements are
    /// returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no row exists, or a database error.
    pub async fn recalculate_arrears(
        &self,
        id: Uuid,
        today: NaiveDate,
    ) -> Result<account_statements::Model, StatementError> {
        let txn = self.db.begin().await?;

        let model = account_statements::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(StatementError::NotFound(id))?;

        let status: StatementStatus = model.status.into();
        if status.is_closed() {
            txn.commit().await?;
            return Ok(model);
        }

        let arrears = statement::accrue_arrears(
            model.due_date,
            today,
            model.current_balance,
            model.moratory_daily_rate,
        );
        let new_status = arrears_status(status, arrears.days_in_arrears);

        let mut active: account_statements::ActiveModel = model.into();
        active.days_in_arrears = Set(arrears.days_in_arrears);
        active.moratory_interest = Set(arrears.moratory_interest);
        active.status = Set(new_status.into());
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;

        txn.commit().await?;
        Ok(updated)
    }
}

/// Status after an arrears recompute. Only the active/in-arrears pair
/// flips; any other open status is left as it was.
fn arrears_status(current: StatementStatus, days_in_arrears: i64) -> StatementStatus {
    if days_in_arrears > 0 {
        StatementStatus::InArrears
    } else if current == StatementStatus::InArrears {
        StatementStatus::Active
    } else {
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arrears_status_flips_between_active_and_in_arrears() {
        assert_eq!(
            arrears_status(StatementStatus::Active, 3),
            StatementStatus::InArrears
        );
        assert_eq!(
            arrears_status(StatementStatus::InArrears, 0),
            StatementStatus::Active
        );
    }

    #[test]
    fn test_arrears_status_preserves_in_process() {
        assert_eq!(
            arrears_status(StatementStatus::InProcess, 0),
            StatementStatus::InProcess
        );
        // Overdue still wins over an administrative hold
        assert_eq!(
            arrears_status(StatementStatus::InProcess, 5),
            StatementStatus::InArrears
        );
    }
}
