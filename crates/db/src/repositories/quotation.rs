//! Quotation repository for fetch, list, and persistence operations.
//!
//! Balance fields are never mutated here directly; every write takes a
//! fully recomputed domain aggregate and stores it verbatim.

use cotiza_core::quotation::{PaymentForm, Quotation, QuotationStatus};
use cotiza_shared::types::{PageRequest, PageResponse};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
};
use uuid::Uuid;

use crate::entities::quotations;
use crate::entities::sea_orm_active_enums;

/// Error types for quotation storage operations.
#[derive(Debug, thiserror::Error)]
pub enum QuotationRepoError {
    /// Quotation not found.
    #[error("Quotation not found: {0}")]
    NotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Selects a quotation row under an exclusive lock (`SELECT ... FOR
/// UPDATE`).
///
/// Every transaction that rewrites balance or status columns fetches the
/// row through this, so concurrent writers queue on the row lock and each
/// one computes from the committed state of the one before it.
pub(crate) fn select_for_update(id: Uuid) -> Select<quotations::Entity> {
    quotations::Entity::find_by_id(id).lock_exclusive()
}

/// Filter options for listing quotations.
#[derive(Debug, Clone, Default)]
pub struct QuotationFilter {
    /// Filter by quotation status.
    pub status: Option<QuotationStatus>,
    /// Filter by payment form.
    pub payment_form: Option<PaymentForm>,
    /// Filter by client.
    pub client_id: Option<Uuid>,
    /// Filter by branch.
    pub branch_id: Option<Uuid>,
}

/// Quotation repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct QuotationRepository {
    db: DatabaseConnection,
}

impl QuotationRepository {
    /// Creates a new quotation repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Fetches a quotation by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no row exists, or a database error.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Quotation, QuotationRepoError> {
        let model = quotations::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(QuotationRepoError::NotFound(id))?;
        Ok(model.into_domain()?)
    }

    /// Fetches a quotation by id inside an open transaction, taking the
    /// exclusive row lock.
    ///
    /// Callers are the lifecycle operations, all of which write the row
    /// back before committing.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no row exists, or a database error.
    pub async fn find_in(
        &self,
        txn: &DatabaseTransaction,
        id: Uuid,
    ) -> Result<Quotation, QuotationRepoError> {
        let model = select_for_update(id)
            .one(txn)
            .await?
            .ok_or(QuotationRepoError::NotFound(id))?;
        Ok(model.into_domain()?)
    }

    /// Lists quotations, newest first, with optional filters.
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub async fn list(
        &self,
        filter: &QuotationFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<Quotation>, QuotationRepoError> {
        let mut query = quotations::Entity::find();

        if let Some(status) = filter.status {
            let status: sea_orm_active_enums::QuotationStatus = status.into();
            query = query.filter(quotations::Column::Status.eq(status));
        }
        if let Some(form) = filter.payment_form {
            let form: sea_orm_active_enums::PaymentForm = form.into();
            query = query.filter(quotations::Column::PaymentForm.eq(form));
        }
        if let Some(client_id) = filter.client_id {
            query = query.filter(quotations::Column::ClientId.eq(client_id));
        }
        if let Some(branch_id) = filter.branch_id {
            query = query.filter(quotations::Column::BranchId.eq(branch_id));
        }

        let total = query.clone().count(&self.db).await?;
        let rows = query
            .order_by_desc(quotations::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        let data = rows
            .into_iter()
            .map(quotations::Model::into_domain)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }

    /// Inserts a quotation inside an open transaction.
    ///
    /// # Errors
    ///
    /// Returns a database error if the insert fails.
    pub async fn insert_in(
        &self,
        txn: &DatabaseTransaction,
        quotation: &Quotation,
    ) -> Result<(), QuotationRepoError> {
        quotations::active_model(quotation)?.insert(txn).await?;
        Ok(())
    }

    /// Persists the full aggregate state inside an open transaction.
    ///
    /// # Errors
    ///
    /// Returns a database error if the update fails.
    pub async fn update_in(
        &self,
        txn: &DatabaseTransaction,
        quotation: &Quotation,
    ) -> Result<(), QuotationRepoError> {
        quotations::active_model(quotation)?.update(txn).await?;
        Ok(())
    }

    /// Deletes a quotation row inside an open transaction.
    ///
    /// Deletability guards belong to the lifecycle controller; this only
    /// removes the row.
    ///
    /// # Errors
    ///
    /// Returns a database error if the delete fails.
    pub async fn delete_in(
        &self,
        txn: &DatabaseTransaction,
        id: Uuid,
    ) -> Result<(), QuotationRepoError> {
        quotations::Entity::delete_by_id(id).exec(txn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, QueryTrait};

    #[test]
    fn test_transactional_fetch_locks_the_row() {
        let sql = select_for_update(Uuid::nil())
            .build(DbBackend::Postgres)
            .to_string();
        assert!(sql.ends_with("FOR UPDATE"), "missing row lock: {sql}");
    }
}
