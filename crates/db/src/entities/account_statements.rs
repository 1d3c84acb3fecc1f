//! `SeaORM` Entity for the account statements table.
//!
//! One statement per financed quotation, enforced by a unique constraint
//! on `quotation_id`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::StatementStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "account_statements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub quotation_id: Uuid,
    pub client_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub initial_balance: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub payments_total: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub current_balance: Decimal,
    pub due_date: Date,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub weekly_payment: Decimal,
    pub days_in_arrears: i64,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub moratory_interest: Decimal,
    #[sea_orm(column_type = "Decimal(Some((8, 4)))")]
    pub moratory_daily_rate: Decimal,
    pub status: StatementStatus,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::quotations::Entity",
        from = "Column::QuotationId",
        to = "super::quotations::Column::Id"
    )]
    Quotations,
}

impl Related<super::quotations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Quotations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
