//! `SeaORM` entity definitions.

pub mod account_statements;
pub mod payments;
pub mod quotations;
pub mod sea_orm_active_enums;
