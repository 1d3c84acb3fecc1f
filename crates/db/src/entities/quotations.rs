//! `SeaORM` Entity for the quotations table.
//!
//! Line items are stored as a JSONB document; the financing sub-record is
//! flattened into nullable `financing_*` columns that are all present on
//! the financed branch and all null on the cash branch.

use cotiza_core::quotation::{Financing, LineItem, Quotation};
use sea_orm::entity::prelude::*;
use sea_orm::{DbErr, Set};
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{PaymentForm, QuotationStatus, ServiceStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "quotations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub client_id: Uuid,
    pub created_by: Uuid,
    pub branch_id: Uuid,
    pub valid_until: DateTimeWithTimeZone,
    #[sea_orm(column_type = "JsonBinary")]
    pub items: Json,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub subtotal: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub tax: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub sale_total: Decimal,
    pub payment_form: PaymentForm,
    pub cash_payment_id: Option<Uuid>,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))", nullable)]
    pub financing_down_payment: Option<Decimal>,
    pub financing_term_weeks: Option<i32>,
    #[sea_orm(column_type = "Decimal(Some((8, 4)))", nullable)]
    pub financing_interest_rate: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))", nullable)]
    pub financing_remaining_balance: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))", nullable)]
    pub financing_weekly_payment: Option<Decimal>,
    pub financing_start_date: Option<Date>,
    pub financing_end_date: Option<Date>,
    pub status: QuotationStatus,
    pub service_status: ServiceStatus,
    pub service_started_at: Option<DateTimeWithTimeZone>,
    pub service_completed_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::payments::Entity")]
    Payments,
    #[sea_orm(has_one = "super::account_statements::Entity")]
    AccountStatements,
}

impl Related<super::payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl Related<super::account_statements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AccountStatements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Rehydrates the domain aggregate from a row.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored items document or financing columns
    /// are inconsistent with the payment-form branch.
    pub fn into_domain(self) -> Result<Quotation, DbErr> {
        let items: Vec<LineItem> = serde_json::from_value(self.items)
            .map_err(|e| DbErr::Custom(format!("corrupt line items document: {e}")))?;

        let financing = match (
            self.financing_down_payment,
            self.financing_term_weeks,
            self.financing_interest_rate,
            self.financing_remaining_balance,
            self.financing_weekly_payment,
            self.financing_start_date,
            self.financing_end_date,
        ) {
            (
                Some(down_payment),
                Some(term_weeks),
                Some(interest_rate),
                Some(remaining_balance),
                Some(weekly_payment),
                Some(start_date),
                Some(end_date),
            ) => Some(Financing {
                down_payment,
                term_weeks: u32::try_from(term_weeks)
                    .map_err(|_| DbErr::Custom("negative financing term".to_string()))?,
                interest_rate,
                remaining_balance,
                weekly_payment,
                start_date,
                end_date,
            }),
            (None, None, None, None, None, None, None) => None,
            _ => {
                return Err(DbErr::Custom(
                    "partially populated financing columns".to_string(),
                ));
            }
        };

        Ok(Quotation {
            id: self.id,
            name: self.name,
            client_id: self.client_id,
            created_by: self.created_by,
            branch_id: self.branch_id,
            created_at: self.created_at.to_utc(),
            valid_until: self.valid_until.to_utc(),
            items,
            subtotal: self.subtotal,
            tax: self.tax,
            sale_total: self.sale_total,
            payment_form: self.payment_form.into(),
            cash_payment_id: self.cash_payment_id,
            financing,
            status: self.status.into(),
            service_status: self.service_status.into(),
            service_started_at: self.service_started_at.map(|t| t.to_utc()),
            service_completed_at: self.service_completed_at.map(|t| t.to_utc()),
        })
    }
}

/// Builds a full active model from the domain aggregate.
///
/// Every column is `Set`, so the same builder serves inserts and updates.
///
/// # Errors
///
/// Returns an error if the line items cannot be serialized or the term does
/// not fit the column type.
pub fn active_model(quotation: &Quotation) -> Result<ActiveModel, DbErr> {
    let items = serde_json::to_value(&quotation.items)
        .map_err(|e| DbErr::Custom(format!("unserializable line items: {e}")))?;
    let financing = quotation.financing.as_ref();
    let term_weeks = financing
        .map(|f| i32::try_from(f.term_weeks))
        .transpose()
        .map_err(|_| DbErr::Custom("financing term out of range".to_string()))?;

    Ok(ActiveModel {
        id: Set(quotation.id),
        name: Set(quotation.name.clone()),
        client_id: Set(quotation.client_id),
        created_by: Set(quotation.created_by),
        branch_id: Set(quotation.branch_id),
        valid_until: Set(quotation.valid_until.into()),
        items: Set(items),
        subtotal: Set(quotation.subtotal),
        tax: Set(quotation.tax),
        sale_total: Set(quotation.sale_total),
        payment_form: Set(quotation.payment_form.into()),
        cash_payment_id: Set(quotation.cash_payment_id),
        financing_down_payment: Set(financing.map(|f| f.down_payment)),
        financing_term_weeks: Set(term_weeks),
        financing_interest_rate: Set(financing.map(|f| f.interest_rate)),
        financing_remaining_balance: Set(financing.map(|f| f.remaining_balance)),
        financing_weekly_payment: Set(financing.map(|f| f.weekly_payment)),
        financing_start_date: Set(financing.map(|f| f.start_date)),
        financing_end_date: Set(financing.map(|f| f.end_date)),
        status: Set(quotation.status.into()),
        service_status: Set(quotation.service_status.into()),
        service_started_at: Set(quotation.service_started_at.map(Into::into)),
        service_completed_at: Set(quotation.service_completed_at.map(Into::into)),
        created_at: Set(quotation.created_at.into()),
        updated_at: Set(chrono::Utc::now().into()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use cotiza_core::payment::PaymentMethod;
    use cotiza_core::quotation::{
        CreateQuotationInput, FinancingInput, LineItemInput, PaymentForm as CorePaymentForm,
    };
    use rust_decimal_macros::dec;

    fn financed_quotation() -> Quotation {
        let now = Utc::now();
        Quotation::create(
            CreateQuotationInput {
                nombre: "Remodelación".to_string(),
                cliente_id: Uuid::new_v4(),
                sucursal_id: Uuid::new_v4(),
                vigencia: now + Duration::days(30),
                forma_pago: CorePaymentForm::Financed,
                detalles: vec![LineItemInput {
                    descripcion: "Obra".to_string(),
                    costo_materiales: dec!(700),
                    costo_mano_obra: dec!(162.07),
                    porcentaje_ganancia: dec!(0),
                }],
                financiamiento: Some(FinancingInput {
                    anticipo: dec!(100),
                    plazo_semanas: 10,
                    tasa_interes: Some(dec!(0.34)),
                    fecha_inicio: None,
                }),
                metodo_pago: Some(PaymentMethod::Transfer),
            },
            Uuid::new_v4(),
            now,
        )
        .unwrap()
    }

    #[test]
    fn test_domain_row_round_trip() {
        let quotation = financed_quotation();
        let row_model = active_model(&quotation).unwrap();
        let model = Model {
            id: quotation.id,
            name: quotation.name.clone(),
            client_id: quotation.client_id,
            created_by: quotation.created_by,
            branch_id: quotation.branch_id,
            valid_until: quotation.valid_until.into(),
            items: row_model.items.clone().unwrap(),
            subtotal: quotation.subtotal,
            tax: quotation.tax,
            sale_total: quotation.sale_total,
            payment_form: quotation.payment_form.into(),
            cash_payment_id: None,
            financing_down_payment: row_model.financing_down_payment.clone().unwrap(),
            financing_term_weeks: row_model.financing_term_weeks.clone().unwrap(),
            financing_interest_rate: row_model.financing_interest_rate.clone().unwrap(),
            financing_remaining_balance: row_model.financing_remaining_balance.clone().unwrap(),
            financing_weekly_payment: row_model.financing_weekly_payment.clone().unwrap(),
            financing_start_date: row_model.financing_start_date.clone().unwrap(),
            financing_end_date: row_model.financing_end_date.clone().unwrap(),
            status: quotation.status.into(),
            service_status: quotation.service_status.into(),
            service_started_at: None,
            service_completed_at: None,
            created_at: quotation.created_at.into(),
            updated_at: quotation.created_at.into(),
        };
        let restored = model.into_domain().unwrap();
        assert_eq!(restored, quotation);
    }

    #[test]
    fn test_partial_financing_columns_rejected() {
        let quotation = financed_quotation();
        let row_model = active_model(&quotation).unwrap();
        let model = Model {
            id: quotation.id,
            name: quotation.name.clone(),
            client_id: quotation.client_id,
            created_by: quotation.created_by,
            branch_id: quotation.branch_id,
            valid_until: quotation.valid_until.into(),
            items: row_model.items.clone().unwrap(),
            subtotal: quotation.subtotal,
            tax: quotation.tax,
            sale_total: quotation.sale_total,
            payment_form: quotation.payment_form.into(),
            cash_payment_id: None,
            financing_down_payment: Some(dec!(100)),
            // the rest of the financing columns are missing
            financing_term_weeks: None,
            financing_interest_rate: None,
            financing_remaining_balance: None,
            financing_weekly_payment: None,
            financing_start_date: None,
            financing_end_date: None,
            status: quotation.status.into(),
            service_status: quotation.service_status.into(),
            service_started_at: None,
            service_completed_at: None,
            created_at: quotation.created_at.into(),
            updated_at: quotation.created_at.into(),
        };
        assert!(model.into_domain().is_err());
    }
}
