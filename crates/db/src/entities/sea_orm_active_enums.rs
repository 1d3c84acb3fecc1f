//! Postgres enum mappings and conversions to the core domain enums.

use cotiza_core::payment as core_payment;
use cotiza_core::quotation as core_quotation;
use cotiza_core::statement as core_statement;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payment form of a quotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payment_form")]
#[serde(rename_all = "snake_case")]
pub enum PaymentForm {
    /// Single immediate payment.
    #[sea_orm(string_value = "contado")]
    #[serde(rename = "contado")]
    Cash,
    /// Installment plan with interest.
    #[sea_orm(string_value = "financiado")]
    #[serde(rename = "financiado")]
    Financed,
}

/// Quotation-level lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "quotation_status")]
#[serde(rename_all = "snake_case")]
pub enum QuotationStatus {
    /// Being drafted.
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Sent to the client.
    #[sea_orm(string_value = "sent")]
    Sent,
    /// Accepted by the client.
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Delivered and settled.
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Abandoned.
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

/// Service-fulfillment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "service_status")]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    /// Not started.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Being delivered.
    #[sea_orm(string_value = "in_process")]
    InProcess,
    /// Finished and paid.
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Called off.
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

/// What a payment represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payment_type")]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    /// Cash settlement.
    #[sea_orm(string_value = "cash")]
    Cash,
    /// Down payment.
    #[sea_orm(string_value = "advance")]
    Advance,
    /// Installment.
    #[sea_orm(string_value = "installment")]
    Installment,
    /// Ordinary interest.
    #[sea_orm(string_value = "interest")]
    Interest,
    /// Moratory interest.
    #[sea_orm(string_value = "arrears")]
    Arrears,
}

/// How a payment was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payment_method")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash.
    #[sea_orm(string_value = "cash")]
    Cash,
    /// Bank transfer.
    #[sea_orm(string_value = "transfer")]
    Transfer,
    /// Card payment.
    #[sea_orm(string_value = "card")]
    Card,
    /// Bank deposit.
    #[sea_orm(string_value = "deposit")]
    Deposit,
}

/// Lifecycle status of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payment_status")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Scheduled.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Collected.
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Voided.
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    /// Returned.
    #[sea_orm(string_value = "refunded")]
    Refunded,
    /// Declined.
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

/// Lifecycle status of an account statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "statement_status")]
#[serde(rename_all = "snake_case")]
pub enum StatementStatus {
    /// Payments up to date.
    #[sea_orm(string_value = "active")]
    Active,
    /// Past the due date.
    #[sea_orm(string_value = "in_arrears")]
    InArrears,
    /// Paid down to zero.
    #[sea_orm(string_value = "settled")]
    Settled,
    /// Financing called off.
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    /// Under review.
    #[sea_orm(string_value = "in_process")]
    InProcess,
}

impl From<core_quotation::PaymentForm> for PaymentForm {
    fn from(value: core_quotation::PaymentForm) -> Self {
        match value {
            core_quotation::PaymentForm::Cash => Self::Cash,
            core_quotation::PaymentForm::Financed => Self::Financed,
        }
    }
}

impl From<PaymentForm> for core_quotation::PaymentForm {
    fn from(value: PaymentForm) -> Self {
        match value {
            PaymentForm::Cash => Self::Cash,
            PaymentForm::Financed => Self::Financed,
        }
    }
}

impl From<core_quotation::QuotationStatus> for QuotationStatus {
    fn from(value: core_quotation::QuotationStatus) -> Self {
        match value {
            core_quotation::QuotationStatus::Draft => Self::Draft,
            core_quotation::QuotationStatus::Sent => Self::Sent,
            core_quotation::QuotationStatus::Approved => Self::Approved,
            core_quotation::QuotationStatus::Completed => Self::Completed,
            core_quotation::QuotationStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<QuotationStatus> for core_quotation::QuotationStatus {
    fn from(value: QuotationStatus) -> Self {
        match value {
            QuotationStatus::Draft => Self::Draft,
            QuotationStatus::Sent => Self::Sent,
            QuotationStatus::Approved => Self::Approved,
            QuotationStatus::Completed => Self::Completed,
            QuotationStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<core_quotation::ServiceStatus> for ServiceStatus {
    fn from(value: core_quotation::ServiceStatus) -> Self {
        match value {
            core_quotation::ServiceStatus::Pending => Self::Pending,
            core_quotation::ServiceStatus::InProcess => Self::InProcess,
            core_quotation::ServiceStatus::Completed => Self::Completed,
            core_quotation::ServiceStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<ServiceStatus> for core_quotation::ServiceStatus {
    fn from(value: ServiceStatus) -> Self {
        match value {
            ServiceStatus::Pending => Self::Pending,
            ServiceStatus::InProcess => Self::InProcess,
            ServiceStatus::Completed => Self::Completed,
            ServiceStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<core_payment::PaymentType> for PaymentType {
    fn from(value: core_payment::PaymentType) -> Self {
        match value {
            core_payment::PaymentType::Cash => Self::Cash,
            core_payment::PaymentType::Advance => Self::Advance,
            core_payment::PaymentType::Installment => Self::Installment,
            core_payment::PaymentType::Interest => Self::Interest,
            core_payment::PaymentType::Arrears => Self::Arrears,
        }
    }
}

impl From<PaymentType> for core_payment::PaymentType {
    fn from(value: PaymentType) -> Self {
        match value {
            PaymentType::Cash => Self::Cash,
            PaymentType::Advance => Self::Advance,
            PaymentType::Installment => Self::Installment,
            PaymentType::Interest => Self::Interest,
            PaymentType::Arrears => Self::Arrears,
        }
    }
}

impl From<core_payment::PaymentMethod> for PaymentMethod {
    fn from(value: core_payment::PaymentMethod) -> Self {
        match value {
            core_payment::PaymentMethod::Cash => Self::Cash,
            core_payment::PaymentMethod::Transfer => Self::Transfer,
            core_payment::PaymentMethod::Card => Self::Card,
            core_payment::PaymentMethod::Deposit => Self::Deposit,
        }
    }
}

impl From<PaymentMethod> for core_payment::PaymentMethod {
    fn from(value: PaymentMethod) -> Self {
        match value {
            PaymentMethod::Cash => Self::Cash,
            PaymentMethod::Transfer => Self::Transfer,
            PaymentMethod::Card => Self::Card,
            PaymentMethod::Deposit => Self::Deposit,
        }
    }
}

impl From<core_payment::PaymentStatus> for PaymentStatus {
    fn from(value: core_payment::PaymentStatus) -> Self {
        match value {
            core_payment::PaymentStatus::Pending => Self::Pending,
            core_payment::PaymentStatus::Completed => Self::Completed,
            core_payment::PaymentStatus::Cancelled => Self::Cancelled,
            core_payment::PaymentStatus::Refunded => Self::Refunded,
            core_payment::PaymentStatus::Rejected => Self::Rejected,
        }
    }
}

impl From<PaymentStatus> for core_payment::PaymentStatus {
    fn from(value: PaymentStatus) -> Self {
        match value {
            PaymentStatus::Pending => Self::Pending,
            PaymentStatus::Completed => Self::Completed,
            PaymentStatus::Cancelled => Self::Cancelled,
            PaymentStatus::Refunded => Self::Refunded,
            PaymentStatus::Rejected => Self::Rejected,
        }
    }
}

impl From<core_statement::StatementStatus> for StatementStatus {
    fn from(value: core_statement::StatementStatus) -> Self {
        match value {
            core_statement::StatementStatus::Active => Self::Active,
            core_statement::StatementStatus::InArrears => Self::InArrears,
            core_statement::StatementStatus::Settled => Self::Settled,
            core_statement::StatementStatus::Cancelled => Self::Cancelled,
            core_statement::StatementStatus::InProcess => Self::InProcess,
        }
    }
}

impl From<StatementStatus> for core_statement::StatementStatus {
    fn from(value: StatementStatus) -> Self {
        match value {
            StatementStatus::Active => Self::Active,
            StatementStatus::InArrears => Self::InArrears,
            StatementStatus::Settled => Self::Settled,
            StatementStatus::Cancelled => Self::Cancelled,
            StatementStatus::InProcess => Self::InProcess,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_form_round_trip() {
        for form in [
            core_quotation::PaymentForm::Cash,
            core_quotation::PaymentForm::Financed,
        ] {
            let db: PaymentForm = form.into();
            let back: core_quotation::PaymentForm = db.into();
            assert_eq!(back, form);
        }
    }

    #[test]
    fn test_service_status_round_trip() {
        for status in [
            core_quotation::ServiceStatus::Pending,
            core_quotation::ServiceStatus::InProcess,
            core_quotation::ServiceStatus::Completed,
            core_quotation::ServiceStatus::Cancelled,
        ] {
            let db: ServiceStatus = status.into();
            let back: core_quotation::ServiceStatus = db.into();
            assert_eq!(back, status);
        }
    }

    #[test]
    fn test_statement_status_round_trip() {
        for status in [
            core_statement::StatementStatus::Active,
            core_statement::StatementStatus::InArrears,
            core_statement::StatementStatus::Settled,
            core_statement::StatementStatus::Cancelled,
            core_statement::StatementStatus::InProcess,
        ] {
            let db: StatementStatus = status.into();
            let back: core_statement::StatementStatus = db.into();
            assert_eq!(back, status);
        }
    }
}
