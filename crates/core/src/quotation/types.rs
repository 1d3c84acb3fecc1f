//! Quotation domain types and creation inputs.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::payment::PaymentMethod;

/// Payment form for a quotation.
///
/// The two branches are mutually exclusive: a cash quotation carries a
/// single settling payment reference, a financed one carries a financing
/// sub-record. Wire values keep the Spanish terms used by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentForm {
    /// Single immediate payment ("contado").
    #[serde(rename = "contado")]
    Cash,
    /// Installment plan with interest ("financiado").
    #[serde(rename = "financiado")]
    Financed,
}

/// Quotation-level lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotationStatus {
    /// Being drafted by the seller.
    Draft,
    /// Sent to the client, awaiting a decision.
    Sent,
    /// Accepted by the client.
    Approved,
    /// Service delivered and settled (immutable).
    Completed,
    /// Abandoned before completion.
    Cancelled,
}

impl QuotationStatus {
    /// Returns true while the quotation awaits approval.
    ///
    /// Both `Draft` and `Sent` are approvable states.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Draft | Self::Sent)
    }

    /// Returns true once the quotation can no longer change.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl std::fmt::Display for QuotationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Sent => write!(f, "sent"),
            Self::Approved => write!(f, "approved"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Service-fulfillment status, independent of the quotation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    /// Service has not started.
    Pending,
    /// Service is being delivered.
    InProcess,
    /// Service finished and, if financed, fully paid.
    Completed,
    /// Service called off.
    Cancelled,
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::InProcess => write!(f, "in_process"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// One priced line item inside a quotation.
///
/// `investment_total` and `sale_price` are derived; they are recomputed on
/// every save and never accepted from input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Work description.
    pub description: String,
    /// Materials cost.
    pub materials_cost: Decimal,
    /// Labor cost.
    pub labor_cost: Decimal,
    /// Expected profit percentage over the investment.
    pub profit_pct: Decimal,
    /// Derived: materials + labor.
    pub investment_total: Decimal,
    /// Derived: investment * (1 + profit / 100).
    pub sale_price: Decimal,
}

/// Financing sub-record for a `Financed` quotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Financing {
    /// Initial down payment ("anticipo").
    pub down_payment: Decimal,
    /// Number of weekly installments (>= 1).
    pub term_weeks: u32,
    /// Interest rate applied to the sale total.
    pub interest_rate: Decimal,
    /// Derived: balance left after the down payment.
    pub remaining_balance: Decimal,
    /// Derived: remaining balance / term.
    pub weekly_payment: Decimal,
    /// First day of the financing term.
    pub start_date: NaiveDate,
    /// Derived: start + term * 7 days.
    pub end_date: NaiveDate,
}

/// The quotation root aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quotation {
    /// Unique identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Client this quotation is addressed to.
    pub client_id: Uuid,
    /// Seller who created it.
    pub created_by: Uuid,
    /// Branch/affiliate the sale belongs to.
    pub branch_id: Uuid,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Validity deadline; strictly after `created_at`.
    pub valid_until: DateTime<Utc>,
    /// Ordered line items.
    pub items: Vec<LineItem>,
    /// Derived: sum of item sale prices.
    pub subtotal: Decimal,
    /// Derived: subtotal * tax rate.
    pub tax: Decimal,
    /// Derived: subtotal + tax; on the financed branch this additionally
    /// includes the interest surcharge.
    pub sale_total: Decimal,
    /// Cash or financed.
    pub payment_form: PaymentForm,
    /// Cash branch: the single settling payment, once created.
    pub cash_payment_id: Option<Uuid>,
    /// Financed branch: the installment terms.
    pub financing: Option<Financing>,
    /// Quotation-level status.
    pub status: QuotationStatus,
    /// Service-fulfillment status.
    pub service_status: ServiceStatus,
    /// Stamped when the service starts.
    pub service_started_at: Option<DateTime<Utc>>,
    /// Stamped when the service completes.
    pub service_completed_at: Option<DateTime<Utc>>,
}

/// Input for creating a quotation.
///
/// Field names are the wire contract used by the front-end.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateQuotationInput {
    /// Display name.
    pub nombre: String,
    /// Client reference.
    pub cliente_id: Uuid,
    /// Branch/affiliate reference.
    pub sucursal_id: Uuid,
    /// Validity deadline.
    pub vigencia: DateTime<Utc>,
    /// Payment form.
    pub forma_pago: PaymentForm,
    /// Line items.
    pub detalles: Vec<LineItemInput>,
    /// Financing terms; required when `forma_pago` is financed.
    pub financiamiento: Option<FinancingInput>,
    /// Method for the auto-created initial payment. Required on the cash
    /// branch, and on the financed branch when the down payment is positive.
    pub metodo_pago: Option<PaymentMethod>,
}

/// Input for a single line item.
#[derive(Debug, Clone, Deserialize)]
pub struct LineItemInput {
    /// Work description.
    pub descripcion: String,
    /// Materials cost.
    pub costo_materiales: Decimal,
    /// Labor cost.
    pub costo_mano_obra: Decimal,
    /// Expected profit percentage.
    pub porcentaje_ganancia: Decimal,
}

/// Input for the financing sub-record.
#[derive(Debug, Clone, Deserialize)]
pub struct FinancingInput {
    /// Down payment amount.
    pub anticipo: Decimal,
    /// Number of weekly installments.
    pub plazo_semanas: u32,
    /// Interest rate; defaults to 0.34 when omitted.
    pub tasa_interes: Option<Decimal>,
    /// First day of the term; defaults to the creation date.
    pub fecha_inicio: Option<NaiveDate>,
}
