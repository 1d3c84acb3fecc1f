//! Quotation aggregate behavior: creation, recomputation, and guards.
//!
//! Recomputation is an explicit entry point invoked by every save path,
//! never a hidden persistence hook, so the control flow stays visible and
//! testable without a database.

use chrono::{DateTime, Days, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::pricing;

use super::error::{FieldViolation, QuotationError};
use super::types::{
    CreateQuotationInput, Financing, LineItem, PaymentForm, Quotation, QuotationStatus,
    ServiceStatus,
};

impl Quotation {
    /// Creates a quotation from validated input and recomputes all derived
    /// fields.
    ///
    /// # Errors
    ///
    /// Returns `QuotationError::Validation` listing every violated field.
    pub fn create(
        input: CreateQuotationInput,
        created_by: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Self, QuotationError> {
        Self::validate_input(&input, now)?;

        let items = input
            .detalles
            .iter()
            .map(|d| LineItem {
                description: d.descripcion.clone(),
                materials_cost: d.costo_materiales,
                labor_cost: d.costo_mano_obra,
                profit_pct: d.porcentaje_ganancia,
                investment_total: Decimal::ZERO,
                sale_price: Decimal::ZERO,
            })
            .collect();

        let financing = match (input.forma_pago, input.financiamiento) {
            (PaymentForm::Financed, Some(f)) => {
                let start_date = f.fecha_inicio.unwrap_or_else(|| now.date_naive());
                Some(Financing {
                    down_payment: f.anticipo,
                    term_weeks: f.plazo_semanas,
                    interest_rate: f.tasa_interes.unwrap_or(pricing::DEFAULT_INTEREST_RATE),
                    remaining_balance: Decimal::ZERO,
                    weekly_payment: Decimal::ZERO,
                    start_date,
                    end_date: start_date,
                })
            }
            // The cash branch never carries financing, even if supplied.
            _ => None,
        };

        let mut quotation = Self {
            id: Uuid::new_v4(),
            name: input.nombre,
            client_id: input.cliente_id,
            created_by,
            branch_id: input.sucursal_id,
            created_at: now,
            valid_until: input.vigencia,
            items,
            subtotal: Decimal::ZERO,
            tax: Decimal::ZERO,
            sale_total: Decimal::ZERO,
            payment_form: input.forma_pago,
            cash_payment_id: None,
            financing,
            status: QuotationStatus::Draft,
            service_status: ServiceStatus::Pending,
            service_started_at: None,
            service_completed_at: None,
        };

        quotation.recompute()?;
        Ok(quotation)
    }

    /// Validates creation input, collecting every violated field.
    fn validate_input(
        input: &CreateQuotationInput,
        now: DateTime<Utc>,
    ) -> Result<(), QuotationError> {
        let mut violations = Vec::new();

        if input.nombre.trim().is_empty() {
            violations.push(FieldViolation::new("nombre", "name is required"));
        }
        if input.detalles.is_empty() {
            violations.push(FieldViolation::new(
                "detalles",
                "at least one line item is required",
            ));
        }
        for (idx, item) in input.detalles.iter().enumerate() {
            if item.descripcion.trim().is_empty() {
                violations.push(FieldViolation::new(
                    "detalles",
                    format!("item {idx}: description is required"),
                ));
            }
            if item.costo_materiales < Decimal::ZERO || item.costo_mano_obra < Decimal::ZERO {
                violations.push(FieldViolation::new(
                    "detalles",
                    format!("item {idx}: costs cannot be negative"),
                ));
            }
            if item.porcentaje_ganancia < Decimal::ZERO {
                violations.push(FieldViolation::new(
                    "detalles",
                    format!("item {idx}: profit percentage cannot be negative"),
                ));
            }
        }
        if input.vigencia <= now {
            violations.push(FieldViolation::new(
                "vigencia",
                "must be after the creation date",
            ));
        }

        match input.forma_pago {
            PaymentForm::Financed => match &input.financiamiento {
                None => violations.push(FieldViolation::new(
                    "financiamiento",
                    "financing terms are required for financed quotations",
                )),
                Some(f) => {
                    if f.plazo_semanas < 1 {
                        violations.push(FieldViolation::new(
                            "financiamiento.plazo_semanas",
                            "term must be at least one week",
                        ));
                    }
                    if f.anticipo < Decimal::ZERO {
                        violations.push(FieldViolation::new(
                            "financiamiento.anticipo",
                            "down payment cannot be negative",
                        ));
                    }
                    if f.anticipo > Decimal::ZERO && input.metodo_pago.is_none() {
                        violations.push(FieldViolation::new(
                            "metodo_pago",
                            "payment method is required for the down payment",
                        ));
                    }
                    if let Some(rate) = f.tasa_interes {
                        if rate < Decimal::ZERO {
                            violations.push(FieldViolation::new(
                                "financiamiento.tasa_interes",
                                "interest rate cannot be negative",
                            ));
                        }
                    }
                }
            },
            PaymentForm::Cash => {
                if input.metodo_pago.is_none() {
                    violations.push(FieldViolation::new(
                        "metodo_pago",
                        "payment method is required for cash quotations",
                    ));
                }
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(QuotationError::Validation { violations })
        }
    }

    /// Re-derives every monetary field from the current line items and
    /// payment-form branch.
    ///
    /// Invoked by all persistence entry points before writing. Calling it
    /// twice with no field changes yields identical totals.
    ///
    /// # Errors
    ///
    /// Returns `QuotationError::InvalidTerm` if the financed branch carries
    /// a zero-week term, or `QuotationError::MissingFinancing` if the
    /// financed branch lost its sub-record.
    pub fn recompute(&mut self) -> Result<(), QuotationError> {
        for item in &mut self.items {
            let (investment, sale) =
                pricing::line_item_figures(item.materials_cost, item.labor_cost, item.profit_pct);
            item.investment_total = investment;
            item.sale_price = sale;
        }

        let sale_prices: Vec<Decimal> = self.items.iter().map(|i| i.sale_price).collect();
        let totals = pricing::quotation_totals(&sale_prices);
        self.subtotal = totals.subtotal;
        self.tax = totals.tax;
        self.sale_total = totals.sale_total;

        match self.payment_form {
            PaymentForm::Cash => {
                // Branches are mutually exclusive.
                self.financing = None;
            }
            PaymentForm::Financed => {
                let financing = self
                    .financing
                    .as_mut()
                    .ok_or(QuotationError::MissingFinancing)?;
                self.sale_total =
                    pricing::financed_sale_total(totals.sale_total, financing.interest_rate);
                let figures = pricing::financing_figures(
                    self.sale_total,
                    financing.down_payment,
                    financing.term_weeks,
                )
                .map_err(|_| QuotationError::InvalidTerm)?;
                financing.remaining_balance = figures.remaining_balance;
                financing.weekly_payment = figures.weekly_payment;
                financing.end_date = financing.start_date
                    + Days::new(7 * u64::from(financing.term_weeks));
                self.cash_payment_id = None;
            }
        }

        Ok(())
    }

    /// Approves a pending quotation.
    ///
    /// # Errors
    ///
    /// Returns `QuotationError::NotApprovable` unless the quotation is in a
    /// pending (draft or sent) state.
    pub fn approve(&mut self) -> Result<(), QuotationError> {
        if !self.status.is_pending() {
            return Err(QuotationError::NotApprovable(self.status));
        }
        self.status = QuotationStatus::Approved;
        Ok(())
    }

    /// Starts service delivery, stamping the start timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error unless the quotation is approved and the service is
    /// still pending.
    pub fn start_service(&mut self, now: DateTime<Utc>) -> Result<(), QuotationError> {
        if self.status != QuotationStatus::Approved
            || self.service_status != ServiceStatus::Pending
        {
            return Err(QuotationError::InvalidServiceTransition {
                from: self.service_status,
                to: ServiceStatus::InProcess,
            });
        }
        self.service_status = ServiceStatus::InProcess;
        self.service_started_at = Some(now);
        Ok(())
    }

    /// Completes the service and the quotation, stamping the end timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error unless the service is in process and, for financed
    /// quotations, the remaining balance is zero.
    pub fn complete_service(&mut self, now: DateTime<Utc>) -> Result<(), QuotationError> {
        if self.service_status != ServiceStatus::InProcess {
            return Err(QuotationError::InvalidServiceTransition {
                from: self.service_status,
                to: ServiceStatus::Completed,
            });
        }
        if let Some(financing) = &self.financing {
            if financing.remaining_balance > Decimal::ZERO {
                return Err(QuotationError::BalanceOutstanding(
                    financing.remaining_balance,
                ));
            }
        }
        self.service_status = ServiceStatus::Completed;
        self.status = QuotationStatus::Completed;
        self.service_completed_at = Some(now);
        Ok(())
    }

    /// Records the settling cash payment and completes the service in one
    /// step, the ledger side effect of a cash sale.
    ///
    /// # Errors
    ///
    /// Returns `QuotationError::NotCash` on the financed branch, or an
    /// invalid-transition error if the service already started.
    pub fn settle_cash(
        &mut self,
        payment_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), QuotationError> {
        if self.payment_form != PaymentForm::Cash {
            return Err(QuotationError::NotCash);
        }
        if self.service_status != ServiceStatus::Pending {
            return Err(QuotationError::InvalidServiceTransition {
                from: self.service_status,
                to: ServiceStatus::Completed,
            });
        }
        self.cash_payment_id = Some(payment_id);
        self.service_status = ServiceStatus::Completed;
        self.service_completed_at = Some(now);
        Ok(())
    }

    /// Cancels the quotation from any non-terminal state.
    ///
    /// Balances and already-recorded payments are left untouched.
    ///
    /// # Errors
    ///
    /// Returns `QuotationError::NotCancellable` for terminal states.
    pub fn cancel(&mut self) -> Result<(), QuotationError> {
        if self.status.is_terminal() {
            return Err(QuotationError::NotCancellable(self.status));
        }
        self.status = QuotationStatus::Cancelled;
        if self.service_status != ServiceStatus::Completed {
            self.service_status = ServiceStatus::Cancelled;
        }
        Ok(())
    }

    /// Guards deletion.
    ///
    /// # Errors
    ///
    /// Returns `QuotationError::NotDeletable` unless the service is pending.
    pub fn ensure_deletable(&self) -> Result<(), QuotationError> {
        if self.service_status != ServiceStatus::Pending {
            return Err(QuotationError::NotDeletable(self.service_status));
        }
        Ok(())
    }

    /// Returns the financing sub-record.
    ///
    /// # Errors
    ///
    /// Returns `QuotationError::NotFinanced` on the cash branch.
    pub fn financing(&self) -> Result<&Financing, QuotationError> {
        match self.payment_form {
            PaymentForm::Financed => {
                self.financing.as_ref().ok_or(QuotationError::MissingFinancing)
            }
            PaymentForm::Cash => Err(QuotationError::NotFinanced),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::PaymentMethod;
    use crate::quotation::types::{FinancingInput, LineItemInput};
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn make_item(materials: Decimal, labor: Decimal, profit: Decimal) -> LineItemInput {
        LineItemInput {
            descripcion: "Instalación eléctrica".to_string(),
            costo_materiales: materials,
            costo_mano_obra: labor,
            porcentaje_ganancia: profit,
        }
    }

    fn cash_input(now: DateTime<Utc>) -> CreateQuotationInput {
        CreateQuotationInput {
            nombre: "Cotización de prueba".to_string(),
            cliente_id: Uuid::new_v4(),
            sucursal_id: Uuid::new_v4(),
            vigencia: now + Duration::days(30),
            forma_pago: PaymentForm::Cash,
            detalles: vec![make_item(dec!(1000), dec!(500), dec!(10))],
            financiamiento: None,
            metodo_pago: Some(PaymentMethod::Cash),
        }
    }

    fn financed_input(now: DateTime<Utc>) -> CreateQuotationInput {
        CreateQuotationInput {
            forma_pago: PaymentForm::Financed,
            // subtotal 862.07 + 16% tax = 1000.00 pre-interest
            detalles: vec![make_item(dec!(700), dec!(162.07), dec!(0))],
            financiamiento: Some(FinancingInput {
                anticipo: dec!(100),
                plazo_semanas: 10,
                tasa_interes: Some(dec!(0.34)),
                fecha_inicio: None,
            }),
            metodo_pago: Some(PaymentMethod::Transfer),
            ..cash_input(now)
        }
    }

    #[test]
    fn test_create_cash_scenario() {
        let now = Utc::now();
        let q = Quotation::create(cash_input(now), Uuid::new_v4(), now).unwrap();
        assert_eq!(q.items[0].investment_total, dec!(1500.00));
        assert_eq!(q.items[0].sale_price, dec!(1650.00));
        assert_eq!(q.subtotal, dec!(1650.00));
        assert_eq!(q.tax, dec!(264.00));
        assert_eq!(q.sale_total, dec!(1914.00));
        assert_eq!(q.status, QuotationStatus::Draft);
        assert_eq!(q.service_status, ServiceStatus::Pending);
        assert!(q.financing.is_none());
    }

    #[test]
    fn test_create_financed_scenario() {
        let now = Utc::now();
        let q = Quotation::create(financed_input(now), Uuid::new_v4(), now).unwrap();
        // subtotal 862.07, tax 137.93, pre-interest total 1000.00
        assert_eq!(q.subtotal, dec!(862.07));
        assert_eq!(q.tax, dec!(137.93));
        assert_eq!(q.sale_total, dec!(1340.00));
        let f = q.financing.as_ref().unwrap();
        assert_eq!(f.remaining_balance, dec!(1240.00));
        assert_eq!(f.weekly_payment, dec!(124.00));
        assert_eq!(f.end_date, f.start_date + Days::new(70));
    }

    #[test]
    fn test_create_collects_all_violations() {
        let now = Utc::now();
        let input = CreateQuotationInput {
            nombre: " ".to_string(),
            vigencia: now - Duration::days(1),
            detalles: vec![],
            forma_pago: PaymentForm::Financed,
            financiamiento: None,
            ..cash_input(now)
        };
        let err = Quotation::create(input, Uuid::new_v4(), now).unwrap_err();
        let QuotationError::Validation { violations } = err else {
            panic!("expected validation error");
        };
        let fields: Vec<&str> = violations.iter().map(|v| v.field).collect();
        assert!(fields.contains(&"nombre"));
        assert!(fields.contains(&"detalles"));
        assert!(fields.contains(&"vigencia"));
        assert!(fields.contains(&"financiamiento"));
    }

    #[test]
    fn test_create_requires_payment_method() {
        let now = Utc::now();
        let mut input = cash_input(now);
        input.metodo_pago = None;
        let err = Quotation::create(input, Uuid::new_v4(), now).unwrap_err();
        let QuotationError::Validation { violations } = err else {
            panic!("expected validation error");
        };
        assert!(violations.iter().any(|v| v.field == "metodo_pago"));

        // Financed with a positive down payment needs one too
        let mut input = financed_input(now);
        input.metodo_pago = None;
        assert!(Quotation::create(input, Uuid::new_v4(), now).is_err());

        // But a zero down payment does not
        let mut input = financed_input(now);
        input.metodo_pago = None;
        input.financiamiento.as_mut().unwrap().anticipo = Decimal::ZERO;
        assert!(Quotation::create(input, Uuid::new_v4(), now).is_ok());
    }

    #[test]
    fn test_create_rejects_zero_term() {
        let now = Utc::now();
        let mut input = financed_input(now);
        input.financiamiento.as_mut().unwrap().plazo_semanas = 0;
        let err = Quotation::create(input, Uuid::new_v4(), now).unwrap_err();
        assert!(matches!(err, QuotationError::Validation { .. }));
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let now = Utc::now();
        let mut q = Quotation::create(financed_input(now), Uuid::new_v4(), now).unwrap();
        let before = q.clone();
        q.recompute().unwrap();
        assert_eq!(q, before);
    }

    #[test]
    fn test_recompute_clears_financing_on_cash_branch() {
        let now = Utc::now();
        let mut q = Quotation::create(financed_input(now), Uuid::new_v4(), now).unwrap();
        q.payment_form = PaymentForm::Cash;
        q.recompute().unwrap();
        assert!(q.financing.is_none());
        // Interest surcharge is gone as well
        assert_eq!(q.sale_total, dec!(1000.00));
    }

    #[test]
    fn test_approve_from_draft_and_sent() {
        let now = Utc::now();
        let mut q = Quotation::create(cash_input(now), Uuid::new_v4(), now).unwrap();
        q.approve().unwrap();
        assert_eq!(q.status, QuotationStatus::Approved);

        let mut q = Quotation::create(cash_input(now), Uuid::new_v4(), now).unwrap();
        q.status = QuotationStatus::Sent;
        q.approve().unwrap();
        assert_eq!(q.status, QuotationStatus::Approved);
    }

    #[test]
    fn test_approve_rejects_non_pending() {
        let now = Utc::now();
        let mut q = Quotation::create(cash_input(now), Uuid::new_v4(), now).unwrap();
        q.approve().unwrap();
        assert!(matches!(
            q.approve(),
            Err(QuotationError::NotApprovable(QuotationStatus::Approved))
        ));
    }

    #[test]
    fn test_start_service_requires_approval() {
        let now = Utc::now();
        let mut q = Quotation::create(cash_input(now), Uuid::new_v4(), now).unwrap();
        assert!(matches!(
            q.start_service(now),
            Err(QuotationError::InvalidServiceTransition { .. })
        ));

        q.approve().unwrap();
        q.start_service(now).unwrap();
        assert_eq!(q.service_status, ServiceStatus::InProcess);
        assert!(q.service_started_at.is_some());

        // Already active
        assert!(q.start_service(now).is_err());
    }

    #[test]
    fn test_complete_service_requires_zero_balance() {
        let now = Utc::now();
        let mut q = Quotation::create(financed_input(now), Uuid::new_v4(), now).unwrap();
        q.approve().unwrap();
        q.start_service(now).unwrap();

        let err = q.complete_service(now).unwrap_err();
        assert!(matches!(err, QuotationError::BalanceOutstanding(b) if b == dec!(1240.00)));

        q.financing.as_mut().unwrap().remaining_balance = Decimal::ZERO;
        q.complete_service(now).unwrap();
        assert_eq!(q.service_status, ServiceStatus::Completed);
        assert_eq!(q.status, QuotationStatus::Completed);
        assert!(q.service_completed_at.is_some());
    }

    #[test]
    fn test_delete_guard() {
        let now = Utc::now();
        let mut q = Quotation::create(cash_input(now), Uuid::new_v4(), now).unwrap();
        q.ensure_deletable().unwrap();

        q.approve().unwrap();
        q.start_service(now).unwrap();
        assert!(matches!(
            q.ensure_deletable(),
            Err(QuotationError::NotDeletable(ServiceStatus::InProcess))
        ));
    }

    #[test]
    fn test_settle_cash_completes_service_immediately() {
        let now = Utc::now();
        let mut q = Quotation::create(cash_input(now), Uuid::new_v4(), now).unwrap();
        let payment_id = Uuid::new_v4();
        q.settle_cash(payment_id, now).unwrap();
        assert_eq!(q.cash_payment_id, Some(payment_id));
        assert_eq!(q.service_status, ServiceStatus::Completed);
        assert!(q.service_completed_at.is_some());

        // A second settlement is rejected
        assert!(matches!(
            q.settle_cash(Uuid::new_v4(), now),
            Err(QuotationError::InvalidServiceTransition { .. })
        ));
    }

    #[test]
    fn test_settle_cash_rejects_financed_branch() {
        let now = Utc::now();
        let mut q = Quotation::create(financed_input(now), Uuid::new_v4(), now).unwrap();
        assert!(matches!(
            q.settle_cash(Uuid::new_v4(), now),
            Err(QuotationError::NotCash)
        ));
    }

    #[test]
    fn test_cancel_from_non_terminal() {
        let now = Utc::now();
        let mut q = Quotation::create(cash_input(now), Uuid::new_v4(), now).unwrap();
        q.cancel().unwrap();
        assert_eq!(q.status, QuotationStatus::Cancelled);
        assert_eq!(q.service_status, ServiceStatus::Cancelled);
        assert!(matches!(q.cancel(), Err(QuotationError::NotCancellable(_))));
    }

    #[test]
    fn test_financing_accessor() {
        let now = Utc::now();
        let q = Quotation::create(cash_input(now), Uuid::new_v4(), now).unwrap();
        assert!(matches!(q.financing(), Err(QuotationError::NotFinanced)));

        let q = Quotation::create(financed_input(now), Uuid::new_v4(), now).unwrap();
        assert!(q.financing().is_ok());
    }
}
