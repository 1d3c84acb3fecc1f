//! API route definitions.
//!
//! Handlers map domain errors to status codes and perform no business
//! recovery; every balance mutation happens behind the lifecycle
//! controller and the payment ledger.

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use crate::{AppState, middleware::auth::auth_middleware};
use cotiza_core::quotation::{Quotation, QuotationError};
use cotiza_db::entities::{account_statements, payments as payment_entities};
use cotiza_db::{LifecycleError, PaymentError, QuotationRepoError, StatementError};
use cotiza_shared::AppError;

pub mod health;
pub mod payments;
pub mod quotations;
pub mod statements;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(quotations::routes())
        .merge(payments::routes())
        .merge(statements::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new().merge(health::routes()).merge(protected_routes)
}

/// Serializes a quotation aggregate with the Spanish wire field names.
pub(crate) fn quotation_json(q: &Quotation) -> serde_json::Value {
    json!({
        "id": q.id,
        "nombre": q.name,
        "cliente_id": q.client_id,
        "creado_por": q.created_by,
        "sucursal_id": q.branch_id,
        "fecha_creacion": q.created_at,
        "vigencia": q.valid_until,
        "detalles": q.items.iter().map(|item| json!({
            "descripcion": item.description,
            "costo_materiales": item.materials_cost,
            "costo_mano_obra": item.labor_cost,
            "porcentaje_ganancia": item.profit_pct,
            "inversion_total": item.investment_total,
            "precio_venta": item.sale_price,
        })).collect::<Vec<_>>(),
        "subtotal": q.subtotal,
        "iva": q.tax,
        "total_venta": q.sale_total,
        "forma_pago": q.payment_form,
        "pago_contado_id": q.cash_payment_id,
        "financiamiento": q.financing.as_ref().map(|f| json!({
            "anticipo": f.down_payment,
            "plazo_semanas": f.term_weeks,
            "tasa_interes": f.interest_rate,
            "saldo_restante": f.remaining_balance,
            "pago_semanal": f.weekly_payment,
            "fecha_inicio": f.start_date,
            "fecha_fin": f.end_date,
        })),
        "estado": q.status,
        "estado_servicio": q.service_status,
        "servicio_iniciado_en": q.service_started_at,
        "servicio_completado_en": q.service_completed_at,
    })
}

/// Serializes a payment row with the Spanish wire field names.
pub(crate) fn payment_json(p: &payment_entities::Model) -> serde_json::Value {
    json!({
        "id": p.id,
        "cotizacion_id": p.quotation_id,
        "cliente_id": p.client_id,
        "referencia": p.reference,
        "tipo_pago": p.payment_type,
        "metodo_pago": p.method,
        "estado": p.status,
        "monto": p.amount,
        "saldo_despues": p.balance_after,
        "fecha_vencimiento": p.due_date,
        "fecha_pago": p.paid_at,
        "notas": p.notes,
        "fecha_creacion": p.created_at,
    })
}

/// Serializes an account statement with the Spanish wire field names.
pub(crate) fn statement_json(s: &account_statements::Model) -> serde_json::Value {
    json!({
        "id": s.id,
        "cotizacion_id": s.quotation_id,
        "cliente_id": s.client_id,
        "saldo_inicial": s.initial_balance,
        "total_pagos": s.payments_total,
        "saldo_actual": s.current_balance,
        "fecha_vencimiento": s.due_date,
        "pago_semanal": s.weekly_payment,
        "dias_mora": s.days_in_arrears,
        "interes_moratorio": s.moratory_interest,
        "tasa_moratoria_diaria": s.moratory_daily_rate,
        "estado": s.status,
        "fecha_creacion": s.created_at,
    })
}

/// Maps an aggregate domain error to its HTTP response.
pub(crate) fn domain_error_response(err: &QuotationError) -> Response {
    let status = StatusCode::from_u16(err.http_status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut body = json!({
        "error": err.error_code(),
        "message": err.to_string(),
    });
    if let QuotationError::Validation { violations } = err {
        body["campos"] = violations
            .iter()
            .map(|v| json!({ "campo": v.field, "mensaje": v.message }))
            .collect();
    }
    (status, Json(body)).into_response()
}

/// Maps a payment ledger error to its HTTP response.
pub(crate) fn payment_error_response(err: &PaymentError) -> Response {
    let (status, code) = match err {
        PaymentError::NotFound(_) => (StatusCode::NOT_FOUND, "PAYMENT_NOT_FOUND"),
        PaymentError::QuotationNotFound(_) => (StatusCode::NOT_FOUND, "QUOTATION_NOT_FOUND"),
        PaymentError::MissingStatement(_) => (StatusCode::NOT_FOUND, "STATEMENT_NOT_FOUND"),
        PaymentError::NotFinanced => (StatusCode::BAD_REQUEST, "NOT_FINANCED"),
        PaymentError::ServiceNotActive => (StatusCode::BAD_REQUEST, "SERVICE_NOT_ACTIVE"),
        PaymentError::InvalidAmount => (StatusCode::BAD_REQUEST, "INVALID_AMOUNT"),
        PaymentError::ExceedsBalance { .. } => (StatusCode::BAD_REQUEST, "EXCEEDS_BALANCE"),
        PaymentError::CashImmutable => (StatusCode::CONFLICT, "CASH_PAYMENT_IMMUTABLE"),
        PaymentError::ReferenceExhausted | PaymentError::Database(_) => {
            error!(error = %err, "Payment ledger failure");
            (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
        }
    };
    (
        status,
        Json(json!({ "error": code, "message": err.to_string() })),
    )
        .into_response()
}

/// Maps a statement error to its HTTP response.
pub(crate) fn statement_error_response(err: &StatementError) -> Response {
    match err {
        StatementError::NotFound(_) | StatementError::NotFoundForQuotation(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "STATEMENT_NOT_FOUND", "message": err.to_string() })),
        )
            .into_response(),
        StatementError::Database(_) => {
            error!(error = %err, "Statement repository failure");
            internal_error_response()
        }
    }
}

/// Maps a quotation repository error to its HTTP response.
pub(crate) fn quotation_repo_error_response(err: &QuotationRepoError) -> Response {
    match err {
        QuotationRepoError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "QUOTATION_NOT_FOUND", "message": err.to_string() })),
        )
            .into_response(),
        QuotationRepoError::Database(_) => {
            error!(error = %err, "Quotation repository failure");
            internal_error_response()
        }
    }
}

/// Maps a lifecycle error to its HTTP response.
pub(crate) fn lifecycle_error_response(err: &LifecycleError) -> Response {
    match err {
        LifecycleError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "QUOTATION_NOT_FOUND", "message": err.to_string() })),
        )
            .into_response(),
        LifecycleError::Domain(domain) => domain_error_response(domain),
        LifecycleError::Payment(payment) => payment_error_response(payment),
        LifecycleError::Statement(statement) => statement_error_response(statement),
        LifecycleError::TransactionAborted(db) => {
            error!(error = %db, "Transaction aborted");
            internal_error_response()
        }
    }
}

fn internal_error_response() -> Response {
    let err = AppError::Internal("An error occurred".to_string());
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": err.error_code(),
            "message": err.to_string(),
        })),
    )
        .into_response()
}
