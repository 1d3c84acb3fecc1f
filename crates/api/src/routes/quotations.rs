//! Quotation lifecycle routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch, post},
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::routes::{
    lifecycle_error_response, payment_error_response, payment_json, quotation_json,
    quotation_repo_error_response, statement_error_response, statement_json,
};
use crate::{AppState, middleware::AuthUser};
use cotiza_core::quotation::{CreateQuotationInput, PaymentForm, QuotationStatus};
use cotiza_db::{
    PaymentLedger, QuotationFilter, QuotationLifecycle, QuotationRepository,
    RegisterPaymentInput, StatementRepository,
};
use cotiza_shared::types::PageRequest;

/// Creates the quotations router (auth middleware applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cotizaciones", post(create_quotation))
        .route("/cotizaciones", get(list_quotations))
        .route("/cotizaciones/{id}", get(get_quotation))
        .route("/cotizaciones/{id}", delete(delete_quotation))
        .route("/cotizaciones/{id}/aprobar", patch(approve_quotation))
        .route("/cotizaciones/{id}/activar-servicio", patch(activate_service))
        .route(
            "/cotizaciones/{id}/completar-servicio",
            patch(complete_service),
        )
        .route("/cotizaciones/{id}/pagos", post(register_payment))
        .route("/cotizaciones/{id}/pagos", get(list_payments))
        .route("/cotizaciones/{id}/estado-cuenta", get(get_statement))
}

/// Query parameters for listing quotations.
#[derive(Debug, Deserialize)]
struct ListQuotationsQuery {
    estado: Option<QuotationStatus>,
    forma_pago: Option<PaymentForm>,
    cliente_id: Option<Uuid>,
    sucursal_id: Option<Uuid>,
    page: Option<u32>,
    per_page: Option<u32>,
}

/// POST /cotizaciones - Create a quotation with its payment-form side
/// effects.
async fn create_quotation(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateQuotationInput>,
) -> impl IntoResponse {
    let lifecycle = QuotationLifecycle::new((*state.db).clone());

    match lifecycle.create(payload, auth.user_id()).await {
        Ok(created) => {
            let forma_pago = match created.quotation.payment_form {
                PaymentForm::Cash => "contado",
                PaymentForm::Financed => "financiado",
            };
            info!(
                quotation_id = %created.quotation.id,
                forma_pago,
                created_by = %auth.user_id(),
                "Quotation created"
            );
            (
                StatusCode::CREATED,
                Json(json!({
                    "cotizacion": quotation_json(&created.quotation),
                    "pago_inicial": created.initial_payment.as_ref().map(payment_json),
                    "estado_cuenta": created.statement.as_ref().map(statement_json),
                })),
            )
                .into_response()
        }
        Err(e) => lifecycle_error_response(&e),
    }
}

/// GET /cotizaciones - List quotations, newest first.
async fn list_quotations(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<ListQuotationsQuery>,
) -> impl IntoResponse {
    let repo = QuotationRepository::new((*state.db).clone());
    let filter = QuotationFilter {
        status: query.estado,
        payment_form: query.forma_pago,
        client_id: query.cliente_id,
        branch_id: query.sucursal_id,
    };
    let page = PageRequest::clamped(query.page, query.per_page);

    match repo.list(&filter, &page).await {
        Ok(result) => Json(json!({
            "data": result.data.iter().map(quotation_json).collect::<Vec<_>>(),
            "meta": result.meta,
        }))
        .into_response(),
        Err(e) => quotation_repo_error_response(&e),
    }
}

/// GET `/cotizaciones/{id}` - Fetch one quotation.
async fn get_quotation(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = QuotationRepository::new((*state.db).clone());
    match repo.find_by_id(id).await {
        Ok(quotation) => Json(quotation_json(&quotation)).into_response(),
        Err(e) => quotation_repo_error_response(&e),
    }
}

/// PATCH `/cotizaciones/{id}/aprobar` - Approve a pending quotation.
///
/// On the financed branch this also generates the installment schedule.
async fn approve_quotation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let lifecycle = QuotationLifecycle::new((*state.db).clone());
    match lifecycle.approve(id).await {
        Ok(quotation) => {
            info!(quotation_id = %id, approved_by = %auth.user_id(), "Quotation approved");
            Json(json!({ "cotizacion": quotation_json(&quotation) })).into_response()
        }
        Err(e) => lifecycle_error_response(&e),
    }
}

/// PATCH `/cotizaciones/{id}/activar-servicio` - Start service delivery.
async fn activate_service(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let lifecycle = QuotationLifecycle::new((*state.db).clone());
    match lifecycle.activate_service(id).await {
        Ok(quotation) => Json(json!({ "cotizacion": quotation_json(&quotation) })).into_response(),
        Err(e) => lifecycle_error_response(&e),
    }
}

/// PATCH `/cotizaciones/{id}/completar-servicio` - Complete the service.
async fn complete_service(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let lifecycle = QuotationLifecycle::new((*state.db).clone());
    match lifecycle.complete_service(id).await {
        Ok(quotation) => Json(json!({ "cotizacion": quotation_json(&quotation) })).into_response(),
        Err(e) => lifecycle_error_response(&e),
    }
}

/// POST `/cotizaciones/{id}/pagos` - Register a payment against a
/// financed quotation.
async fn register_payment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RegisterPaymentInput>,
) -> impl IntoResponse {
    let lifecycle = QuotationLifecycle::new((*state.db).clone());
    match lifecycle.register_payment(id, payload).await {
        Ok((quotation, payment)) => {
            info!(
                quotation_id = %id,
                payment_id = %payment.id,
                amount = %payment.amount,
                registered_by = %auth.user_id(),
                "Installment registered"
            );
            Json(json!({
                "cotizacion": quotation_json(&quotation),
                "pago": payment_json(&payment),
            }))
            .into_response()
        }
        Err(e) => lifecycle_error_response(&e),
    }
}

/// DELETE `/cotizaciones/{id}` - Delete a quotation whose service never
/// started, cascading to payments and statement.
async fn delete_quotation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let lifecycle = QuotationLifecycle::new((*state.db).clone());
    match lifecycle.delete(id).await {
        Ok(()) => {
            info!(quotation_id = %id, deleted_by = %auth.user_id(), "Quotation deleted");
            Json(json!({ "message": "Cotización eliminada" })).into_response()
        }
        Err(e) => lifecycle_error_response(&e),
    }
}

/// GET `/cotizaciones/{id}/pagos` - Payment history, oldest first.
async fn list_payments(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = QuotationRepository::new((*state.db).clone());
    if let Err(e) = repo.find_by_id(id).await {
        return quotation_repo_error_response(&e);
    }

    let ledger = PaymentLedger::new((*state.db).clone());
    match ledger.list_by_quotation(id).await {
        Ok(history) => Json(json!({
            "data": history.iter().map(payment_json).collect::<Vec<_>>(),
        }))
        .into_response(),
        Err(e) => payment_error_response(&e),
    }
}

/// GET `/cotizaciones/{id}/estado-cuenta` - The statement of a financed
/// quotation.
async fn get_statement(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let statements = StatementRepository::new((*state.db).clone());
    match statements.find_by_quotation(id).await {
        Ok(statement) => Json(statement_json(&statement)).into_response(),
        Err(e) => statement_error_response(&e),
    }
}
