//! Payment correction routes.
//!
//! Cash payments are immutable; edits and deletions only apply to
//! advance and installment rows, and the ledger re-applies the balance
//! delta in the same transaction.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{delete, patch},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::routes::{payment_error_response, payment_json};
use crate::{AppState, middleware::AuthUser};
use cotiza_core::payment::PaymentMethod;
use cotiza_db::{PaymentLedger, UpdatePaymentInput};

/// Creates the payments router (auth middleware applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/pagos/{id}", patch(update_payment))
        .route("/pagos/{id}", delete(delete_payment))
}

/// Request body for updating a payment.
#[derive(Debug, Deserialize)]
struct UpdatePaymentRequest {
    monto: Option<Decimal>,
    metodo_pago: Option<PaymentMethod>,
    notas: Option<String>,
}

/// PATCH `/pagos/{id}` - Correct a payment's amount, method, or notes.
async fn update_payment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePaymentRequest>,
) -> impl IntoResponse {
    let ledger = PaymentLedger::new((*state.db).clone());
    let input = UpdatePaymentInput {
        amount: payload.monto,
        method: payload.metodo_pago,
        notes: payload.notas,
    };

    match ledger.update_payment(id, input).await {
        Ok(payment) => {
            info!(payment_id = %id, updated_by = %auth.user_id(), "Payment updated");
            Json(json!({ "pago": payment_json(&payment) })).into_response()
        }
        Err(e) => payment_error_response(&e),
    }
}

/// DELETE `/pagos/{id}` - Remove a payment, restoring its amount to the
/// outstanding balance.
async fn delete_payment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let ledger = PaymentLedger::new((*state.db).clone());
    match ledger.delete_payment(id).await {
        Ok(()) => {
            info!(payment_id = %id, deleted_by = %auth.user_id(), "Payment deleted");
            Json(json!({ "message": "Pago eliminado" })).into_response()
        }
        Err(e) => payment_error_response(&e),
    }
}
