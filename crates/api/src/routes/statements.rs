//! Account statement routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, patch},
};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::routes::{statement_error_response, statement_json};
use crate::{AppState, middleware::AuthUser};
use cotiza_db::StatementRepository;

/// Creates the statements router (auth middleware applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/estados-cuenta/{id}", get(get_statement))
        .route(
            "/estados-cuenta/{id}/recalcular-mora",
            patch(recalculate_arrears),
        )
}

/// GET `/estados-cuenta/{id}` - Fetch one account statement.
async fn get_statement(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = StatementRepository::new((*state.db).clone());
    match repo.find_by_id(id).await {
        Ok(statement) => Json(statement_json(&statement)).into_response(),
        Err(e) => statement_error_response(&e),
    }
}

/// PATCH `/estados-cuenta/{id}/recalcular-mora` - Recompute days in
/// arrears and moratory interest as of today.
async fn recalculate_arrears(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = StatementRepository::new((*state.db).clone());
    match repo.recalculate_arrears(id, Utc::now().date_naive()).await {
        Ok(statement) => {
            info!(
                statement_id = %id,
                days_in_arrears = statement.days_in_arrears,
                "Arrears recalculated"
            );
            Json(statement_json(&statement)).into_response()
        }
        Err(e) => statement_error_response(&e),
    }
}
