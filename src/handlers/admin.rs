// src/handlers/admin.rs

use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;

use crate::{common::error::AppError, config::AppState, middleware::auth::AuthenticatedUser};

// POST /api/admin/reset-movements (admin)
// Destrutivo: apaga o livro-razão inteiro e deixa só o marcador do reset.
pub async fn reset_movements(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let removed = app_state
        .equipment_service
        .reset_movements(&app_state.db_pool, &user.0)
        .await?;

    Ok(Json(json!({
        "message": "Histórico de movimentações zerado.",
        "removed": removed,
    })))
}
