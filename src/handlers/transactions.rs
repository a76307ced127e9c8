// src/handlers/transactions.rs

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    handlers::equipment::validate_not_negative,
    middleware::auth::AuthenticatedUser,
    models::equipment::TransactionType,
};

// --- DTO: Entrada de Estoque ---
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EntradaPayload {
    pub equipment_id: Uuid,

    #[validate(custom(function = "validate_not_negative"))]
    pub quantity: Decimal,

    // Quanto foi pago por unidade; alimenta o custo médio ponderado.
    #[validate(custom(function = "validate_not_negative"))]
    pub unit_cost: Decimal,

    pub reason: Option<String>,
    pub notes: Option<String>,
}

// --- DTO: Saída de Estoque ---
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaidaPayload {
    pub equipment_id: Uuid,

    #[validate(custom(function = "validate_not_negative"))]
    pub quantity: Decimal,

    pub reason: Option<String>,
    pub notes: Option<String>,
}

// --- Filtros da listagem ---
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilters {
    pub equipment_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

// POST /api/transactions/entrada
pub async fn registrar_entrada(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<EntradaPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let equipment = app_state
        .equipment_service
        .registrar_entrada(
            &app_state.db_pool,
            payload.equipment_id,
            payload.quantity,
            Some(payload.unit_cost),
            payload.reason.as_deref(),
            payload.notes.as_deref(),
            &user.0,
        )
        .await?;

    // Devolve o equipamento atualizado para o frontend redesenhar o saldo.
    Ok((StatusCode::CREATED, Json(equipment)))
}

// POST /api/transactions/saida
pub async fn registrar_saida(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<SaidaPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let equipment = app_state
        .equipment_service
        .registrar_saida(
            &app_state.db_pool,
            payload.equipment_id,
            payload.quantity,
            payload.reason.as_deref(),
            payload.notes.as_deref(),
            &user.0,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(equipment)))
}

// GET /api/transactions?equipmentId=&type=&from=&to=&limit=
pub async fn list_transactions(
    State(app_state): State<AppState>,
    Query(filters): Query<TransactionFilters>,
) -> Result<impl IntoResponse, AppError> {
    let transactions = app_state
        .equipment_service
        .list_transactions(
            filters.equipment_id,
            filters.transaction_type,
            filters.from,
            filters.to,
            filters.limit.unwrap_or(500).clamp(1, 2000),
        )
        .await?;
    Ok(Json(transactions))
}
