// src/handlers/exit_orders.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    handlers::equipment::validate_not_negative,
    middleware::auth::AuthenticatedUser,
    models::exit_order::ExitOrderStatus,
    services::exit_order_service::NewExitOrderItem,
};

#[derive(Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateExitOrderItemPayload {
    pub equipment_id: Uuid,

    #[validate(custom(function = "validate_not_negative"))]
    pub quantity: Decimal,

    #[serde(default)]
    pub is_conditional: bool,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateExitOrderPayload {
    #[validate(length(min = 1, message = "O motivo é obrigatório."))]
    pub reason: String,

    pub destination: Option<String>,
    pub customer_id: Option<Uuid>,

    #[validate(
        length(min = 1, message = "A ordem precisa de ao menos um item."),
        nested
    )]
    pub items: Vec<CreateExitOrderItemPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelPayload {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemQuantityPayload {
    #[validate(custom(function = "validate_not_negative"))]
    pub quantity: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitOrderFilters {
    pub status: Option<ExitOrderStatus>,
}

// GET /api/exit-orders?status=
pub async fn list_orders(
    State(app_state): State<AppState>,
    Query(filters): Query<ExitOrderFilters>,
) -> Result<impl IntoResponse, AppError> {
    let orders = app_state.exit_order_service.list(filters.status).await?;
    Ok(Json(orders))
}

// GET /api/exit-orders/{id}
pub async fn get_order(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let detail = app_state.exit_order_service.get_detail(id).await?;
    Ok(Json(detail))
}

// POST /api/exit-orders. Tudo ou nada: um item sem saldo cancela a criação.
pub async fn create_order(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateExitOrderPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let items: Vec<NewExitOrderItem> = payload
        .items
        .iter()
        .map(|i| NewExitOrderItem {
            equipment_id: i.equipment_id,
            quantity: i.quantity,
            is_conditional: i.is_conditional,
        })
        .collect();

    let detail = app_state
        .exit_order_service
        .create_order(
            &app_state.db_pool,
            &payload.reason,
            payload.destination.as_deref(),
            payload.customer_id,
            items,
            &user.0,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(detail)))
}

// POST /api/exit-orders/{id}/cancel
pub async fn cancel_order(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CancelPayload>,
) -> Result<impl IntoResponse, AppError> {
    let detail = app_state
        .exit_order_service
        .cancel_order(&app_state.db_pool, id, payload.reason.as_deref(), &user.0)
        .await?;
    Ok(Json(detail))
}

// PUT /api/exit-orders/{id}/items/{item_id}
pub async fn update_item_quantity(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateItemQuantityPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let item = app_state
        .exit_order_service
        .update_item_quantity(&app_state.db_pool, id, item_id, payload.quantity, &user.0)
        .await?;
    Ok(Json(item))
}

// DELETE /api/exit-orders/{id}/items/{item_id}
pub async fn delete_item(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .exit_order_service
        .remove_item(&app_state.db_pool, id, item_id, &user.0)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// PATCH /api/exit-orders/{id}/items/{item_id}/conditional
pub async fn toggle_item_conditional(
    State(app_state): State<AppState>,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let item = app_state
        .exit_order_service
        .toggle_item_conditional(&app_state.db_pool, id, item_id)
        .await?;
    Ok(Json(item))
}

// GET /api/exit-orders/{id}/items/{item_id}/history
pub async fn item_history(
    State(app_state): State<AppState>,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let history = app_state.exit_order_service.item_history(id, item_id).await?;
    Ok(Json(history))
}
