// src/handlers/service_orders.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    db::service_order_repo::ServiceOrderData,
    handlers::equipment::validate_not_negative,
    middleware::auth::AuthenticatedUser,
    models::service_order::ServiceOrderStatus,
};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOrderPayload {
    pub customer_id: Option<Uuid>,

    #[validate(length(min = 1, message = "A descrição do equipamento é obrigatória."))]
    pub equipamento: String,

    pub marca: Option<String>,
    pub modelo: Option<String>,
    pub numero_serie: Option<String>,
    pub acessorios: Option<String>,
    pub defeito_relatado: Option<String>,
    pub defeito_constatado: Option<String>,
    pub observacoes: Option<String>,
    pub tecnico_id: Option<Uuid>,

    #[validate(custom(function = "validate_not_negative"))]
    pub valor_orcamento: Option<Decimal>,

    #[validate(custom(function = "validate_not_negative"))]
    pub valor_final: Option<Decimal>,

    #[serde(default = "default_garantia")]
    pub garantia_dias: i32,
}

fn default_garantia() -> i32 {
    90
}

impl ServiceOrderPayload {
    fn as_data(&self) -> ServiceOrderData<'_> {
        ServiceOrderData {
            customer_id: self.customer_id,
            equipamento: &self.equipamento,
            marca: self.marca.as_deref(),
            modelo: self.modelo.as_deref(),
            numero_serie: self.numero_serie.as_deref(),
            acessorios: self.acessorios.as_deref(),
            defeito_relatado: self.defeito_relatado.as_deref(),
            defeito_constatado: self.defeito_constatado.as_deref(),
            observacoes: self.observacoes.as_deref(),
            tecnico_id: self.tecnico_id,
            valor_orcamento: self.valor_orcamento,
            valor_final: self.valor_final,
            garantia_dias: self.garantia_dias,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeStatusPayload {
    pub status: ServiceOrderStatus,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOrderItemPayload {
    // Presente = a peça sai do estoque e entra no livro-razão.
    pub equipment_id: Option<Uuid>,

    #[validate(length(min = 1, message = "A descrição da peça é obrigatória."))]
    pub descricao: String,

    #[validate(custom(function = "validate_not_negative"))]
    pub quantidade: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub valor_unitario: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    #[validate(custom(function = "validate_not_negative"))]
    pub valor: Decimal,

    #[validate(length(min = 1, message = "A forma de pagamento é obrigatória."))]
    pub forma_pagamento: String,

    pub observacoes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOrderFilters {
    pub status: Option<ServiceOrderStatus>,
}

// GET /api/service-orders?status=
pub async fn list_orders(
    State(app_state): State<AppState>,
    Query(filters): Query<ServiceOrderFilters>,
) -> Result<impl IntoResponse, AppError> {
    let orders = app_state.service_order_service.list(filters.status).await?;
    Ok(Json(orders))
}

// GET /api/service-orders/{id}
pub async fn get_order(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let detail = app_state.service_order_service.get_detail(id).await?;
    Ok(Json(detail))
}

// POST /api/service-orders
pub async fn create_order(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<ServiceOrderPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let detail = app_state
        .service_order_service
        .create(&app_state.db_pool, &payload.as_data(), &user.0)
        .await?;

    Ok((StatusCode::CREATED, Json(detail)))
}

// PUT /api/service-orders/{id}
pub async fn update_order(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ServiceOrderPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let detail = app_state
        .service_order_service
        .update(&app_state.db_pool, id, &payload.as_data(), &user.0)
        .await?;

    Ok(Json(detail))
}

// PATCH /api/service-orders/{id}/status
pub async fn change_status(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangeStatusPayload>,
) -> Result<impl IntoResponse, AppError> {
    let detail = app_state
        .service_order_service
        .change_status(&app_state.db_pool, id, payload.status, &user.0)
        .await?;
    Ok(Json(detail))
}

// POST /api/service-orders/{id}/items
pub async fn add_item(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ServiceOrderItemPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let item = app_state
        .service_order_service
        .add_item(
            &app_state.db_pool,
            id,
            payload.equipment_id,
            &payload.descricao,
            payload.quantidade,
            payload.valor_unitario,
            &user.0,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(item)))
}

// POST /api/service-orders/{id}/payments
pub async fn add_payment(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<PaymentPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let payment = app_state
        .service_order_service
        .add_payment(
            &app_state.db_pool,
            id,
            payload.valor,
            &payload.forma_pagamento,
            payload.observacoes.as_deref(),
            &user.0,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(payment)))
}

// GET /api/service-orders/{id}/history
pub async fn history(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let entries = app_state.service_order_service.history(id).await?;
    Ok(Json(entries))
}
