// src/handlers/equipment.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::equipment::{Equipment, EquipmentWithCategory},
};

// ---
// Validação customizada
// ---
pub(crate) fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

// ---
// Payload: CreateEquipment
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEquipmentPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    #[schema(example = "Flash Godox V860")]
    pub name: String,

    pub category_id: Uuid,

    #[validate(length(min = 1, message = "A unidade é obrigatória."))]
    #[schema(example = "un")]
    pub unit: String,

    // Estoque inicial opcional; sem ele o equipamento nasce zerado.
    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub initial_quantity: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub initial_cost: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub min_stock: Decimal,
}

// ---
// Payload: UpdateEquipment (só metadados; estoque muda via movimentações)
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEquipmentPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,

    pub category_id: Uuid,

    #[validate(length(min = 1, message = "A unidade é obrigatória."))]
    pub unit: String,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub min_stock: Decimal,
}

// GET /api/equipment
#[utoipa::path(
    get,
    path = "/api/equipment",
    tag = "Equipamentos",
    responses((status = 200, description = "Equipamentos ativos", body = Vec<EquipmentWithCategory>)),
    security(("api_jwt" = []))
)]
pub async fn list_equipment(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let items = app_state.equipment_service.list_active().await?;
    Ok(Json(items))
}

// GET /api/equipment/low-stock
#[utoipa::path(
    get,
    path = "/api/equipment/low-stock",
    tag = "Equipamentos",
    responses((status = 200, description = "Equipamentos no estoque mínimo ou abaixo", body = Vec<EquipmentWithCategory>)),
    security(("api_jwt" = []))
)]
pub async fn list_low_stock(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let items = app_state.equipment_service.list_low_stock().await?;
    Ok(Json(items))
}

// GET /api/equipment/{id}
#[utoipa::path(
    get,
    path = "/api/equipment/{id}",
    tag = "Equipamentos",
    responses(
        (status = 200, description = "Equipamento", body = Equipment),
        (status = 404, description = "Equipamento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_equipment(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let equipment = app_state.equipment_service.get(id).await?;
    Ok(Json(equipment))
}

// POST /api/equipment
#[utoipa::path(
    post,
    path = "/api/equipment",
    tag = "Equipamentos",
    request_body = CreateEquipmentPayload,
    responses((status = 201, description = "Equipamento criado", body = Equipment)),
    security(("api_jwt" = []))
)]
pub async fn create_equipment(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateEquipmentPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let equipment = app_state
        .equipment_service
        .create_equipment(
            &app_state.db_pool,
            &payload.name,
            payload.category_id,
            &payload.unit,
            payload.initial_quantity,
            payload.min_stock,
            payload.initial_cost,
            &user.0,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(equipment)))
}

// PUT /api/equipment/{id}
#[utoipa::path(
    put,
    path = "/api/equipment/{id}",
    tag = "Equipamentos",
    request_body = UpdateEquipmentPayload,
    responses(
        (status = 200, description = "Equipamento atualizado", body = Equipment),
        (status = 404, description = "Equipamento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_equipment(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateEquipmentPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let equipment = app_state
        .equipment_service
        .update_metadata(
            &app_state.db_pool,
            id,
            &payload.name,
            payload.category_id,
            &payload.unit,
            payload.min_stock,
        )
        .await?;

    Ok(Json(equipment))
}

// DELETE /api/equipment/{id}: exclusão lógica, com registro no livro-razão.
#[utoipa::path(
    delete,
    path = "/api/equipment/{id}",
    tag = "Equipamentos",
    responses(
        (status = 204, description = "Equipamento excluído"),
        (status = 404, description = "Equipamento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_equipment(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .equipment_service
        .excluir_equipamento(&app_state.db_pool, id, &user.0)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
