// src/handlers/composite_items.rs

use axum::{
    Json,
    extract::{Path, State},
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
    services::composite_service::NewComponent,
};

#[derive(Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ComponentPayload {
    pub equipment_id: Uuid,

    #[validate(custom(function = "validate_not_negative"))]
    pub quantity: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CompositeItemPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,

    pub category_id: Option<Uuid>,
    pub description: Option<String>,

    #[validate(
        length(min = 1, message = "O kit precisa de ao menos um componente."),
        nested
    )]
    pub components: Vec<ComponentPayload>,
}

impl CompositeItemPayload {
    fn components(&self) -> Vec<NewComponent> {
        self.components
            .iter()
            .map(|c| NewComponent {
                equipment_id: c.equipment_id,
                quantity: c.quantity,
            })
            .collect()
    }
}

// GET /api/composite-items. Cada kit já sai com a disponibilidade derivada.
pub async fn list_composite_items(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let items = app_state.composite_service.list_with_details().await?;
    Ok(Json(items))
}

// GET /api/composite-items/{id}
pub async fn get_composite_item(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let detail = app_state.composite_service.get_detail(id).await?;
    Ok(Json(detail))
}

// POST /api/composite-items
pub async fn create_composite_item(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CompositeItemPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let detail = app_state
        .composite_service
        .create(
            &app_state.db_pool,
            &payload.name,
            payload.category_id,
            payload.description.as_deref(),
            payload.components(),
            user.0.id,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(detail)))
}

// PUT /api/composite-items/{id}: substitui o conjunto de componentes inteiro.
pub async fn update_composite_item(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CompositeItemPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let detail = app_state
        .composite_service
        .update(
            &app_state.db_pool,
            id,
            &payload.name,
            payload.category_id,
            payload.description.as_deref(),
            payload.components(),
        )
        .await?;

    Ok(Json(detail))
}

// DELETE /api/composite-items/{id} (exclusão lógica)
pub async fn delete_composite_item(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.composite_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
