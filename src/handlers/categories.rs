// src/handlers/categories.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError, config::AppState, middleware::auth::AuthenticatedUser,
    models::category::Category,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    #[schema(example = "Lentes")]
    pub name: String,

    #[validate(length(min = 1, message = "O slug é obrigatório."))]
    #[schema(example = "lentes")]
    pub slug: String,

    #[schema(example = "camera-lens")]
    pub icon: Option<String>,
}

// GET /api/categories
#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "Categorias",
    responses((status = 200, description = "Lista de categorias", body = Vec<Category>)),
    security(("api_jwt" = []))
)]
pub async fn list_categories(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let categories = app_state.equipment_service.list_categories().await?;
    Ok(Json(categories))
}

// POST /api/categories
#[utoipa::path(
    post,
    path = "/api/categories",
    tag = "Categorias",
    request_body = CategoryPayload,
    responses(
        (status = 201, description = "Categoria criada", body = Category),
        (status = 409, description = "Slug já em uso")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_category(
    State(app_state): State<AppState>,
    Json(payload): Json<CategoryPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let category = app_state
        .equipment_service
        .create_category(
            &app_state.db_pool,
            &payload.name,
            &payload.slug,
            payload.icon.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(category)))
}

// PUT /api/categories/{id}
#[utoipa::path(
    put,
    path = "/api/categories/{id}",
    tag = "Categorias",
    request_body = CategoryPayload,
    responses(
        (status = 200, description = "Categoria atualizada", body = Category),
        (status = 404, description = "Categoria não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_category(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CategoryPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let category = app_state
        .equipment_service
        .update_category(
            &app_state.db_pool,
            id,
            &payload.name,
            &payload.slug,
            payload.icon.as_deref(),
        )
        .await?;

    Ok(Json(category))
}

// DELETE /api/categories/{id} (admin)
#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    tag = "Categorias",
    responses(
        (status = 204, description = "Categoria removida"),
        (status = 409, description = "Categoria ainda referenciada por equipamentos")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_category(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    // Remoção de dado de referência é tarefa de administrador.
    if !user.is_admin() {
        return Err(AppError::Forbidden);
    }

    app_state
        .equipment_service
        .delete_category(&app_state.db_pool, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
