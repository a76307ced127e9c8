// src/handlers/users.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::UserRole,
};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
    #[validate(length(min = 3, message = "O usuário deve ter no mínimo 3 caracteres."))]
    pub username: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    pub role: UserRole,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserPayload {
    #[validate(length(min = 3, message = "O usuário deve ter no mínimo 3 caracteres."))]
    pub username: String,
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    // Opcional: só troca a senha se vier preenchida.
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRolePayload {
    pub role: UserRole,
}

// GET /api/users (admin)
pub async fn list_users(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let users = app_state.user_service.list().await?;
    Ok(Json(users))
}

// POST /api/users (admin)
pub async fn create_user(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let created = app_state
        .user_service
        .create_user(
            &payload.username,
            &payload.password,
            &payload.name,
            payload.role,
            &user.0,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

// PUT /api/users/{id}: o próprio usuário ou um admin.
pub async fn update_user(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    user.ensure_self_or_admin(id)?;

    let updated = app_state
        .user_service
        .update_profile(id, &payload.name, &payload.username, payload.password.as_deref())
        .await?;

    Ok(Json(updated))
}

// PATCH /api/users/{id}/role (admin; nunca sobre si mesmo)
pub async fn change_role(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangeRolePayload>,
) -> Result<impl IntoResponse, AppError> {
    let updated = app_state
        .user_service
        .change_role(id, payload.role, &user.0)
        .await?;
    Ok(Json(updated))
}

// PATCH /api/users/{id}/deactivate (admin; nunca sobre si mesmo)
pub async fn deactivate_user(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let updated = app_state.user_service.set_active(id, false, &user.0).await?;
    Ok(Json(updated))
}

// PATCH /api/users/{id}/reactivate (admin)
pub async fn reactivate_user(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let updated = app_state.user_service.set_active(id, true, &user.0).await?;
    Ok(Json(updated))
}
