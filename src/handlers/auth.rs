// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::{AuthResponse, LoginPayload, SetupPayload},
};

// GET /api/auth/first-access
// Público: o frontend decide entre a tela de login e a de primeiro acesso.
#[utoipa::path(
    get,
    path = "/api/auth/first-access",
    tag = "Auth",
    responses(
        (status = 200, description = "Indica se o sistema ainda não tem usuários")
    )
)]
pub async fn first_access(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let has_any = app_state.auth_service.has_any_user().await?;
    Ok(Json(json!({ "firstAccess": !has_any })))
}

// POST /api/auth/setup
#[utoipa::path(
    post,
    path = "/api/auth/setup",
    tag = "Auth",
    request_body = SetupPayload,
    responses(
        (status = 201, description = "Primeiro administrador criado", body = AuthResponse),
        (status = 409, description = "O sistema já foi configurado")
    )
)]
pub async fn setup(
    State(app_state): State<AppState>,
    Json(payload): Json<SetupPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let (token, user) = app_state
        .auth_service
        .setup_first_user(&payload.username, &payload.password, &payload.name)
        .await?;

    tracing::info!("🔑 Primeiro acesso concluído: administrador '{}'", user.username);
    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Autenticado", body = AuthResponse),
        (status = 401, description = "Credenciais inválidas ou usuário desativado")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let (token, user) = app_state
        .auth_service
        .login(&payload.username, &payload.password)
        .await?;

    Ok(Json(AuthResponse { token, user }))
}

// GET /api/auth/me
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Usuário autenticado", body = crate::models::auth::User)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_me(user: AuthenticatedUser) -> impl IntoResponse {
    Json(user.0)
}
