// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// Papel de acesso: o sistema só conhece dois níveis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    User,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::User => "user",
        }
    }
}

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    pub password_hash: String,

    pub name: String,
    pub role: UserRole,
    pub active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Dados para o bootstrap de primeiro acesso (cria o primeiro admin)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SetupPayload {
    #[validate(length(min = 3, message = "O usuário deve ter no mínimo 3 caracteres."))]
    pub username: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginPayload {
    #[validate(length(min = 1, message = "O usuário é obrigatório."))]
    pub username: String,
    #[validate(length(min = 1, message = "A senha é obrigatória."))]
    pub password: String,
}

// Resposta de autenticação com o token e o perfil do usuário
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID do usuário)
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)
}
