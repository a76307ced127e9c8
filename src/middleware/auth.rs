// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use crate::{
    common::error::AppError,
    config::AppState,
    models::auth::{User, UserRole},
};

// Valida o bearer token e recarrega o usuário do banco A CADA requisição:
// desativação e troca de papel valem imediatamente, não só no próximo login.
pub async fn auth_guard(
    State(app_state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: axum::extract::Request,
    next: Next,
) -> Result<Response, AppError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(AppError::InvalidToken)?;

    let user = app_state.auth_service.validate_token(bearer.token()).await?;

    // Insere o usuário nos "extensions" da requisição
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

// Deve ser aplicado DEPOIS do auth_guard: exige papel de administrador.
pub async fn admin_guard(
    request: axum::extract::Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<User>()
        .ok_or(AppError::InvalidToken)?;

    if user.role != UserRole::Admin {
        return Err(AppError::Forbidden);
    }

    Ok(next.run(request).await)
}

// Extrator para obter o usuário autenticado diretamente nos handlers
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<User>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or(AppError::InvalidToken)
    }
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.0.role == UserRole::Admin
    }

    /// Não-admins só podem agir sobre o próprio usuário.
    pub fn ensure_self_or_admin(&self, target: uuid::Uuid) -> Result<(), AppError> {
        if self.is_admin() || self.0.id == target {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn user_with_role(role: UserRole) -> AuthenticatedUser {
        AuthenticatedUser(User {
            id: Uuid::new_v4(),
            username: "teste".into(),
            password_hash: "x".into(),
            name: "Teste".into(),
            role,
            active: true,
            last_login: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
    }

    #[test]
    fn admin_can_act_on_anyone() {
        let admin = user_with_role(UserRole::Admin);
        assert!(admin.ensure_self_or_admin(Uuid::new_v4()).is_ok());
    }

    #[test]
    fn user_can_only_act_on_self() {
        let user = user_with_role(UserRole::User);
        let own_id = user.0.id;
        assert!(user.ensure_self_or_admin(own_id).is_ok());
        assert!(matches!(
            user.ensure_self_or_admin(Uuid::new_v4()),
            Err(AppError::Forbidden)
        ));
    }
}
