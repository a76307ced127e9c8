use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro central. Cada handler devolve `AppError` e a conversão
// para HTTP acontece num lugar só, via `IntoResponse`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Usuário ou senha inválidos")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário desativado")]
    UserInactive,

    #[error("Acesso negado")]
    Forbidden,

    #[error("{0} não encontrado")]
    NotFound(String),

    // Regras de negócio que viram 400: o chamador monta a mensagem.
    #[error("{0}")]
    BusinessRule(String),

    // Saída maior que o saldo: a resposta informa quanto há disponível.
    #[error("Estoque insuficiente de '{name}'. Disponível: {available}")]
    InsufficientStock { name: String, available: Decimal },

    #[error("Transição de status inválida: {from} -> {to}")]
    InvalidStatusTransition { from: String, to: String },

    // Violações de unicidade viram 409.
    #[error("{0}")]
    Conflict(String),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado.
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Devolve todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Usuário ou senha inválidos.".to_string())
            }
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "Token de autenticação inválido ou ausente.".to_string(),
            ),
            AppError::UserInactive => {
                (StatusCode::UNAUTHORIZED, "Usuário desativado.".to_string())
            }
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "Você não tem permissão para realizar esta ação.".to_string(),
            ),
            AppError::NotFound(ref what) => {
                (StatusCode::NOT_FOUND, format!("{} não encontrado.", what))
            }
            AppError::BusinessRule(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::InsufficientStock { .. } => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            AppError::InvalidStatusTransition { .. } => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),

            // Todos os outros (DatabaseError, InternalServerError...) viram 500.
            // A mensagem detalhada vai para o log, nunca para o cliente.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Ocorreu um erro inesperado.".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_stock_names_available_amount() {
        let err = AppError::InsufficientStock {
            name: "Flash X".into(),
            available: Decimal::new(7, 0),
        };
        let msg = err.to_string();
        assert!(msg.contains("Flash X"));
        assert!(msg.contains('7'));
    }

    #[test]
    fn status_transition_message_names_both_states() {
        let err = AppError::InvalidStatusTransition {
            from: "entregue".into(),
            to: "em_reparo".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("entregue"));
        assert!(msg.contains("em_reparo"));
    }
}
