// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{TransactionRepository, UserRepository},
    models::{
        auth::{Claims, User, UserRole},
        equipment::TransactionType,
    },
};

// bcrypt é pesado de propósito: roda fora do event loop.
pub(crate) async fn hash_password(password: String) -> Result<String, AppError> {
    let hashed = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

pub(crate) async fn verify_password(password: String, password_hash: String) -> Result<bool, AppError> {
    let is_valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;
    Ok(is_valid)
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    transaction_repo: TransactionRepository,
    jwt_secret: String,
    pool: PgPool,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        transaction_repo: TransactionRepository,
        jwt_secret: String,
        pool: PgPool,
    ) -> Self {
        Self {
            user_repo,
            transaction_repo,
            jwt_secret,
            pool,
        }
    }

    /// Existe algum usuário cadastrado? (Decide se o frontend mostra a tela
    /// de primeiro acesso.)
    pub async fn has_any_user(&self) -> Result<bool, AppError> {
        let count = self.user_repo.count(&self.pool).await?;
        Ok(count > 0)
    }

    /// Bootstrap de primeiro acesso: o PRIMEIRO usuário nasce admin.
    /// Depois disso a rota fica permanentemente fechada.
    pub async fn setup_first_user(
        &self,
        username: &str,
        password: &str,
        name: &str,
    ) -> Result<(String, User), AppError> {
        let hashed_password = hash_password(password.to_owned()).await?;

        let mut tx = self.pool.begin().await?;

        // A contagem roda dentro da transação para fechar a janela entre
        // dois bootstraps simultâneos.
        let count = self.user_repo.count(&mut *tx).await?;
        if count > 0 {
            return Err(AppError::Conflict("O sistema já foi configurado.".into()));
        }

        let new_user = self
            .user_repo
            .create(&mut *tx, username, &hashed_password, name, UserRole::Admin)
            .await?;

        self.transaction_repo
            .record(
                &mut *tx,
                None,
                None,
                TransactionType::UsuarioCriado,
                None,
                None,
                None,
                Some("Primeiro acesso: administrador criado"),
                None,
                Some(new_user.id),
                Some(&new_user.name),
            )
            .await?;

        tx.commit().await?;

        let token = self.create_token(new_user.id)?;
        Ok((token, new_user))
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<(String, User), AppError> {
        let user = self
            .user_repo
            .find_by_username(username)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let is_valid = verify_password(password.to_owned(), user.password_hash.clone()).await?;
        if !is_valid {
            return Err(AppError::InvalidCredentials);
        }

        if !user.active {
            return Err(AppError::UserInactive);
        }

        self.user_repo.touch_last_login(user.id).await?;

        let token = self.create_token(user.id)?;
        Ok((token, user))
    }

    /// Decodifica o token e RECARREGA o usuário do banco: desativação e
    /// troca de papel valem na requisição seguinte, não no próximo login.
    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let claims = self.decode_claims(token)?;

        let user = self
            .user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?;

        if !user.active {
            return Err(AppError::UserInactive);
        }

        Ok(user)
    }

    pub fn decode_claims(&self, token: &str) -> Result<Claims, AppError> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &validation,
        )
        .map_err(|_| AppError::InvalidToken)?;
        Ok(token_data.claims)
    }

    fn create_token(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(7);

        let claims = Claims {
            sub: user_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{TransactionRepository, UserRepository};
    use sqlx::postgres::PgPoolOptions;

    // Pool preguiçosa: nunca conecta de fato; serve só para construir o
    // service nos testes que não tocam o banco.
    fn service() -> AuthService {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/fotostock_test")
            .unwrap();
        AuthService::new(
            UserRepository::new(pool.clone()),
            TransactionRepository::new(pool.clone()),
            "segredo-de-teste".to_string(),
            pool,
        )
    }

    #[tokio::test]
    async fn token_roundtrip_preserves_the_subject() {
        let service = service();
        let user_id = Uuid::new_v4();

        let token = service.create_token(user_id).unwrap();
        let claims = service.decode_claims(&token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert!(claims.exp > claims.iat);
    }

    #[tokio::test]
    async fn token_signed_with_another_secret_is_rejected() {
        let service = service();
        let other = AuthService::new(
            UserRepository::new(service.pool.clone()),
            TransactionRepository::new(service.pool.clone()),
            "outro-segredo".to_string(),
            service.pool.clone(),
        );

        let token = other.create_token(Uuid::new_v4()).unwrap();
        assert!(matches!(
            service.decode_claims(&token),
            Err(AppError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let service = service();
        assert!(matches!(
            service.decode_claims("nao-e-um-jwt"),
            Err(AppError::InvalidToken)
        ));
    }
}
