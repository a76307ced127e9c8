// src/services/user_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{TransactionRepository, UserRepository},
    models::{
        auth::{User, UserRole},
        equipment::TransactionType,
    },
    services::auth::hash_password,
};

// Gestão administrativa de usuários. Criação, desativação e troca de papel
// deixam rastro no livro-razão; usuários nunca são removidos fisicamente.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    transaction_repo: TransactionRepository,
    pool: PgPool,
}

impl UserService {
    pub fn new(user_repo: UserRepository, transaction_repo: TransactionRepository, pool: PgPool) -> Self {
        Self {
            user_repo,
            transaction_repo,
            pool,
        }
    }

    pub async fn list(&self) -> Result<Vec<User>, AppError> {
        self.user_repo.list_all().await
    }

    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        name: &str,
        role: UserRole,
        acting: &User,
    ) -> Result<User, AppError> {
        let hashed_password = hash_password(password.to_owned()).await?;

        let mut tx = self.pool.begin().await?;

        let new_user = self
            .user_repo
            .create(&mut *tx, username, &hashed_password, name, role)
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
                Some(&format!("Usuário '{}' criado por {}", new_user.username, acting.name)),
                None,
                Some(acting.id),
                Some(&acting.name),
            )
            .await?;

        tx.commit().await?;
        Ok(new_user)
    }

    /// Atualiza nome/username e, se enviada, a senha. A permissão
    /// (o próprio usuário ou um admin) já foi checada no handler.
    pub async fn update_profile(
        &self,
        id: Uuid,
        name: &str,
        username: &str,
        password: Option<&str>,
    ) -> Result<User, AppError> {
        let hashed = match password {
            Some(p) => Some(hash_password(p.to_owned()).await?),
            None => None,
        };

        let mut tx = self.pool.begin().await?;

        let user = self
            .user_repo
            .update_profile(&mut *tx, id, name, username)
            .await?;

        if let Some(hashed) = hashed {
            self.user_repo.update_password(&mut *tx, id, &hashed).await?;
        }

        tx.commit().await?;
        Ok(user)
    }

    pub async fn change_role(
        &self,
        id: Uuid,
        new_role: UserRole,
        acting: &User,
    ) -> Result<User, AppError> {
        if acting.id == id {
            return Err(AppError::BusinessRule(
                "Você não pode alterar o próprio papel.".into(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let before = self
            .user_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Usuário".into()))?;

        let updated = self.user_repo.set_role(&mut *tx, id, new_role).await?;

        self.transaction_repo
            .record(
                &mut *tx,
                None,
                None,
                TransactionType::RoleAlterada,
                None,
                None,
                None,
                Some(&format!(
                    "Papel de '{}' alterado de {} para {}",
                    updated.username,
                    before.role.as_str(),
                    new_role.as_str()
                )),
                None,
                Some(acting.id),
                Some(&acting.name),
            )
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    pub async fn set_active(&self, id: Uuid, active: bool, acting: &User) -> Result<User, AppError> {
        if acting.id == id {
            return Err(AppError::BusinessRule(
                "Você não pode desativar o próprio usuário.".into(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let updated = self.user_repo.set_active(&mut *tx, id, active).await?;

        let (event, verb) = if active {
            (TransactionType::UsuarioReativado, "reativado")
        } else {
            (TransactionType::UsuarioDesativado, "desativado")
        };
        self.transaction_repo
            .record(
                &mut *tx,
                None,
                None,
                event,
                None,
                None,
                None,
                Some(&format!("Usuário '{}' {} por {}", updated.username, verb, acting.name)),
                None,
                Some(acting.id),
                Some(&acting.name),
            )
            .await?;

        tx.commit().await?;
        Ok(updated)
    }
}
