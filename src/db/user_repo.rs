// src/db/user_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::auth::{User, UserRole},
};

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let maybe_user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_user)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let maybe_user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_user)
    }

    pub async fn list_all(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    // Usado pelo bootstrap de primeiro acesso.
    pub async fn count<'e, E>(&self, executor: E) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(executor)
            .await?;
        Ok(count)
    }

    // Cria um novo usuário, com tratamento específico para username duplicado.
    pub async fn create<'e, E>(
        &self,
        executor: E,
        username: &str,
        password_hash: &str,
        name: &str,
        role: UserRole,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash, name, role)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(name)
        .bind(role)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::Conflict(format!(
                        "O usuário '{}' já está em uso.",
                        username
                    ));
                }
            }
            e.into()
        })
    }

    pub async fn update_profile<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        name: &str,
        username: &str,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = $2, username = $3, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(username)
        .fetch_optional(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::Conflict(format!(
                        "O usuário '{}' já está em uso.",
                        username
                    ));
                }
            }
            AppError::from(e)
        })?
        .ok_or_else(|| AppError::NotFound("Usuário".into()))
    }

    pub async fn update_password<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        password_hash: &str,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(executor)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Usuário".into()));
        }
        Ok(())
    }

    pub async fn set_role<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        role: UserRole,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, User>(
            "UPDATE users SET role = $2, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(role)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::NotFound("Usuário".into()))
    }

    // Desativação é sempre lógica: usuários nunca são removidos fisicamente.
    pub async fn set_active<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        active: bool,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, User>(
            "UPDATE users SET active = $2, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(active)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::NotFound("Usuário".into()))
    }

    pub async fn touch_last_login(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET last_login = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
