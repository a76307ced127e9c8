// src/db/category_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::category::Category};

#[derive(Clone)]
pub struct CategoryRepository {
    pool: PgPool,
}

impl CategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_all(&self) -> Result<Vec<Category>, AppError> {
        let categories =
            sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name ASC")
                .fetch_all(&self.pool)
                .await?;
        Ok(categories)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, AppError> {
        let maybe = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        name: &str,
        slug: &str,
        icon: Option<&str>,
    ) -> Result<Category, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name, slug, icon)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(slug)
        .bind(icon)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::Conflict(format!("A categoria '{}' já existe.", slug));
                }
            }
            e.into()
        })
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        name: &str,
        slug: &str,
        icon: Option<&str>,
    ) -> Result<Category, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
            SET name = $2, slug = $3, icon = $4, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(slug)
        .bind(icon)
        .fetch_optional(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::Conflict(format!("A categoria '{}' já existe.", slug));
                }
            }
            AppError::from(e)
        })?
        .ok_or_else(|| AppError::NotFound("Categoria".into()))
    }

    // Quantos equipamentos (ativos ou não) ainda apontam para a categoria.
    pub async fn count_equipment<'e, E>(&self, executor: E, id: Uuid) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM equipment WHERE category_id = $1")
                .bind(id)
                .fetch_one(executor)
                .await?;
        Ok(count)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Categoria".into()));
        }
        Ok(())
    }
}
