// src/db/composite_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::composite::{CompositeComponentDetail, CompositeItem},
};

#[derive(Clone)]
pub struct CompositeRepository {
    pool: PgPool,
}

impl CompositeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_active(&self) -> Result<Vec<CompositeItem>, AppError> {
        let items = sqlx::query_as::<_, CompositeItem>(
            "SELECT * FROM composite_items WHERE active = TRUE ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<CompositeItem>, AppError> {
        let maybe =
            sqlx::query_as::<_, CompositeItem>("SELECT * FROM composite_items WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(maybe)
    }

    // Componentes + saldo atual de cada equipamento, na ordem de cadastro.
    // É a única leitura de que a disponibilidade derivada precisa.
    pub async fn list_components<'e, E>(
        &self,
        executor: E,
        composite_id: Uuid,
    ) -> Result<Vec<CompositeComponentDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let components = sqlx::query_as::<_, CompositeComponentDetail>(
            r#"
            SELECT cc.id, cc.composite_id, cc.equipment_id,
                   e.name AS equipment_name, e.unit AS equipment_unit,
                   e.quantity AS equipment_quantity,
                   cc.quantity
            FROM composite_item_components cc
            JOIN equipment e ON e.id = cc.equipment_id
            WHERE cc.composite_id = $1
            ORDER BY cc.created_at ASC
            "#,
        )
        .bind(composite_id)
        .fetch_all(executor)
        .await?;
        Ok(components)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        name: &str,
        category_id: Option<Uuid>,
        description: Option<&str>,
        created_by: Uuid,
    ) -> Result<CompositeItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, CompositeItem>(
            r#"
            INSERT INTO composite_items (name, category_id, description, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(category_id)
        .bind(description)
        .bind(created_by)
        .fetch_one(executor)
        .await?;
        Ok(item)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        name: &str,
        category_id: Option<Uuid>,
        description: Option<&str>,
    ) -> Result<CompositeItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, CompositeItem>(
            r#"
            UPDATE composite_items
            SET name = $2, category_id = $3, description = $4, updated_at = now()
            WHERE id = $1 AND active = TRUE
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(category_id)
        .bind(description)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::NotFound("Item composto".into()))
    }

    pub async fn insert_component<'e, E>(
        &self,
        executor: E,
        composite_id: Uuid,
        equipment_id: Uuid,
        quantity: Decimal,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO composite_item_components (composite_id, equipment_id, quantity)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(composite_id)
        .bind(equipment_id)
        .bind(quantity)
        .execute(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::BusinessRule(
                        "O mesmo equipamento não pode entrar duas vezes no kit.".into(),
                    );
                }
            }
            e.into()
        })?;
        Ok(())
    }

    // A troca de componentes é sempre apaga-e-reinsere o conjunto inteiro.
    pub async fn delete_components<'e, E>(
        &self,
        executor: E,
        composite_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM composite_item_components WHERE composite_id = $1")
            .bind(composite_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn soft_delete<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE composite_items SET active = FALSE, updated_at = now() WHERE id = $1 AND active = TRUE",
        )
        .bind(id)
        .execute(executor)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Item composto".into()));
        }
        Ok(())
    }
}
