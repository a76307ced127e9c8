// src/db/equipment_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::equipment::{Equipment, EquipmentWithCategory},
};

#[derive(Clone)]
pub struct EquipmentRepository {
    pool: PgPool,
}

impl EquipmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Leituras
    // ---

    pub async fn list_active(&self) -> Result<Vec<EquipmentWithCategory>, AppError> {
        let items = sqlx::query_as::<_, EquipmentWithCategory>(
            r#"
            SELECT e.*, c.name AS category_name, c.slug AS category_slug
            FROM equipment e
            JOIN categories c ON c.id = e.category_id
            WHERE e.active = TRUE
            ORDER BY e.name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub async fn list_low_stock(&self) -> Result<Vec<EquipmentWithCategory>, AppError> {
        let items = sqlx::query_as::<_, EquipmentWithCategory>(
            r#"
            SELECT e.*, c.name AS category_name, c.slug AS category_slug
            FROM equipment e
            JOIN categories c ON c.id = e.category_id
            WHERE e.active = TRUE AND e.quantity <= e.min_stock
            ORDER BY e.name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Equipment>, AppError> {
        let maybe = sqlx::query_as::<_, Equipment>("SELECT * FROM equipment WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe)
    }

    // Trava a linha do equipamento até o fim da transação: é isso que
    // serializa duas saídas concorrentes sobre o mesmo item.
    pub async fn find_by_id_for_update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<Equipment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let maybe =
            sqlx::query_as::<_, Equipment>("SELECT * FROM equipment WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(executor)
                .await?;
        Ok(maybe)
    }

    // ---
    // Escritas (transacionais)
    // ---

    pub async fn create<'e, E>(
        &self,
        executor: E,
        name: &str,
        category_id: Uuid,
        unit: &str,
        quantity: Decimal,
        min_stock: Decimal,
        cost: Decimal,
        total_value: Decimal,
    ) -> Result<Equipment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let equipment = sqlx::query_as::<_, Equipment>(
            r#"
            INSERT INTO equipment
                (name, category_id, unit, quantity, min_stock, avg_cost, current_cost, total_value)
            VALUES ($1, $2, $3, $4, $5, $6, $6, $7)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(category_id)
        .bind(unit)
        .bind(quantity)
        .bind(min_stock)
        .bind(cost)
        .bind(total_value)
        .fetch_one(executor)
        .await?;
        Ok(equipment)
    }

    pub async fn update_metadata<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        name: &str,
        category_id: Uuid,
        unit: &str,
        min_stock: Decimal,
    ) -> Result<Equipment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Equipment>(
            r#"
            UPDATE equipment
            SET name = $2, category_id = $3, unit = $4, min_stock = $5, updated_at = now()
            WHERE id = $1 AND active = TRUE
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(category_id)
        .bind(unit)
        .bind(min_stock)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::NotFound("Equipamento".into()))
    }

    /// Grava o novo saldo e os custos recalculados. Deve rodar na mesma
    /// transação do `find_by_id_for_update` que leu a linha.
    pub async fn apply_stock_change<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        quantity: Decimal,
        cost: Decimal,
        total_value: Decimal,
    ) -> Result<Equipment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Equipment>(
            r#"
            UPDATE equipment
            SET quantity = $2, avg_cost = $3, current_cost = $3, total_value = $4,
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(quantity)
        .bind(cost)
        .bind(total_value)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::NotFound("Equipamento".into()))
    }

    pub async fn soft_delete<'e, E>(&self, executor: E, id: Uuid) -> Result<Equipment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Equipment>(
            r#"
            UPDATE equipment
            SET active = FALSE, updated_at = now()
            WHERE id = $1 AND active = TRUE
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::NotFound("Equipamento".into()))
    }
}
