// src/db/exit_order_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::exit_order::{ExitOrder, ExitOrderItem, ExitOrderItemHistory, ExitOrderStatus},
};

#[derive(Clone)]
pub struct ExitOrderRepository {
    pool: PgPool,
}

impl ExitOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Leituras
    // ---

    pub async fn list(&self, status: Option<ExitOrderStatus>) -> Result<Vec<ExitOrder>, AppError> {
        let orders = sqlx::query_as::<_, ExitOrder>(
            r#"
            SELECT * FROM exit_orders
            WHERE ($1::exit_order_status IS NULL OR status = $1)
            ORDER BY order_number DESC
            "#,
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ExitOrder>, AppError> {
        let maybe = sqlx::query_as::<_, ExitOrder>("SELECT * FROM exit_orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe)
    }

    // Trava o cabeçalho da ordem: impede cancelar e editar item ao mesmo tempo.
    pub async fn find_by_id_for_update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<ExitOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let maybe =
            sqlx::query_as::<_, ExitOrder>("SELECT * FROM exit_orders WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(executor)
                .await?;
        Ok(maybe)
    }

    pub async fn list_items<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
    ) -> Result<Vec<ExitOrderItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, ExitOrderItem>(
            "SELECT * FROM exit_order_items WHERE order_id = $1 ORDER BY created_at ASC",
        )
        .bind(order_id)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    pub async fn find_item<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
        item_id: Uuid,
    ) -> Result<Option<ExitOrderItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let maybe = sqlx::query_as::<_, ExitOrderItem>(
            "SELECT * FROM exit_order_items WHERE id = $1 AND order_id = $2",
        )
        .bind(item_id)
        .bind(order_id)
        .fetch_optional(executor)
        .await?;
        Ok(maybe)
    }

    pub async fn list_item_history(
        &self,
        order_id: Uuid,
        item_id: Uuid,
    ) -> Result<Vec<ExitOrderItemHistory>, AppError> {
        let history = sqlx::query_as::<_, ExitOrderItemHistory>(
            r#"
            SELECT * FROM exit_order_item_history
            WHERE item_id = $1 AND order_id = $2
            ORDER BY created_at ASC
            "#,
        )
        .bind(item_id)
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(history)
    }

    // ---
    // Escritas (transacionais)
    // ---

    pub async fn create<'e, E>(
        &self,
        executor: E,
        reason: &str,
        destination: Option<&str>,
        customer_id: Option<Uuid>,
        created_by: Uuid,
    ) -> Result<ExitOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, ExitOrder>(
            r#"
            INSERT INTO exit_orders (reason, destination, customer_id, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(reason)
        .bind(destination)
        .bind(customer_id)
        .bind(created_by)
        .fetch_one(executor)
        .await?;
        Ok(order)
    }

    pub async fn insert_item<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
        equipment_id: Uuid,
        equipment_name: &str,
        unit: &str,
        quantity: Decimal,
        unit_cost: Decimal,
        total_cost: Decimal,
        is_conditional: bool,
    ) -> Result<ExitOrderItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, ExitOrderItem>(
            r#"
            INSERT INTO exit_order_items
                (order_id, equipment_id, equipment_name, unit, quantity, unit_cost,
                 total_cost, is_conditional)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(order_id)
        .bind(equipment_id)
        .bind(equipment_name)
        .bind(unit)
        .bind(quantity)
        .bind(unit_cost)
        .bind(total_cost)
        .bind(is_conditional)
        .fetch_one(executor)
        .await?;
        Ok(item)
    }

    /// Regrava a quantidade de um item editado. `original_quantity` só é
    /// preenchida na primeira edição (COALESCE preserva a captura anterior).
    pub async fn update_item_quantity<'e, E>(
        &self,
        executor: E,
        item_id: Uuid,
        new_quantity: Decimal,
        new_total_cost: Decimal,
        previous_quantity: Decimal,
    ) -> Result<ExitOrderItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, ExitOrderItem>(
            r#"
            UPDATE exit_order_items
            SET quantity = $2,
                total_cost = $3,
                is_modified = TRUE,
                is_conditional = FALSE,
                original_quantity = COALESCE(original_quantity, $4),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(item_id)
        .bind(new_quantity)
        .bind(new_total_cost)
        .bind(previous_quantity)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::NotFound("Item da ordem".into()))
    }

    pub async fn set_item_conditional<'e, E>(
        &self,
        executor: E,
        item_id: Uuid,
        is_conditional: bool,
    ) -> Result<ExitOrderItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, ExitOrderItem>(
            r#"
            UPDATE exit_order_items
            SET is_conditional = $2, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(item_id)
        .bind(is_conditional)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::NotFound("Item da ordem".into()))
    }

    pub async fn delete_item<'e, E>(&self, executor: E, item_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM exit_order_items WHERE id = $1")
            .bind(item_id)
            .execute(executor)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Item da ordem".into()));
        }
        Ok(())
    }

    pub async fn insert_item_history<'e, E>(
        &self,
        executor: E,
        item_id: Uuid,
        order_id: Uuid,
        previous_quantity: Decimal,
        new_quantity: Decimal,
        delta: Decimal,
        reason: &str,
        changed_by: Uuid,
    ) -> Result<ExitOrderItemHistory, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let entry = sqlx::query_as::<_, ExitOrderItemHistory>(
            r#"
            INSERT INTO exit_order_item_history
                (item_id, order_id, previous_quantity, new_quantity, delta, reason, changed_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(item_id)
        .bind(order_id)
        .bind(previous_quantity)
        .bind(new_quantity)
        .bind(delta)
        .bind(reason)
        .bind(changed_by)
        .fetch_one(executor)
        .await?;
        Ok(entry)
    }

    /// Recalcula os agregados do cabeçalho a partir dos itens correntes.
    pub async fn refresh_totals<'e, E>(&self, executor: E, order_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE exit_orders o
            SET total_items = agg.n,
                total_value = agg.total,
                updated_at = now()
            FROM (
                SELECT COUNT(*) AS n, COALESCE(SUM(total_cost), 0) AS total
                FROM exit_order_items
                WHERE order_id = $1
            ) agg
            WHERE o.id = $1
            "#,
        )
        .bind(order_id)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn cancel<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
        cancelled_by: Uuid,
        cancel_reason: Option<&str>,
    ) -> Result<ExitOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, ExitOrder>(
            r#"
            UPDATE exit_orders
            SET status = 'cancelada', cancelled_at = now(), cancelled_by = $2,
                cancel_reason = $3, updated_at = now()
            WHERE id = $1 AND status = 'ativa'
            RETURNING *
            "#,
        )
        .bind(order_id)
        .bind(cancelled_by)
        .bind(cancel_reason)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::BusinessRule("Apenas ordens ativas podem ser canceladas.".into()))
    }
}
