// src/db/transaction_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::equipment::{StockTransaction, TransactionType},
};

// Livro-razão: este repositório só insere e lê. A única exceção é o
// `delete_all`, reservado ao reset administrativo.
#[derive(Clone)]
pub struct TransactionRepository {
    pool: PgPool,
}

impl TransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Registra um evento no livro-razão (estoque ou administrativo).
    pub async fn record<'e, E>(
        &self,
        executor: E,
        equipment_id: Option<Uuid>,
        equipment_name: Option<&str>,
        transaction_type: TransactionType,
        quantity: Option<Decimal>,
        unit_cost: Option<Decimal>,
        total_cost: Option<Decimal>,
        reason: Option<&str>,
        notes: Option<&str>,
        user_id: Option<Uuid>,
        user_name: Option<&str>,
    ) -> Result<StockTransaction, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let transaction = sqlx::query_as::<_, StockTransaction>(
            r#"
            INSERT INTO transactions
                (equipment_id, equipment_name, type, quantity, unit_cost, total_cost,
                 reason, notes, user_id, user_name)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(equipment_id)
        .bind(equipment_name)
        .bind(transaction_type)
        .bind(quantity)
        .bind(unit_cost)
        .bind(total_cost)
        .bind(reason)
        .bind(notes)
        .bind(user_id)
        .bind(user_name)
        .fetch_one(executor)
        .await?;
        Ok(transaction)
    }

    pub async fn list(
        &self,
        equipment_id: Option<Uuid>,
        transaction_type: Option<TransactionType>,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<StockTransaction>, AppError> {
        let transactions = sqlx::query_as::<_, StockTransaction>(
            r#"
            SELECT * FROM transactions
            WHERE ($1::uuid IS NULL OR equipment_id = $1)
              AND ($2::transaction_type IS NULL OR type = $2)
              AND ($3::timestamptz IS NULL OR created_at >= $3)
              AND ($4::timestamptz IS NULL OR created_at <= $4)
            ORDER BY created_at DESC
            LIMIT $5
            "#,
        )
        .bind(equipment_id)
        .bind(transaction_type)
        .bind(from)
        .bind(to)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(transactions)
    }

    /// Apaga o livro-razão inteiro. Chamado somente pelo reset administrativo.
    pub async fn delete_all<'e, E>(&self, executor: E) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM transactions").execute(executor).await?;
        Ok(result.rows_affected())
    }
}
