// src/db/service_order_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::service_order::{
        ServiceOrder, ServiceOrderHistoryEntry, ServiceOrderItem, ServiceOrderPayment,
        ServiceOrderStatus,
    },
};

#[derive(Clone)]
pub struct ServiceOrderRepository {
    pool: PgPool,
}

// Campos descritivos de uma OS, compartilhados entre create e update.
pub struct ServiceOrderData<'a> {
    pub customer_id: Option<Uuid>,
    pub equipamento: &'a str,
    pub marca: Option<&'a str>,
    pub modelo: Option<&'a str>,
    pub numero_serie: Option<&'a str>,
    pub acessorios: Option<&'a str>,
    pub defeito_relatado: Option<&'a str>,
    pub defeito_constatado: Option<&'a str>,
    pub observacoes: Option<&'a str>,
    pub tecnico_id: Option<Uuid>,
    pub valor_orcamento: Option<Decimal>,
    pub valor_final: Option<Decimal>,
    pub garantia_dias: i32,
}

impl ServiceOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Leituras
    // ---

    pub async fn list(
        &self,
        status: Option<ServiceOrderStatus>,
    ) -> Result<Vec<ServiceOrder>, AppError> {
        let orders = sqlx::query_as::<_, ServiceOrder>(
            r#"
            SELECT * FROM service_orders
            WHERE ($1::service_order_status IS NULL OR status = $1)
            ORDER BY data_entrada DESC
            "#,
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ServiceOrder>, AppError> {
        let maybe = sqlx::query_as::<_, ServiceOrder>("SELECT * FROM service_orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe)
    }

    pub async fn find_by_id_for_update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<ServiceOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let maybe = sqlx::query_as::<_, ServiceOrder>(
            "SELECT * FROM service_orders WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(maybe)
    }

    /// Maior numero_os já emitido no ano corrente (prefixo "OS-<ano>-").
    pub async fn last_numero_os<'e, E>(
        &self,
        executor: E,
        prefix: &str,
    ) -> Result<Option<String>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let maybe: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT numero_os FROM service_orders
            WHERE numero_os LIKE $1
            ORDER BY numero_os DESC
            LIMIT 1
            "#,
        )
        .bind(format!("{}%", prefix))
        .fetch_optional(executor)
        .await?;
        Ok(maybe.map(|(n,)| n))
    }

    pub async fn list_items<'e, E>(
        &self,
        executor: E,
        service_order_id: Uuid,
    ) -> Result<Vec<ServiceOrderItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, ServiceOrderItem>(
            "SELECT * FROM service_order_items WHERE service_order_id = $1 ORDER BY created_at ASC",
        )
        .bind(service_order_id)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    pub async fn list_payments<'e, E>(
        &self,
        executor: E,
        service_order_id: Uuid,
    ) -> Result<Vec<ServiceOrderPayment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payments = sqlx::query_as::<_, ServiceOrderPayment>(
            "SELECT * FROM service_order_payments WHERE service_order_id = $1 ORDER BY data_pagamento ASC",
        )
        .bind(service_order_id)
        .fetch_all(executor)
        .await?;
        Ok(payments)
    }

    pub async fn list_history<'e, E>(
        &self,
        executor: E,
        service_order_id: Uuid,
    ) -> Result<Vec<ServiceOrderHistoryEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let history = sqlx::query_as::<_, ServiceOrderHistoryEntry>(
            "SELECT * FROM service_order_history WHERE service_order_id = $1 ORDER BY created_at ASC",
        )
        .bind(service_order_id)
        .fetch_all(executor)
        .await?;
        Ok(history)
    }

    // ---
    // Escritas (transacionais)
    // ---

    pub async fn create<'e, E>(
        &self,
        executor: E,
        numero_os: &str,
        data: &ServiceOrderData<'_>,
        recebido_por_id: Uuid,
        created_by: Uuid,
    ) -> Result<ServiceOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, ServiceOrder>(
            r#"
            INSERT INTO service_orders
                (numero_os, customer_id, equipamento, marca, modelo, numero_serie,
                 acessorios, defeito_relatado, defeito_constatado, observacoes,
                 tecnico_id, recebido_por_id, valor_orcamento, valor_final,
                 garantia_dias, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING *
            "#,
        )
        .bind(numero_os)
        .bind(data.customer_id)
        .bind(data.equipamento)
        .bind(data.marca)
        .bind(data.modelo)
        .bind(data.numero_serie)
        .bind(data.acessorios)
        .bind(data.defeito_relatado)
        .bind(data.defeito_constatado)
        .bind(data.observacoes)
        .bind(data.tecnico_id)
        .bind(recebido_por_id)
        .bind(data.valor_orcamento)
        .bind(data.valor_final)
        .bind(data.garantia_dias)
        .bind(created_by)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    // Corrida na geração do número sequencial: o chamador
                    // devolve 409 e o frontend apenas reenvia.
                    return AppError::Conflict(
                        "Conflito na numeração da OS. Tente novamente.".into(),
                    );
                }
            }
            e.into()
        })
    }

    pub async fn update_fields<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        data: &ServiceOrderData<'_>,
    ) -> Result<ServiceOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, ServiceOrder>(
            r#"
            UPDATE service_orders
            SET customer_id = $2, equipamento = $3, marca = $4, modelo = $5,
                numero_serie = $6, acessorios = $7, defeito_relatado = $8,
                defeito_constatado = $9, observacoes = $10, tecnico_id = $11,
                valor_orcamento = $12, valor_final = $13, garantia_dias = $14,
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(data.customer_id)
        .bind(data.equipamento)
        .bind(data.marca)
        .bind(data.modelo)
        .bind(data.numero_serie)
        .bind(data.acessorios)
        .bind(data.defeito_relatado)
        .bind(data.defeito_constatado)
        .bind(data.observacoes)
        .bind(data.tecnico_id)
        .bind(data.valor_orcamento)
        .bind(data.valor_final)
        .bind(data.garantia_dias)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::NotFound("Ordem de serviço".into()))
    }

    /// Aplica a transição de status. Cada coluna de data é carimbada apenas
    /// na PRIMEIRA entrada no estado correspondente; repostar o mesmo status
    /// não sobrescreve data nem entregador (idempotente nesses campos).
    pub async fn apply_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: ServiceOrderStatus,
        delivered_by: Uuid,
    ) -> Result<ServiceOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, ServiceOrder>(
            r#"
            UPDATE service_orders
            SET status = $2,
                data_orcamento = CASE
                    WHEN $2 = 'orcamento_pendente' AND data_orcamento IS NULL THEN now()
                    ELSE data_orcamento END,
                data_aprovacao = CASE
                    WHEN $2 = 'aprovado' AND data_aprovacao IS NULL THEN now()
                    ELSE data_aprovacao END,
                data_conclusao = CASE
                    WHEN $2 = 'concluido' AND data_conclusao IS NULL THEN now()
                    ELSE data_conclusao END,
                data_entrega = CASE
                    WHEN $2 = 'entregue' AND data_entrega IS NULL THEN now()
                    ELSE data_entrega END,
                entregue_por_id = CASE
                    WHEN $2 = 'entregue' AND entregue_por_id IS NULL THEN $3
                    ELSE entregue_por_id END,
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(delivered_by)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::NotFound("Ordem de serviço".into()))
    }

    pub async fn insert_item<'e, E>(
        &self,
        executor: E,
        service_order_id: Uuid,
        equipment_id: Option<Uuid>,
        descricao: &str,
        quantidade: Decimal,
        valor_unitario: Decimal,
        valor_total: Decimal,
    ) -> Result<ServiceOrderItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, ServiceOrderItem>(
            r#"
            INSERT INTO service_order_items
                (service_order_id, equipment_id, descricao, quantidade, valor_unitario, valor_total)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(service_order_id)
        .bind(equipment_id)
        .bind(descricao)
        .bind(quantidade)
        .bind(valor_unitario)
        .bind(valor_total)
        .fetch_one(executor)
        .await?;
        Ok(item)
    }

    pub async fn insert_payment<'e, E>(
        &self,
        executor: E,
        service_order_id: Uuid,
        valor: Decimal,
        forma_pagamento: &str,
        observacoes: Option<&str>,
        created_by: Uuid,
    ) -> Result<ServiceOrderPayment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payment = sqlx::query_as::<_, ServiceOrderPayment>(
            r#"
            INSERT INTO service_order_payments
                (service_order_id, valor, forma_pagamento, observacoes, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(service_order_id)
        .bind(valor)
        .bind(forma_pagamento)
        .bind(observacoes)
        .bind(created_by)
        .fetch_one(executor)
        .await?;
        Ok(payment)
    }

    pub async fn insert_history<'e, E>(
        &self,
        executor: E,
        service_order_id: Uuid,
        acao: &str,
        valor_anterior: Option<&str>,
        valor_novo: Option<&str>,
        descricao: Option<&str>,
        user_id: Uuid,
    ) -> Result<ServiceOrderHistoryEntry, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let entry = sqlx::query_as::<_, ServiceOrderHistoryEntry>(
            r#"
            INSERT INTO service_order_history
                (service_order_id, acao, valor_anterior, valor_novo, descricao, user_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(service_order_id)
        .bind(acao)
        .bind(valor_anterior)
        .bind(valor_novo)
        .bind(descricao)
        .bind(user_id)
        .fetch_one(executor)
        .await?;
        Ok(entry)
    }
}
