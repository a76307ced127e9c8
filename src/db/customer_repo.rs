// src/db/customer_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::customer::Customer};

#[derive(Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

// Campos editáveis de um cliente, compartilhados entre create e update.
// O CNPJ chega aqui já normalizado (somente dígitos) pelo service.
#[derive(Clone, Copy)]
pub struct CustomerData<'a> {
    pub razao_social: &'a str,
    pub nome_fantasia: Option<&'a str>,
    pub cnpj: Option<&'a str>,
    pub inscricao_estadual: Option<&'a str>,
    pub endereco: Option<&'a str>,
    pub numero: Option<&'a str>,
    pub complemento: Option<&'a str>,
    pub bairro: Option<&'a str>,
    pub cidade: Option<&'a str>,
    pub estado: Option<&'a str>,
    pub cep: Option<&'a str>,
    pub telefone: Option<&'a str>,
    pub email: Option<&'a str>,
    pub contato: Option<&'a str>,
    pub observacoes: Option<&'a str>,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_active(&self) -> Result<Vec<Customer>, AppError> {
        let customers = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE active = TRUE ORDER BY razao_social ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(customers)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, AppError> {
        let maybe = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe)
    }

    // O índice único parcial só enxerga clientes que ainda carregam CNPJ:
    // um cliente que limpou o campo libera o número para novo cadastro.
    pub async fn find_by_cnpj<'e, E>(
        &self,
        executor: E,
        cnpj: &str,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let maybe = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE cnpj = $1")
            .bind(cnpj)
            .fetch_optional(executor)
            .await?;
        Ok(maybe)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        data: &CustomerData<'_>,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers
                (razao_social, nome_fantasia, cnpj, inscricao_estadual, endereco, numero,
                 complemento, bairro, cidade, estado, cep, telefone, email, contato, observacoes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(data.razao_social)
        .bind(data.nome_fantasia)
        .bind(data.cnpj)
        .bind(data.inscricao_estadual)
        .bind(data.endereco)
        .bind(data.numero)
        .bind(data.complemento)
        .bind(data.bairro)
        .bind(data.cidade)
        .bind(data.estado)
        .bind(data.cep)
        .bind(data.telefone)
        .bind(data.email)
        .bind(data.contato)
        .bind(data.observacoes)
        .fetch_one(executor)
        .await
        .map_err(map_cnpj_conflict)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        data: &CustomerData<'_>,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers
            SET razao_social = $2, nome_fantasia = $3, cnpj = $4, inscricao_estadual = $5,
                endereco = $6, numero = $7, complemento = $8, bairro = $9, cidade = $10,
                estado = $11, cep = $12, telefone = $13, email = $14, contato = $15,
                observacoes = $16, updated_at = now()
            WHERE id = $1 AND active = TRUE
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(data.razao_social)
        .bind(data.nome_fantasia)
        .bind(data.cnpj)
        .bind(data.inscricao_estadual)
        .bind(data.endereco)
        .bind(data.numero)
        .bind(data.complemento)
        .bind(data.bairro)
        .bind(data.cidade)
        .bind(data.estado)
        .bind(data.cep)
        .bind(data.telefone)
        .bind(data.email)
        .bind(data.contato)
        .bind(data.observacoes)
        .fetch_optional(executor)
        .await
        .map_err(map_cnpj_conflict)?
        .ok_or_else(|| AppError::NotFound("Cliente".into()))
    }

    pub async fn soft_delete<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result =
            sqlx::query("UPDATE customers SET active = FALSE, updated_at = now() WHERE id = $1 AND active = TRUE")
                .bind(id)
                .execute(executor)
                .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Cliente".into()));
        }
        Ok(())
    }
}

// Corrida entre a checagem prévia e o INSERT/UPDATE: o índice único ainda
// segura, e o erro vira o mesmo 409 da checagem.
fn map_cnpj_conflict(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::Conflict("Já existe um cliente com este CNPJ.".into());
        }
    }
    e.into()
}
