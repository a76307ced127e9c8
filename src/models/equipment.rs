// src/models/equipment.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Equipamento (item de estoque) ---
// Invariante: total_value == quantity * current_cost após toda escrita.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    pub id: Uuid,
    pub name: String,
    pub category_id: Uuid,
    pub unit: String,
    pub quantity: Decimal,
    pub min_stock: Decimal,
    pub avg_cost: Decimal,
    pub current_cost: Decimal,
    pub total_value: Decimal,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Projeção usada nas listagens: equipamento + dados da categoria.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentWithCategory {
    pub id: Uuid,
    pub name: String,
    pub category_id: Uuid,
    pub category_name: String,
    pub category_slug: String,
    pub unit: String,
    pub quantity: Decimal,
    pub min_stock: Decimal,
    pub avg_cost: Decimal,
    pub current_cost: Decimal,
    pub total_value: Decimal,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Tipos de movimentação do livro-razão ---
// Cobre tanto eventos de estoque quanto eventos administrativos de usuário.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Entrada,
    Saida,
    Criacao,
    Reset,
    ProdutoExcluido,
    UsuarioCriado,
    UsuarioDesativado,
    UsuarioReativado,
    RoleAlterada,
}

// --- Movimentação (entrada no livro-razão) ---
// Append-only: nunca é editada; o nome do equipamento é um snapshot para a
// trilha sobreviver a renomes e exclusões.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StockTransaction {
    pub id: Uuid,
    pub equipment_id: Option<Uuid>,
    pub equipment_name: Option<String>,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub quantity: Option<Decimal>,
    pub unit_cost: Option<Decimal>,
    pub total_cost: Option<Decimal>,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub user_id: Option<Uuid>,
    pub user_name: Option<String>,
    pub created_at: DateTime<Utc>,
}
