// src/models/exit_order.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// Máquina de estados mínima: 'ativa' -> 'cancelada' (terminal). Não existe
// nenhuma outra transição.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "exit_order_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ExitOrderStatus {
    Ativa,
    Cancelada,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ExitOrder {
    pub id: Uuid,
    pub order_number: i64,
    pub reason: String,
    pub destination: Option<String>,
    pub customer_id: Option<Uuid>,
    pub status: ExitOrderStatus,
    pub total_items: i32,
    pub total_value: Decimal,
    pub created_by: Uuid,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancelled_by: Option<Uuid>,
    pub cancel_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Item da ordem. Nome/unidade/custo são snapshots do momento da criação.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ExitOrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub equipment_id: Uuid,
    pub equipment_name: String,
    pub unit: String,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub total_cost: Decimal,
    pub is_modified: bool,
    pub is_conditional: bool,
    // Preenchido uma única vez, na primeira edição de quantidade.
    pub original_quantity: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Trilha append-only das edições de quantidade de um item.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ExitOrderItemHistory {
    pub id: Uuid,
    pub item_id: Uuid,
    pub order_id: Uuid,
    pub previous_quantity: Decimal,
    pub new_quantity: Decimal,
    pub delta: Decimal,
    pub reason: String,
    pub changed_by: Uuid,
    pub created_at: DateTime<Utc>,
}

// Ordem completa, como o frontend consome.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitOrderDetail {
    #[serde(flatten)]
    pub header: ExitOrder,
    pub items: Vec<ExitOrderItem>,
}
