// src/models/composite.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// Item composto ("kit"): produto virtual, sem estoque próprio.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CompositeItem {
    pub id: Uuid,
    pub name: String,
    pub category_id: Option<Uuid>,
    pub description: Option<String>,
    pub active: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Componente do kit + saldo atual do equipamento, como vem da query de
// disponibilidade.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CompositeComponentDetail {
    pub id: Uuid,
    pub composite_id: Uuid,
    pub equipment_id: Uuid,
    pub equipment_name: String,
    pub equipment_unit: String,
    pub equipment_quantity: Decimal,
    pub quantity: Decimal,
}

// Kit completo: cabeçalho + componentes + disponibilidade derivada.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeItemDetail {
    #[serde(flatten)]
    pub header: CompositeItem,
    pub components: Vec<CompositeComponentDetail>,
    // Derivada, nunca armazenada: min(floor(saldo / exigido)) dos componentes.
    pub availability: i64,
}
