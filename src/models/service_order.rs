// src/models/service_order.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// Ciclo de vida fixo de uma OS. O fluxo normal avança um estado por vez;
// 'cancelado' é alcançável de qualquer estado não-terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "service_order_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ServiceOrderStatus {
    AguardandoOrcamento,
    OrcamentoPendente,
    Aprovado,
    EmReparo,
    Concluido,
    AguardandoRetirada,
    Entregue,
    Cancelado,
}

impl ServiceOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceOrderStatus::AguardandoOrcamento => "aguardando_orcamento",
            ServiceOrderStatus::OrcamentoPendente => "orcamento_pendente",
            ServiceOrderStatus::Aprovado => "aprovado",
            ServiceOrderStatus::EmReparo => "em_reparo",
            ServiceOrderStatus::Concluido => "concluido",
            ServiceOrderStatus::AguardandoRetirada => "aguardando_retirada",
            ServiceOrderStatus::Entregue => "entregue",
            ServiceOrderStatus::Cancelado => "cancelado",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ServiceOrderStatus::Entregue | ServiceOrderStatus::Cancelado)
    }

    // Próximo estado do fluxo normal, quando existe.
    fn next(&self) -> Option<ServiceOrderStatus> {
        match self {
            ServiceOrderStatus::AguardandoOrcamento => Some(ServiceOrderStatus::OrcamentoPendente),
            ServiceOrderStatus::OrcamentoPendente => Some(ServiceOrderStatus::Aprovado),
            ServiceOrderStatus::Aprovado => Some(ServiceOrderStatus::EmReparo),
            ServiceOrderStatus::EmReparo => Some(ServiceOrderStatus::Concluido),
            ServiceOrderStatus::Concluido => Some(ServiceOrderStatus::AguardandoRetirada),
            ServiceOrderStatus::AguardandoRetirada => Some(ServiceOrderStatus::Entregue),
            ServiceOrderStatus::Entregue | ServiceOrderStatus::Cancelado => None,
        }
    }

    /// Regras de transição: avanço de um passo no fluxo normal, repostagem do
    /// mesmo status (idempotente) ou cancelamento a partir de qualquer estado
    /// não-terminal.
    pub fn can_transition_to(&self, to: ServiceOrderStatus) -> bool {
        if *self == to {
            return true;
        }
        if to == ServiceOrderStatus::Cancelado {
            return !self.is_terminal();
        }
        self.next() == Some(to)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOrder {
    pub id: Uuid,
    pub numero_os: String,
    pub customer_id: Option<Uuid>,
    pub status: ServiceOrderStatus,
    pub equipamento: String,
    pub marca: Option<String>,
    pub modelo: Option<String>,
    pub numero_serie: Option<String>,
    pub acessorios: Option<String>,
    pub defeito_relatado: Option<String>,
    pub defeito_constatado: Option<String>,
    pub observacoes: Option<String>,
    pub tecnico_id: Option<Uuid>,
    pub recebido_por_id: Option<Uuid>,
    pub entregue_por_id: Option<Uuid>,
    pub valor_orcamento: Option<Decimal>,
    pub valor_final: Option<Decimal>,
    pub data_entrada: DateTime<Utc>,
    pub data_orcamento: Option<DateTime<Utc>>,
    pub data_aprovacao: Option<DateTime<Utc>>,
    pub data_conclusao: Option<DateTime<Utc>>,
    pub data_entrega: Option<DateTime<Utc>>,
    pub garantia_dias: i32,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Peça/serviço usado na OS. equipment_id presente = baixa de estoque.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOrderItem {
    pub id: Uuid,
    pub service_order_id: Uuid,
    pub equipment_id: Option<Uuid>,
    pub descricao: String,
    pub quantidade: Decimal,
    pub valor_unitario: Decimal,
    pub valor_total: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOrderPayment {
    pub id: Uuid,
    pub service_order_id: Uuid,
    pub valor: Decimal,
    pub forma_pagamento: String,
    pub observacoes: Option<String>,
    pub data_pagamento: DateTime<Utc>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

// Linha do histórico append-only: toda transição e todo acréscimo de
// peça/pagamento gera uma.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOrderHistoryEntry {
    pub id: Uuid,
    pub service_order_id: Uuid,
    pub acao: String,
    pub valor_anterior: Option<String>,
    pub valor_novo: Option<String>,
    pub descricao: Option<String>,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOrderDetail {
    #[serde(flatten)]
    pub header: ServiceOrder,
    pub items: Vec<ServiceOrderItem>,
    pub payments: Vec<ServiceOrderPayment>,
    pub history: Vec<ServiceOrderHistoryEntry>,
}

#[cfg(test)]
mod tests {
    use super::ServiceOrderStatus::*;

    #[test]
    fn normal_flow_advances_one_state_at_a_time() {
        assert!(AguardandoOrcamento.can_transition_to(OrcamentoPendente));
        assert!(OrcamentoPendente.can_transition_to(Aprovado));
        assert!(Aprovado.can_transition_to(EmReparo));
        assert!(EmReparo.can_transition_to(Concluido));
        assert!(Concluido.can_transition_to(AguardandoRetirada));
        assert!(AguardandoRetirada.can_transition_to(Entregue));
    }

    #[test]
    fn skipping_states_is_rejected() {
        assert!(!AguardandoOrcamento.can_transition_to(Aprovado));
        assert!(!OrcamentoPendente.can_transition_to(Entregue));
        assert!(!Aprovado.can_transition_to(Concluido));
    }

    #[test]
    fn going_backwards_is_rejected() {
        assert!(!Aprovado.can_transition_to(OrcamentoPendente));
        assert!(!Entregue.can_transition_to(AguardandoRetirada));
    }

    #[test]
    fn cancel_reachable_from_any_non_terminal_state() {
        for st in [
            AguardandoOrcamento,
            OrcamentoPendente,
            Aprovado,
            EmReparo,
            Concluido,
            AguardandoRetirada,
        ] {
            assert!(st.can_transition_to(Cancelado), "{:?}", st);
        }
        assert!(!Entregue.can_transition_to(Cancelado));
    }

    #[test]
    fn terminal_states_only_accept_themselves() {
        assert!(Entregue.can_transition_to(Entregue));
        assert!(Cancelado.can_transition_to(Cancelado));
        assert!(!Cancelado.can_transition_to(AguardandoOrcamento));
        assert!(!Entregue.can_transition_to(EmReparo));
    }
}
