// src/services/service_order_service.rs

use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ServiceOrderRepository, service_order_repo::ServiceOrderData},
    models::{
        auth::User,
        service_order::{
            ServiceOrder, ServiceOrderDetail, ServiceOrderItem, ServiceOrderPayment,
            ServiceOrderStatus,
        },
    },
    services::equipment_service::EquipmentService,
};

#[derive(Clone)]
pub struct ServiceOrderService {
    repo: ServiceOrderRepository,
    equipment_service: EquipmentService,
    pool: PgPool,
}

impl ServiceOrderService {
    pub fn new(
        repo: ServiceOrderRepository,
        equipment_service: EquipmentService,
        pool: PgPool,
    ) -> Self {
        Self {
            repo,
            equipment_service,
            pool,
        }
    }

    /// Próximo número da sequência anual: "OS-<ano>-NNNN".
    /// Sufixo ilegível no último número emitido reinicia a contagem do ano.
    fn next_numero_os(year: i32, last: Option<&str>) -> String {
        let next = last
            .and_then(|n| n.rsplit('-').next())
            .and_then(|suffix| suffix.parse::<u32>().ok())
            .map(|seq| seq + 1)
            .unwrap_or(1);
        format!("OS-{}-{:04}", year, next)
    }

    // ---
    // Leituras
    // ---

    pub async fn list(&self, status: Option<ServiceOrderStatus>) -> Result<Vec<ServiceOrder>, AppError> {
        self.repo.list(status).await
    }

    pub async fn get_detail(&self, id: Uuid) -> Result<ServiceOrderDetail, AppError> {
        let header = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Ordem de serviço".into()))?;
        let items = self.repo.list_items(&self.pool, id).await?;
        let payments = self.repo.list_payments(&self.pool, id).await?;
        let history = self.repo.list_history(&self.pool, id).await?;
        Ok(ServiceOrderDetail {
            header,
            items,
            payments,
            history,
        })
    }

    pub async fn history(&self, id: Uuid) -> Result<Vec<crate::models::service_order::ServiceOrderHistoryEntry>, AppError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Ordem de serviço".into()))?;
        self.repo.list_history(&self.pool, id).await
    }

    // ---
    // Escritas
    // ---

    pub async fn create<'e, E>(
        &self,
        executor: E,
        data: &ServiceOrderData<'_>,
        acting: &User,
    ) -> Result<ServiceOrderDetail, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let year = Utc::now().year();
        let prefix = format!("OS-{}-", year);
        let last = self.repo.last_numero_os(&mut *tx, &prefix).await?;
        let numero_os = Self::next_numero_os(year, last.as_deref());

        let order = self
            .repo
            .create(&mut *tx, &numero_os, data, acting.id, acting.id)
            .await?;

        self.repo
            .insert_history(
                &mut *tx,
                order.id,
                "criacao",
                None,
                Some(order.status.as_str()),
                Some(&format!("OS {} criada", numero_os)),
                acting.id,
            )
            .await?;

        tx.commit().await?;
        self.get_detail(order.id).await
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        data: &ServiceOrderData<'_>,
        acting: &User,
    ) -> Result<ServiceOrderDetail, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let before = self.require_open_order(&mut tx, id).await?;

        let updated = self.repo.update_fields(&mut *tx, id, data).await?;

        // Mudança de orçamento entra no histórico com valor antigo e novo.
        if before.valor_orcamento != updated.valor_orcamento {
            self.repo
                .insert_history(
                    &mut *tx,
                    id,
                    "orcamento",
                    before.valor_orcamento.map(|v| v.to_string()).as_deref(),
                    updated.valor_orcamento.map(|v| v.to_string()).as_deref(),
                    Some("Valor do orçamento alterado"),
                    acting.id,
                )
                .await?;
        }

        tx.commit().await?;
        self.get_detail(id).await
    }

    /// Aplica uma transição da máquina de estados. As datas de cada estado
    /// são carimbadas apenas na primeira entrada; o histórico ganha uma
    /// linha em TODA chamada, inclusive repostagem do mesmo status.
    pub async fn change_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        new_status: ServiceOrderStatus,
        acting: &User,
    ) -> Result<ServiceOrderDetail, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let order = self
            .repo
            .find_by_id_for_update(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Ordem de serviço".into()))?;

        if !order.status.can_transition_to(new_status) {
            return Err(AppError::InvalidStatusTransition {
                from: order.status.as_str().into(),
                to: new_status.as_str().into(),
            });
        }

        self.repo.apply_status(&mut *tx, id, new_status, acting.id).await?;

        self.repo
            .insert_history(
                &mut *tx,
                id,
                "status_alterado",
                Some(order.status.as_str()),
                Some(new_status.as_str()),
                None,
                acting.id,
            )
            .await?;

        tx.commit().await?;
        self.get_detail(id).await
    }

    /// Lança uma peça/serviço na OS. Com vínculo de estoque, a baixa passa
    /// pelo mesmo caminho das saídas comuns (trava, validação de saldo e
    /// movimentação no livro-razão) dentro desta mesma transação.
    pub async fn add_item<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        equipment_id: Option<Uuid>,
        descricao: &str,
        quantidade: Decimal,
        valor_unitario: Decimal,
        acting: &User,
    ) -> Result<ServiceOrderItem, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if quantidade <= Decimal::ZERO {
            return Err(AppError::BusinessRule(
                "A quantidade da peça deve ser maior que zero.".into(),
            ));
        }

        let mut tx = executor.begin().await?;

        let order = self.require_open_order(&mut tx, id).await?;

        if let Some(equipment_id) = equipment_id {
            self.equipment_service
                .registrar_saida(
                    &mut *tx,
                    equipment_id,
                    quantidade,
                    Some(&format!("Peça utilizada na OS {}", order.numero_os)),
                    None,
                    acting,
                )
                .await?;
        }

        let item = self
            .repo
            .insert_item(
                &mut *tx,
                id,
                equipment_id,
                descricao,
                quantidade,
                valor_unitario,
                (quantidade * valor_unitario).round_dp(2),
            )
            .await?;

        self.repo
            .insert_history(
                &mut *tx,
                id,
                "item_adicionado",
                None,
                Some(&item.valor_total.to_string()),
                Some(&format!("{} x {}", quantidade, descricao)),
                acting.id,
            )
            .await?;

        tx.commit().await?;
        Ok(item)
    }

    pub async fn add_payment<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        valor: Decimal,
        forma_pagamento: &str,
        observacoes: Option<&str>,
        acting: &User,
    ) -> Result<ServiceOrderPayment, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if valor <= Decimal::ZERO {
            return Err(AppError::BusinessRule(
                "O valor do pagamento deve ser maior que zero.".into(),
            ));
        }

        let mut tx = executor.begin().await?;

        self.require_open_order(&mut tx, id).await?;

        let payment = self
            .repo
            .insert_payment(&mut *tx, id, valor, forma_pagamento, observacoes, acting.id)
            .await?;

        self.repo
            .insert_history(
                &mut *tx,
                id,
                "pagamento",
                None,
                Some(&valor.to_string()),
                Some(&format!("Pagamento via {}", forma_pagamento)),
                acting.id,
            )
            .await?;

        tx.commit().await?;
        Ok(payment)
    }

    // Estados terminais tornam a OS somente leitura.
    async fn require_open_order(
        &self,
        tx: &mut sqlx::Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<ServiceOrder, AppError> {
        let order = self
            .repo
            .find_by_id_for_update(&mut **tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Ordem de serviço".into()))?;

        if order.status.is_terminal() {
            return Err(AppError::BusinessRule(
                "Ordens entregues ou canceladas não podem ser alteradas.".into(),
            ));
        }
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_order_of_the_year_starts_at_one() {
        assert_eq!(ServiceOrderService::next_numero_os(2026, None), "OS-2026-0001");
    }

    #[test]
    fn sequence_continues_from_the_last_issued_number() {
        assert_eq!(
            ServiceOrderService::next_numero_os(2026, Some("OS-2026-0012")),
            "OS-2026-0013"
        );
    }

    #[test]
    fn sequence_grows_past_four_digits() {
        assert_eq!(
            ServiceOrderService::next_numero_os(2026, Some("OS-2026-9999")),
            "OS-2026-10000"
        );
    }

    #[test]
    fn unparseable_suffix_restarts_the_sequence() {
        assert_eq!(
            ServiceOrderService::next_numero_os(2026, Some("OS-2026-abc")),
            "OS-2026-0001"
        );
    }
}
