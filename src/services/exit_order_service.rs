// src/services/exit_order_service.rs

use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::ExitOrderRepository,
    models::{
        auth::User,
        exit_order::{ExitOrder, ExitOrderDetail, ExitOrderItem, ExitOrderItemHistory, ExitOrderStatus},
    },
    services::equipment_service::EquipmentService,
};

// Item solicitado na criação de uma ordem.
pub struct NewExitOrderItem {
    pub equipment_id: Uuid,
    pub quantity: Decimal,
    pub is_conditional: bool,
}

#[derive(Clone)]
pub struct ExitOrderService {
    repo: ExitOrderRepository,
    equipment_service: EquipmentService,
    pool: PgPool,
}

impl ExitOrderService {
    pub fn new(repo: ExitOrderRepository, equipment_service: EquipmentService, pool: PgPool) -> Self {
        Self {
            repo,
            equipment_service,
            pool,
        }
    }

    // Texto gravado no histórico de edição de quantidade.
    fn describe_quantity_change(previous: Decimal, new: Decimal, delta: Decimal) -> String {
        if delta > Decimal::ZERO {
            format!(
                "Quantidade alterada de {} para {} (retirado +{} do estoque)",
                previous, new, delta
            )
        } else {
            format!(
                "Quantidade alterada de {} para {} (devolvido {} ao estoque)",
                previous,
                new,
                -delta
            )
        }
    }

    // ---
    // Leituras
    // ---

    pub async fn list(&self, status: Option<ExitOrderStatus>) -> Result<Vec<ExitOrder>, AppError> {
        self.repo.list(status).await
    }

    pub async fn get_detail(&self, order_id: Uuid) -> Result<ExitOrderDetail, AppError> {
        let header = self
            .repo
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Ordem de saída".into()))?;
        let items = self.repo.list_items(&self.pool, order_id).await?;
        Ok(ExitOrderDetail { header, items })
    }

    pub async fn item_history(
        &self,
        order_id: Uuid,
        item_id: Uuid,
    ) -> Result<Vec<ExitOrderItemHistory>, AppError> {
        // Garante o 404 correto quando o item não pertence à ordem.
        self.repo
            .find_item(&self.pool, order_id, item_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Item da ordem".into()))?;
        self.repo.list_item_history(order_id, item_id).await
    }

    // ---
    // Escritas
    // ---

    /// Cria a ordem inteira ou nada: qualquer item sem saldo derruba a
    /// transação e nenhum estoque é tocado.
    pub async fn create_order<'e, E>(
        &self,
        executor: E,
        reason: &str,
        destination: Option<&str>,
        customer_id: Option<Uuid>,
        items: Vec<NewExitOrderItem>,
        acting: &User,
    ) -> Result<ExitOrderDetail, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if items.is_empty() {
            return Err(AppError::BusinessRule(
                "A ordem de saída precisa de ao menos um item.".into(),
            ));
        }

        let mut tx = executor.begin().await?;

        let order = self
            .repo
            .create(&mut *tx, reason, destination, customer_id, acting.id)
            .await?;

        for item in &items {
            // A baixa valida o saldo e grava a movimentação 'saida'.
            let equipment = self
                .equipment_service
                .registrar_saida(
                    &mut *tx,
                    item.equipment_id,
                    item.quantity,
                    Some(&format!("Ordem de saída #{}", order.order_number)),
                    None,
                    acting,
                )
                .await?;

            // O custo unitário é congelado aqui: edições futuras do
            // equipamento não mexem em ordens já emitidas.
            let unit_cost = equipment.current_cost;
            self.repo
                .insert_item(
                    &mut *tx,
                    order.id,
                    equipment.id,
                    &equipment.name,
                    &equipment.unit,
                    item.quantity,
                    unit_cost,
                    (item.quantity * unit_cost).round_dp(2),
                    item.is_conditional,
                )
                .await?;
        }

        self.repo.refresh_totals(&mut *tx, order.id).await?;
        tx.commit().await?;

        self.get_detail(order.id).await
    }

    /// Cancela uma ordem ativa devolvendo cada item ao estoque.
    pub async fn cancel_order<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
        cancel_reason: Option<&str>,
        acting: &User,
    ) -> Result<ExitOrderDetail, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let order = self
            .repo
            .find_by_id_for_update(&mut *tx, order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Ordem de saída".into()))?;

        if order.status != ExitOrderStatus::Ativa {
            return Err(AppError::BusinessRule(
                "Apenas ordens ativas podem ser canceladas.".into(),
            ));
        }

        let items = self.repo.list_items(&mut *tx, order_id).await?;
        for item in &items {
            self.equipment_service
                .registrar_entrada(
                    &mut *tx,
                    item.equipment_id,
                    item.quantity,
                    None,
                    Some(&format!("Devolução - ordem de saída #{} cancelada", order.order_number)),
                    cancel_reason,
                    acting,
                )
                .await?;
        }

        self.repo.cancel(&mut *tx, order_id, acting.id, cancel_reason).await?;
        tx.commit().await?;

        self.get_detail(order_id).await
    }

    /// Edita a quantidade de um item de ordem ativa. O estoque é ajustado
    /// pelo delta; a quantidade original é capturada só na primeira edição.
    pub async fn update_item_quantity<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
        item_id: Uuid,
        new_quantity: Decimal,
        acting: &User,
    ) -> Result<ExitOrderItem, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let order = self.require_active_order(&mut tx, order_id).await?;

        let item = self
            .repo
            .find_item(&mut *tx, order_id, item_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Item da ordem".into()))?;

        let delta = new_quantity - item.quantity;
        if delta == Decimal::ZERO {
            return Err(AppError::BusinessRule(
                "A nova quantidade é igual à atual.".into(),
            ));
        }

        if delta > Decimal::ZERO {
            // Retirando mais: precisa caber no saldo atual.
            self.equipment_service
                .registrar_saida(
                    &mut *tx,
                    item.equipment_id,
                    delta,
                    Some(&format!("Ajuste na ordem de saída #{}", order.order_number)),
                    None,
                    acting,
                )
                .await?;
        } else {
            self.equipment_service
                .registrar_entrada(
                    &mut *tx,
                    item.equipment_id,
                    -delta,
                    None,
                    Some(&format!("Devolução - ajuste na ordem de saída #{}", order.order_number)),
                    None,
                    acting,
                )
                .await?;
        }

        let updated = self
            .repo
            .update_item_quantity(
                &mut *tx,
                item_id,
                new_quantity,
                (new_quantity * item.unit_cost).round_dp(2),
                item.quantity,
            )
            .await?;

        let reason = Self::describe_quantity_change(item.quantity, new_quantity, delta);
        self.repo
            .insert_item_history(
                &mut *tx,
                item_id,
                order_id,
                item.quantity,
                new_quantity,
                delta,
                &reason,
                acting.id,
            )
            .await?;

        self.repo.refresh_totals(&mut *tx, order_id).await?;
        tx.commit().await?;
        Ok(updated)
    }

    /// Remove um item de ordem ativa devolvendo a quantidade inteira.
    pub async fn remove_item<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
        item_id: Uuid,
        acting: &User,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let order = self.require_active_order(&mut tx, order_id).await?;

        let item = self
            .repo
            .find_item(&mut *tx, order_id, item_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Item da ordem".into()))?;

        if item.quantity > Decimal::ZERO {
            self.equipment_service
                .registrar_entrada(
                    &mut *tx,
                    item.equipment_id,
                    item.quantity,
                    None,
                    Some(&format!(
                        "Devolução - item removido da ordem de saída #{}",
                        order.order_number
                    )),
                    None,
                    acting,
                )
                .await?;
        }

        self.repo.delete_item(&mut *tx, item_id).await?;
        self.repo.refresh_totals(&mut *tx, order_id).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Liga/desliga a marca de condicional. Só metadado: nenhum estoque muda.
    pub async fn toggle_item_conditional<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
        item_id: Uuid,
    ) -> Result<ExitOrderItem, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        self.require_active_order(&mut tx, order_id).await?;

        let item = self
            .repo
            .find_item(&mut *tx, order_id, item_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Item da ordem".into()))?;

        let updated = self
            .repo
            .set_item_conditional(&mut *tx, item_id, !item.is_conditional)
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    async fn require_active_order(
        &self,
        tx: &mut sqlx::Transaction<'_, Postgres>,
        order_id: Uuid,
    ) -> Result<ExitOrder, AppError> {
        let order = self
            .repo
            .find_by_id_for_update(&mut **tx, order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Ordem de saída".into()))?;

        if order.status != ExitOrderStatus::Ativa {
            return Err(AppError::BusinessRule(
                "Apenas ordens ativas podem ser alteradas.".into(),
            ));
        }
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn increase_description_mentions_stock_withdrawal() {
        let text = ExitOrderService::describe_quantity_change(dec("2"), dec("5"), dec("3"));
        assert_eq!(text, "Quantidade alterada de 2 para 5 (retirado +3 do estoque)");
    }

    #[test]
    fn decrease_description_mentions_return() {
        let text = ExitOrderService::describe_quantity_change(dec("5"), dec("0"), dec("-5"));
        assert_eq!(text, "Quantidade alterada de 5 para 0 (devolvido 5 ao estoque)");
    }
}
