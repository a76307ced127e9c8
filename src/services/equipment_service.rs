// src/services/equipment_service.rs

use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CategoryRepository, EquipmentRepository, TransactionRepository},
    models::{
        auth::User,
        category::Category,
        equipment::{Equipment, EquipmentWithCategory, StockTransaction, TransactionType},
    },
};

// Toda mutação de estoque passa por aqui: ler a linha com trava, validar,
// recalcular custo/valor total e gravar a movimentação no livro-razão,
// tudo dentro de uma única transação.
#[derive(Clone)]
pub struct EquipmentService {
    equipment_repo: EquipmentRepository,
    category_repo: CategoryRepository,
    transaction_repo: TransactionRepository,
}

impl EquipmentService {
    pub fn new(
        equipment_repo: EquipmentRepository,
        category_repo: CategoryRepository,
        transaction_repo: TransactionRepository,
    ) -> Self {
        Self {
            equipment_repo,
            category_repo,
            transaction_repo,
        }
    }

    /// Custo médio ponderado após uma entrada com custo informado.
    /// Mistura o valor do estoque atual com o valor recebido; se o saldo
    /// resultante for zero, o custo zera junto (guarda da divisão).
    fn calculate_new_average_cost(
        current_qty: Decimal,
        current_cost: Decimal,
        incoming_qty: Decimal,
        incoming_cost: Decimal,
    ) -> Decimal {
        let new_total_qty = current_qty + incoming_qty;
        if new_total_qty <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let blended = (current_qty * current_cost + incoming_qty * incoming_cost) / new_total_qty;
        blended.round_dp(2)
    }

    // ---
    // Categorias (dados de referência)
    // ---

    pub async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        self.category_repo.list_all().await
    }

    pub async fn create_category<'e, E>(
        &self,
        executor: E,
        name: &str,
        slug: &str,
        icon: Option<&str>,
    ) -> Result<Category, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.category_repo.create(executor, name, slug, icon).await
    }

    pub async fn update_category<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        name: &str,
        slug: &str,
        icon: Option<&str>,
    ) -> Result<Category, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.category_repo.update(executor, id, name, slug, icon).await
    }

    /// Categoria só sai do cadastro quando nenhum equipamento aponta para ela.
    pub async fn delete_category<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let in_use = self.category_repo.count_equipment(&mut *tx, id).await?;
        if in_use > 0 {
            return Err(AppError::Conflict(format!(
                "A categoria ainda é usada por {} equipamento(s).",
                in_use
            )));
        }

        self.category_repo.delete(&mut *tx, id).await?;
        tx.commit().await?;
        Ok(())
    }

    // ---
    // Leituras
    // ---

    pub async fn list_active(&self) -> Result<Vec<EquipmentWithCategory>, AppError> {
        self.equipment_repo.list_active().await
    }

    pub async fn list_low_stock(&self) -> Result<Vec<EquipmentWithCategory>, AppError> {
        self.equipment_repo.list_low_stock().await
    }

    pub async fn get(&self, id: Uuid) -> Result<Equipment, AppError> {
        self.equipment_repo
            .find_by_id(id)
            .await?
            .filter(|e| e.active)
            .ok_or_else(|| AppError::NotFound("Equipamento".into()))
    }

    // ---
    // Escritas
    // ---

    pub async fn create_equipment<'e, E>(
        &self,
        executor: E,
        name: &str,
        category_id: Uuid,
        unit: &str,
        initial_quantity: Decimal,
        min_stock: Decimal,
        initial_cost: Decimal,
        acting: &User,
    ) -> Result<Equipment, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let total_value = (initial_quantity * initial_cost).round_dp(2);
        let equipment = self
            .equipment_repo
            .create(
                &mut *tx,
                name,
                category_id,
                unit,
                initial_quantity,
                min_stock,
                initial_cost,
                total_value,
            )
            .await?;

        self.transaction_repo
            .record(
                &mut *tx,
                Some(equipment.id),
                Some(&equipment.name),
                TransactionType::Criacao,
                Some(initial_quantity),
                Some(initial_cost),
                Some(total_value),
                Some("Cadastro de equipamento"),
                None,
                Some(acting.id),
                Some(&acting.name),
            )
            .await?;

        tx.commit().await?;
        Ok(equipment)
    }

    pub async fn update_metadata<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        name: &str,
        category_id: Uuid,
        unit: &str,
        min_stock: Decimal,
    ) -> Result<Equipment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.equipment_repo
            .update_metadata(executor, id, name, category_id, unit, min_stock)
            .await
    }

    /// Entrada de estoque. Com custo unitário informado, o custo médio é
    /// recalculado; sem custo, o saldo sobe mantendo o custo vigente (caso
    /// das devoluções).
    pub async fn registrar_entrada<'e, E>(
        &self,
        executor: E,
        equipment_id: Uuid,
        quantity: Decimal,
        unit_cost: Option<Decimal>,
        reason: Option<&str>,
        notes: Option<&str>,
        acting: &User,
    ) -> Result<Equipment, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if quantity <= Decimal::ZERO {
            return Err(AppError::BusinessRule(
                "A quantidade da entrada deve ser maior que zero.".into(),
            ));
        }

        let mut tx = executor.begin().await?;

        let equipment = self
            .equipment_repo
            .find_by_id_for_update(&mut *tx, equipment_id)
            .await?
            .filter(|e| e.active)
            .ok_or_else(|| AppError::NotFound("Equipamento".into()))?;

        let new_quantity = equipment.quantity + quantity;
        let new_cost = match unit_cost {
            Some(cost) => Self::calculate_new_average_cost(
                equipment.quantity,
                equipment.current_cost,
                quantity,
                cost,
            ),
            None => equipment.current_cost,
        };
        let total_value = (new_quantity * new_cost).round_dp(2);

        let updated = self
            .equipment_repo
            .apply_stock_change(&mut *tx, equipment_id, new_quantity, new_cost, total_value)
            .await?;

        let cost_used = unit_cost.unwrap_or(equipment.current_cost);
        self.transaction_repo
            .record(
                &mut *tx,
                Some(equipment.id),
                Some(&equipment.name),
                TransactionType::Entrada,
                Some(quantity),
                Some(cost_used),
                Some((quantity * cost_used).round_dp(2)),
                reason,
                notes,
                Some(acting.id),
                Some(&acting.name),
            )
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Saída de estoque. Falha sem efeito algum se o saldo for insuficiente;
    /// a mensagem informa quanto há disponível.
    pub async fn registrar_saida<'e, E>(
        &self,
        executor: E,
        equipment_id: Uuid,
        quantity: Decimal,
        reason: Option<&str>,
        notes: Option<&str>,
        acting: &User,
    ) -> Result<Equipment, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if quantity <= Decimal::ZERO {
            return Err(AppError::BusinessRule(
                "A quantidade da saída deve ser maior que zero.".into(),
            ));
        }

        let mut tx = executor.begin().await?;

        let equipment = self
            .equipment_repo
            .find_by_id_for_update(&mut *tx, equipment_id)
            .await?
            .filter(|e| e.active)
            .ok_or_else(|| AppError::NotFound("Equipamento".into()))?;

        if equipment.quantity < quantity {
            return Err(AppError::InsufficientStock {
                name: equipment.name,
                available: equipment.quantity,
            });
        }

        let new_quantity = equipment.quantity - quantity;
        let total_value = (new_quantity * equipment.current_cost).round_dp(2);

        let updated = self
            .equipment_repo
            .apply_stock_change(
                &mut *tx,
                equipment_id,
                new_quantity,
                equipment.current_cost,
                total_value,
            )
            .await?;

        self.transaction_repo
            .record(
                &mut *tx,
                Some(equipment.id),
                Some(&equipment.name),
                TransactionType::Saida,
                Some(quantity),
                Some(equipment.current_cost),
                Some((quantity * equipment.current_cost).round_dp(2)),
                reason,
                notes,
                Some(acting.id),
                Some(&acting.name),
            )
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Exclusão lógica: o equipamento some das listagens, mas a movimentação
    /// final registra a quantidade e o valor descartados.
    pub async fn excluir_equipamento<'e, E>(
        &self,
        executor: E,
        equipment_id: Uuid,
        acting: &User,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let equipment = self
            .equipment_repo
            .find_by_id_for_update(&mut *tx, equipment_id)
            .await?
            .filter(|e| e.active)
            .ok_or_else(|| AppError::NotFound("Equipamento".into()))?;

        self.equipment_repo.soft_delete(&mut *tx, equipment_id).await?;

        self.transaction_repo
            .record(
                &mut *tx,
                Some(equipment.id),
                Some(&equipment.name),
                TransactionType::ProdutoExcluido,
                Some(equipment.quantity),
                Some(equipment.current_cost),
                Some(equipment.total_value),
                Some("Equipamento excluído"),
                None,
                Some(acting.id),
                Some(&acting.name),
            )
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Reset administrativo: zera o livro-razão e deixa um único marcador
    /// com o autor. Os saldos de equipamento NÃO são alterados.
    pub async fn reset_movements<'e, E>(&self, executor: E, acting: &User) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let removed = self.transaction_repo.delete_all(&mut *tx).await?;
        self.transaction_repo
            .record(
                &mut *tx,
                None,
                None,
                TransactionType::Reset,
                None,
                None,
                None,
                Some(&format!("Histórico de movimentações zerado ({} registros)", removed)),
                None,
                Some(acting.id),
                Some(&acting.name),
            )
            .await?;

        tx.commit().await?;
        tracing::warn!("Livro-razão apagado por {} ({} registros)", acting.username, removed);
        Ok(removed)
    }

    pub async fn list_transactions(
        &self,
        equipment_id: Option<Uuid>,
        transaction_type: Option<TransactionType>,
        from: Option<chrono::DateTime<chrono::Utc>>,
        to: Option<chrono::DateTime<chrono::Utc>>,
        limit: i64,
    ) -> Result<Vec<StockTransaction>, AppError> {
        self.transaction_repo
            .list(equipment_id, transaction_type, from, to, limit)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn weighted_average_blends_old_and_new_value() {
        // 10 unidades a 100 + 5 unidades a 130 => 1650 / 15 = 110
        let cost = EquipmentService::calculate_new_average_cost(
            dec("10"),
            dec("100"),
            dec("5"),
            dec("130"),
        );
        assert_eq!(cost, dec("110"));
    }

    #[test]
    fn entry_into_empty_stock_takes_the_incoming_cost() {
        let cost =
            EquipmentService::calculate_new_average_cost(dec("0"), dec("0"), dec("4"), dec("25.50"));
        assert_eq!(cost, dec("25.50"));
    }

    #[test]
    fn zero_resulting_quantity_zeroes_the_cost() {
        let cost =
            EquipmentService::calculate_new_average_cost(dec("0"), dec("100"), dec("0"), dec("50"));
        assert_eq!(cost, Decimal::ZERO);
    }

    #[test]
    fn average_is_rounded_to_cents() {
        // (3*10 + 1*15) / 4 = 11.25 ; (1*10 + 2*10.11) / 3 = 10.073... => 10.07
        let exact =
            EquipmentService::calculate_new_average_cost(dec("3"), dec("10"), dec("1"), dec("15"));
        assert_eq!(exact, dec("11.25"));

        let rounded = EquipmentService::calculate_new_average_cost(
            dec("1"),
            dec("10"),
            dec("2"),
            dec("10.11"),
        );
        assert_eq!(rounded, dec("10.07"));
    }
}
