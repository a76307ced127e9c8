// src/services/composite_service.rs

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use sqlx::{Acquire, Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CompositeRepository, EquipmentRepository},
    models::composite::{CompositeComponentDetail, CompositeItemDetail},
};

// Componente solicitado no cadastro/edição de um kit.
pub struct NewComponent {
    pub equipment_id: Uuid,
    pub quantity: Decimal,
}

#[derive(Clone)]
pub struct CompositeService {
    repo: CompositeRepository,
    equipment_repo: EquipmentRepository,
    pool: PgPool,
}

impl CompositeService {
    pub fn new(repo: CompositeRepository, equipment_repo: EquipmentRepository, pool: PgPool) -> Self {
        Self {
            repo,
            equipment_repo,
            pool,
        }
    }

    /// Disponibilidade derivada do kit: quantos conjuntos completos o estoque
    /// atual monta. Nada é reservado por consultar isso; só uma ordem de
    /// saída contra os equipamentos reduz o saldo.
    fn compute_availability(components: &[CompositeComponentDetail]) -> i64 {
        if components.is_empty() {
            return 0;
        }
        components
            .iter()
            .map(|c| {
                if c.quantity <= Decimal::ZERO {
                    return 0;
                }
                (c.equipment_quantity / c.quantity)
                    .floor()
                    .to_i64()
                    .unwrap_or(0)
            })
            .min()
            .unwrap_or(0)
    }

    // ---
    // Leituras
    // ---

    pub async fn list_with_details(&self) -> Result<Vec<CompositeItemDetail>, AppError> {
        let headers = self.repo.list_active().await?;
        let mut details = Vec::with_capacity(headers.len());
        for header in headers {
            let components = self.repo.list_components(&self.pool, header.id).await?;
            let availability = Self::compute_availability(&components);
            details.push(CompositeItemDetail {
                header,
                components,
                availability,
            });
        }
        Ok(details)
    }

    pub async fn get_detail(&self, id: Uuid) -> Result<CompositeItemDetail, AppError> {
        let header = self
            .repo
            .find_by_id(id)
            .await?
            .filter(|c| c.active)
            .ok_or_else(|| AppError::NotFound("Item composto".into()))?;
        let components = self.repo.list_components(&self.pool, id).await?;
        let availability = Self::compute_availability(&components);
        Ok(CompositeItemDetail {
            header,
            components,
            availability,
        })
    }

    // ---
    // Escritas
    // ---

    pub async fn create<'e, E>(
        &self,
        executor: E,
        name: &str,
        category_id: Option<Uuid>,
        description: Option<&str>,
        components: Vec<NewComponent>,
        created_by: Uuid,
    ) -> Result<CompositeItemDetail, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        self.validate_components(&components).await?;

        let mut tx = executor.begin().await?;
        let item = self
            .repo
            .create(&mut *tx, name, category_id, description, created_by)
            .await?;
        for component in &components {
            self.repo
                .insert_component(&mut *tx, item.id, component.equipment_id, component.quantity)
                .await?;
        }
        tx.commit().await?;

        self.get_detail(item.id).await
    }

    /// Atualiza o cabeçalho e troca o conjunto de componentes por inteiro
    /// (apaga e reinsere; não há diff parcial).
    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        name: &str,
        category_id: Option<Uuid>,
        description: Option<&str>,
        components: Vec<NewComponent>,
    ) -> Result<CompositeItemDetail, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        self.validate_components(&components).await?;

        let mut tx = executor.begin().await?;
        self.repo
            .update(&mut *tx, id, name, category_id, description)
            .await?;
        self.repo.delete_components(&mut *tx, id).await?;
        for component in &components {
            self.repo
                .insert_component(&mut *tx, id, component.equipment_id, component.quantity)
                .await?;
        }
        tx.commit().await?;

        self.get_detail(id).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.repo.soft_delete(&self.pool, id).await
    }

    // Todo equipamento referenciado precisa existir e estar ativo.
    async fn validate_components(&self, components: &[NewComponent]) -> Result<(), AppError> {
        if components.is_empty() {
            return Err(AppError::BusinessRule(
                "O kit precisa de ao menos um componente.".into(),
            ));
        }
        for component in components {
            if component.quantity <= Decimal::ZERO {
                return Err(AppError::BusinessRule(
                    "A quantidade de cada componente deve ser maior que zero.".into(),
                ));
            }
            let exists = self
                .equipment_repo
                .find_by_id(component.equipment_id)
                .await?
                .map(|e| e.active)
                .unwrap_or(false);
            if !exists {
                return Err(AppError::BusinessRule(format!(
                    "Equipamento {} não existe ou está inativo.",
                    component.equipment_id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(stock: &str, required: &str) -> CompositeComponentDetail {
        CompositeComponentDetail {
            id: Uuid::new_v4(),
            composite_id: Uuid::new_v4(),
            equipment_id: Uuid::new_v4(),
            equipment_name: "Equipamento".into(),
            equipment_unit: "un".into(),
            equipment_quantity: stock.parse().unwrap(),
            quantity: required.parse().unwrap(),
        }
    }

    #[test]
    fn availability_is_the_minimum_over_components() {
        // A exige 2 com saldo 5 (daria 2 kits); B exige 1 com saldo 1 (dá 1).
        let components = vec![component("5", "2"), component("1", "1")];
        assert_eq!(CompositeService::compute_availability(&components), 1);
    }

    #[test]
    fn availability_floors_partial_sets() {
        let components = vec![component("7", "2")];
        assert_eq!(CompositeService::compute_availability(&components), 3);
    }

    #[test]
    fn kit_without_components_is_unavailable() {
        assert_eq!(CompositeService::compute_availability(&[]), 0);
    }

    #[test]
    fn component_out_of_stock_zeroes_the_kit() {
        let components = vec![component("10", "1"), component("0", "2")];
        assert_eq!(CompositeService::compute_availability(&components), 0);
    }

    #[test]
    fn fractional_stock_counts_whole_sets_only() {
        let components = vec![component("2.5", "1")];
        assert_eq!(CompositeService::compute_availability(&components), 2);
    }
}
