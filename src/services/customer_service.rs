// src/services/customer_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CustomerRepository, customer_repo::CustomerData},
    models::customer::Customer,
};

#[derive(Clone)]
pub struct CustomerService {
    repo: CustomerRepository,
    pool: PgPool,
}

impl CustomerService {
    pub fn new(repo: CustomerRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    /// Reduz o CNPJ a dígitos; máscara e espaços são descartados.
    /// Campo vazio vira None, o que libera o número para outro cadastro.
    fn normalize_cnpj(raw: Option<&str>) -> Option<String> {
        let digits: String = raw?
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect();
        if digits.is_empty() { None } else { Some(digits) }
    }

    pub async fn list(&self) -> Result<Vec<Customer>, AppError> {
        self.repo.list_active().await
    }

    pub async fn get(&self, id: Uuid) -> Result<Customer, AppError> {
        self.repo
            .find_by_id(id)
            .await?
            .filter(|c| c.active)
            .ok_or_else(|| AppError::NotFound("Cliente".into()))
    }

    pub async fn create(&self, data: &CustomerData<'_>, cnpj: Option<&str>) -> Result<Customer, AppError> {
        let normalized = Self::normalize_cnpj(cnpj);

        if let Some(cnpj) = normalized.as_deref() {
            if self.repo.find_by_cnpj(&self.pool, cnpj).await?.is_some() {
                return Err(AppError::Conflict("Já existe um cliente com este CNPJ.".into()));
            }
        }

        let data = CustomerData {
            cnpj: normalized.as_deref(),
            ..*data
        };
        self.repo.create(&self.pool, &data).await
    }

    pub async fn update(
        &self,
        id: Uuid,
        data: &CustomerData<'_>,
        cnpj: Option<&str>,
    ) -> Result<Customer, AppError> {
        // 404 antes do 409: cliente inexistente ou já desativado.
        self.get(id).await?;

        let normalized = Self::normalize_cnpj(cnpj);
        if let Some(cnpj) = normalized.as_deref() {
            if let Some(other) = self.repo.find_by_cnpj(&self.pool, cnpj).await? {
                if other.id != id {
                    return Err(AppError::Conflict("Já existe um cliente com este CNPJ.".into()));
                }
            }
        }

        let data = CustomerData {
            cnpj: normalized.as_deref(),
            ..*data
        };
        self.repo.update(&self.pool, id, &data).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.repo.soft_delete(&self.pool, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cnpj_mask_is_stripped() {
        assert_eq!(
            CustomerService::normalize_cnpj(Some("12.345.678/0001-90")),
            Some("12345678000190".to_string())
        );
    }

    #[test]
    fn plain_digits_pass_through() {
        assert_eq!(
            CustomerService::normalize_cnpj(Some("12345678000190")),
            Some("12345678000190".to_string())
        );
    }

    #[test]
    fn empty_or_missing_cnpj_becomes_none() {
        assert_eq!(CustomerService::normalize_cnpj(None), None);
        assert_eq!(CustomerService::normalize_cnpj(Some("")), None);
        assert_eq!(CustomerService::normalize_cnpj(Some("  ")), None);
        assert_eq!(CustomerService::normalize_cnpj(Some("n/a")), None);
    }
}
