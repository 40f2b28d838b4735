// src/services/catalog_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::CatalogRepository,
    models::catalog::{Category, CreateCategoryPayload, CreateSupplierPayload, Supplier},
};

#[derive(Clone)]
pub struct CatalogService {
    repo: CatalogRepository,
    pool: sqlx::PgPool,
}

impl CatalogService {
    pub fn new(repo: CatalogRepository, pool: sqlx::PgPool) -> Self {
        Self { repo, pool }
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        self.repo.list_categories().await
    }

    pub async fn create_category(
        &self,
        payload: CreateCategoryPayload,
        actor: Uuid,
    ) -> Result<Category, AppError> {
        let code = normalize_code(&payload.code)?;
        let category = self
            .repo
            .create_category(&self.pool, &payload, &code, actor)
            .await?;
        tracing::info!("🏷️ Categoria {} ({}) criada", category.name, category.code);
        Ok(category)
    }

    pub async fn list_suppliers(&self) -> Result<Vec<Supplier>, AppError> {
        self.repo.list_suppliers().await
    }

    pub async fn create_supplier(
        &self,
        payload: CreateSupplierPayload,
        actor: Uuid,
    ) -> Result<Supplier, AppError> {
        let code = normalize_code(&payload.code)?;
        let supplier = self
            .repo
            .create_supplier(&self.pool, &payload, &code, actor)
            .await?;
        tracing::info!("🚚 Fornecedor {} ({}) criado", supplier.name, supplier.code);
        Ok(supplier)
    }
}

// Códigos de categoria/fornecedor são únicos em maiúsculas
fn normalize_code(raw: &str) -> Result<String, AppError> {
    let code = raw.trim().to_uppercase();
    if code.is_empty() {
        return Err(AppError::ValidationFailed("o código é obrigatório".into()));
    }
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_trimmed_and_uppercased() {
        assert_eq!(normalize_code(" elec ").unwrap(), "ELEC");
        assert!(matches!(normalize_code("   "), Err(AppError::ValidationFailed(_))));
    }
}
