// src/db/catalog_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_constraint_error, error::AppError},
    models::catalog::{Category, CreateCategoryPayload, CreateSupplierPayload, Supplier},
};

// Categorias e fornecedores referenciados pelos itens
#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // --- Categorias ---

    pub async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT * FROM categories WHERE is_active = TRUE ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    /// `code` já chega normalizado (maiúsculas).
    pub async fn create_category<'e, E>(
        &self,
        executor: E,
        payload: &CreateCategoryPayload,
        code: &str,
        actor: Uuid,
    ) -> Result<Category, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name, code, description, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(payload.name.trim())
        .bind(code)
        .bind(&payload.description)
        .bind(actor)
        .fetch_one(executor)
        .await
        .map_err(|e| map_constraint_error(e, &format!("categoria '{}' já existe", payload.name.trim())))
    }

    // --- Fornecedores ---

    pub async fn list_suppliers(&self) -> Result<Vec<Supplier>, AppError> {
        let suppliers = sqlx::query_as::<_, Supplier>(
            "SELECT * FROM suppliers WHERE is_active = TRUE ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(suppliers)
    }

    pub async fn create_supplier<'e, E>(
        &self,
        executor: E,
        payload: &CreateSupplierPayload,
        code: &str,
        actor: Uuid,
    ) -> Result<Supplier, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Supplier>(
            r#"
            INSERT INTO suppliers (
                name, code, contact_person, email, phone,
                street, city, state, zip_code, country,
                payment_terms, lead_time_days, rating, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
        .bind(payload.name.trim())
        .bind(code)
        .bind(&payload.contact_person)
        .bind(&payload.email)
        .bind(&payload.phone)
        .bind(&payload.address.street)
        .bind(&payload.address.city)
        .bind(&payload.address.state)
        .bind(&payload.address.zip_code)
        .bind(&payload.address.country)
        .bind(&payload.payment_terms)
        .bind(payload.lead_time_days.unwrap_or(7))
        .bind(payload.rating)
        .bind(actor)
        .fetch_one(executor)
        .await
        .map_err(|e| map_constraint_error(e, &format!("fornecedor '{}' já existe", code)))
    }
}
