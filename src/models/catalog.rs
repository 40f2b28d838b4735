// src/models/catalog.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- Categorias ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    #[schema(example = "Electronics")]
    pub name: String,
    #[schema(example = "ELEC")]
    pub code: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    #[validate(length(min = 1, max = 20, message = "O código deve ter entre 1 e 20 caracteres."))]
    pub code: String,
    pub description: Option<String>,
}

// --- Fornecedores ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: Uuid,
    #[schema(example = "TechCorp Solutions")]
    pub name: String,
    #[schema(example = "TECH001")]
    pub code: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[sqlx(flatten)]
    pub address: SupplierAddress,
    pub payment_terms: Option<String>,
    pub lead_time_days: i32,
    pub rating: Option<i16>,
    pub is_active: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplierAddress {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSupplierPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    #[validate(length(min = 1, max = 20, message = "O código deve ter entre 1 e 20 caracteres."))]
    pub code: String,
    pub contact_person: Option<String>,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub address: SupplierAddress,
    pub payment_terms: Option<String>,
    #[validate(range(min = 0, message = "O prazo de entrega não pode ser negativo."))]
    pub lead_time_days: Option<i32>,
    #[validate(range(min = 1, max = 5, message = "A avaliação deve ser de 1 a 5."))]
    pub rating: Option<i16>,
}
