// src/handlers/catalog.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::catalog::{Category, CreateCategoryPayload, CreateSupplierPayload, Supplier},
};

// --- Categorias ---

#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "Catalog",
    responses((status = 200, body = Vec<Category>)),
    security(("api_jwt" = []))
)]
pub async fn list_categories(State(app_state): State<AppState>) -> Result<Json<Vec<Category>>, AppError> {
    let categories = app_state.catalog_service.list_categories().await?;
    Ok(Json(categories))
}

#[utoipa::path(
    post,
    path = "/api/categories",
    tag = "Catalog",
    request_body = CreateCategoryPayload,
    responses(
        (status = 201, body = Category),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "Nome ou código já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_category(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateCategoryPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let category = app_state
        .catalog_service
        .create_category(payload, user.id)
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

// --- Fornecedores ---

#[utoipa::path(
    get,
    path = "/api/suppliers",
    tag = "Catalog",
    responses((status = 200, body = Vec<Supplier>)),
    security(("api_jwt" = []))
)]
pub async fn list_suppliers(State(app_state): State<AppState>) -> Result<Json<Vec<Supplier>>, AppError> {
    let suppliers = app_state.catalog_service.list_suppliers().await?;
    Ok(Json(suppliers))
}

#[utoipa::path(
    post,
    path = "/api/suppliers",
    tag = "Catalog",
    request_body = CreateSupplierPayload,
    responses(
        (status = 201, body = Supplier),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "Código já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_supplier(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateSupplierPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let supplier = app_state
        .catalog_service
        .create_supplier(payload, user.id)
        .await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}
