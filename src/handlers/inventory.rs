// src/handlers/inventory.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        pagination::{PageParams, Paginated},
    },
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::{
        inventory::{
            AdjustStockPayload, DeleteConfirmation, InventoryItem, ItemFilter, ItemPatch, NewItem,
            ReservationPayload,
        },
        transaction::{HistoryParams, MovementReceipt, StockTransaction},
    },
};

// ---
// Handler: create_item
// ---
#[utoipa::path(
    post,
    path = "/api/inventory",
    tag = "Inventory",
    request_body = NewItem,
    responses(
        (status = 201, description = "Item criado com o lançamento de estoque inicial", body = InventoryItem),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "SKU já existe"),
        (status = 422, description = "Quantidade inválida")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn create_item(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<NewItem>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let item = app_state
        .inventory_service
        .create_item(payload, user.id)
        .await?;

    Ok((StatusCode::CREATED, Json(item)))
}

// ---
// Handler: list_items
// ---
#[utoipa::path(
    get,
    path = "/api/inventory",
    tag = "Inventory",
    params(PageParams, ItemFilter),
    responses(
        (status = 200, description = "Página de itens", body = Paginated<InventoryItem>)
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn list_items(
    State(app_state): State<AppState>,
    Query(page): Query<PageParams>,
    Query(filter): Query<ItemFilter>,
) -> Result<Json<Paginated<InventoryItem>>, AppError> {
    let items = app_state.inventory_service.list_items(filter, page).await?;
    Ok(Json(items))
}

#[utoipa::path(
    get,
    path = "/api/inventory/{id}",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID do item")),
    responses(
        (status = 200, body = InventoryItem),
        (status = 404, description = "Item não encontrado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_item(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<InventoryItem>, AppError> {
    let item = app_state.inventory_service.get_item(id).await?;
    Ok(Json(item))
}

// ---
// Handler: update_item
// ---
// Mudar `qtyOnHand` gera um lançamento IN/OUT; o resto é só cadastro.
#[utoipa::path(
    put,
    path = "/api/inventory/{id}",
    tag = "Inventory",
    request_body = ItemPatch,
    params(("id" = Uuid, Path, description = "ID do item")),
    responses(
        (status = 200, body = InventoryItem),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Item não encontrado"),
        (status = 409, description = "SKU já existe"),
        (status = 422, description = "Quantidade inválida")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn update_item(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<ItemPatch>,
) -> Result<Json<InventoryItem>, AppError> {
    patch.validate()?;

    let item = app_state
        .inventory_service
        .update_item(id, patch, user.id)
        .await?;

    Ok(Json(item))
}

#[utoipa::path(
    delete,
    path = "/api/inventory/{id}",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID do item")),
    responses(
        (status = 200, body = DeleteConfirmation),
        (status = 404, description = "Item não encontrado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn delete_item(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteConfirmation>, AppError> {
    let confirmation = app_state.inventory_service.delete_item(id, user.id).await?;
    Ok(Json(confirmation))
}

// ---
// Movimentações avulsas
// ---
#[utoipa::path(
    post,
    path = "/api/inventory/{id}/adjust",
    tag = "Inventory",
    request_body = AdjustStockPayload,
    params(("id" = Uuid, Path, description = "ID do item")),
    responses(
        (status = 200, description = "Saldo ajustado", body = MovementReceipt),
        (status = 400, description = "Tipo/subtipo inválido"),
        (status = 404, description = "Item não encontrado"),
        (status = 422, description = "Saldo ficaria negativo")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn adjust_stock(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdjustStockPayload>,
) -> Result<Json<MovementReceipt>, AppError> {
    payload.validate()?;

    let receipt = app_state
        .inventory_service
        .adjust_stock(id, payload, user.id)
        .await?;

    Ok(Json(receipt))
}

#[utoipa::path(
    post,
    path = "/api/inventory/{id}/reserve",
    tag = "Inventory",
    request_body = ReservationPayload,
    params(("id" = Uuid, Path, description = "ID do item")),
    responses(
        (status = 200, description = "Quantidade reservada", body = MovementReceipt),
        (status = 404, description = "Item não encontrado"),
        (status = 422, description = "Reserva maior que o saldo")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn reserve_stock(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReservationPayload>,
) -> Result<Json<MovementReceipt>, AppError> {
    payload.validate()?;

    let receipt = app_state
        .inventory_service
        .reserve_stock(id, payload, user.id)
        .await?;

    Ok(Json(receipt))
}

#[utoipa::path(
    post,
    path = "/api/inventory/{id}/release",
    tag = "Inventory",
    request_body = ReservationPayload,
    params(("id" = Uuid, Path, description = "ID do item")),
    responses(
        (status = 200, description = "Reserva liberada", body = MovementReceipt),
        (status = 404, description = "Item não encontrado"),
        (status = 422, description = "Liberação maior que o reservado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn release_stock(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReservationPayload>,
) -> Result<Json<MovementReceipt>, AppError> {
    payload.validate()?;

    let receipt = app_state
        .inventory_service
        .release_stock(id, payload, user.id)
        .await?;

    Ok(Json(receipt))
}

// Histórico do item, mais recente primeiro
#[utoipa::path(
    get,
    path = "/api/inventory/{id}/transactions",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID do item"), HistoryParams),
    responses(
        (status = 200, body = Vec<StockTransaction>)
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn item_history(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<StockTransaction>>, AppError> {
    let history = app_state
        .inventory_service
        .item_history(id, params.resolve())
        .await?;
    Ok(Json(history))
}
