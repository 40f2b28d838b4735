// src/handlers/transactions.rs

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    common::{
        error::AppError,
        pagination::{PageParams, Paginated},
    },
    config::AppState,
    models::transaction::{StockTransaction, TransactionFilter},
};

// GET /api/transactions
#[utoipa::path(
    get,
    path = "/api/transactions",
    tag = "Transactions",
    params(PageParams, TransactionFilter),
    responses(
        (status = 200, description = "Livro-razão paginado, mais recente primeiro", body = Paginated<StockTransaction>)
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn list_transactions(
    State(app_state): State<AppState>,
    Query(page): Query<PageParams>,
    Query(filter): Query<TransactionFilter>,
) -> Result<Json<Paginated<StockTransaction>>, AppError> {
    let rows = app_state
        .inventory_service
        .list_transactions(filter, page)
        .await?;
    Ok(Json(rows))
}
