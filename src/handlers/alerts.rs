// src/handlers/alerts.rs

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::alert::{AlertFilter, ResolveAlertPayload, StockAlert},
};

// GET /api/alerts
#[utoipa::path(
    get,
    path = "/api/alerts",
    tag = "Alerts",
    params(AlertFilter),
    responses(
        (status = 200, description = "Alertas, prioridade mais alta primeiro", body = Vec<StockAlert>)
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn list_alerts(
    State(app_state): State<AppState>,
    Query(filter): Query<AlertFilter>,
) -> Result<Json<Vec<StockAlert>>, AppError> {
    let alerts = app_state.inventory_service.list_alerts(filter).await?;
    Ok(Json(alerts))
}

// PUT /api/alerts/{id}/resolve
#[utoipa::path(
    put,
    path = "/api/alerts/{id}/resolve",
    tag = "Alerts",
    request_body = ResolveAlertPayload,
    params(("id" = Uuid, Path, description = "ID do alerta")),
    responses(
        (status = 200, body = StockAlert),
        (status = 404, description = "Alerta não encontrado"),
        (status = 409, description = "Alerta já resolvido")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn resolve_alert(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    payload: Option<Json<ResolveAlertPayload>>,
) -> Result<Json<StockAlert>, AppError> {
    // Corpo opcional: sem corpo = sem notas, ação OTHER
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    payload.validate()?;

    let alert = app_state
        .inventory_service
        .resolve_alert(id, payload, user.id)
        .await?;

    Ok(Json(alert))
}
