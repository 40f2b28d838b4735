// src/db/alert_repo.rs

use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::alert::{AlertFilter, NewAlert, StockAlert},
};

#[derive(Clone)]
pub struct AlertRepository {
    pool: PgPool,
}

impl AlertRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn open_for_item<'e, E>(&self, executor: E, item_id: Uuid) -> Result<Vec<StockAlert>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let alerts = sqlx::query_as::<_, StockAlert>(
            "SELECT * FROM stock_alerts WHERE item_id = $1 AND is_resolved = FALSE",
        )
        .bind(item_id)
        .fetch_all(executor)
        .await?;
        Ok(alerts)
    }

    /// Abre o alerta. Se já houver um aberto do mesmo tipo (índice parcial),
    /// nada é gravado e volta `None`.
    pub async fn insert<'e, E>(&self, executor: E, alert: &NewAlert) -> Result<Option<StockAlert>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let created = sqlx::query_as::<_, StockAlert>(
            r#"
            INSERT INTO stock_alerts (item_id, kind, priority, message, qty_at_trigger, threshold)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (item_id, kind) WHERE is_resolved = FALSE DO NOTHING
            RETURNING *
            "#,
        )
        .bind(alert.item_id)
        .bind(alert.kind)
        .bind(alert.priority)
        .bind(&alert.message)
        .bind(alert.qty_at_trigger)
        .bind(alert.threshold)
        .fetch_optional(executor)
        .await?;
        Ok(created)
    }

    pub async fn find_for_update<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<StockAlert>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let alert = sqlx::query_as::<_, StockAlert>("SELECT * FROM stock_alerts WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(alert)
    }

    /// Persiste a resolução. O `WHERE is_resolved = FALSE` garante que a
    /// transição aconteça uma única vez.
    pub async fn save_resolution<'e, E>(&self, executor: E, alert: &StockAlert) -> Result<StockAlert, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, StockAlert>(
            r#"
            UPDATE stock_alerts SET
                is_resolved = TRUE,
                resolved_at = $2,
                resolved_by = $3,
                resolution_notes = $4,
                action_taken = $5
            WHERE id = $1 AND is_resolved = FALSE
            RETURNING *
            "#,
        )
        .bind(alert.id)
        .bind(alert.resolved_at)
        .bind(alert.resolved_by)
        .bind(&alert.resolution_notes)
        .bind(alert.action_taken)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::AlreadyResolved(alert.id))
    }

    /// Prioridade mais alta primeiro, depois os mais novos.
    pub async fn list(&self, filter: &AlertFilter) -> Result<Vec<StockAlert>, AppError> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM stock_alerts WHERE TRUE");
        if let Some(resolved) = filter.resolved {
            query.push(" AND is_resolved = ").push_bind(resolved);
        }
        if let Some(priority) = filter.priority {
            query.push(" AND priority = ").push_bind(priority);
        }
        if let Some(item_id) = filter.item_id {
            query.push(" AND item_id = ").push_bind(item_id);
        }
        query.push(" ORDER BY priority DESC, created_at DESC");

        let alerts = query
            .build_query_as::<StockAlert>()
            .fetch_all(&self.pool)
            .await?;
        Ok(alerts)
    }
}
