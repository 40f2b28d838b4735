// src/db/dashboard_repo.rs

use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    models::{dashboard::DashboardStats, transaction::StockTransaction},
};

const RECENT_TRANSACTIONS: i64 = 10;

#[derive(Clone)]
pub struct DashboardRepository {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct ItemTotals {
    total_items: i64,
    low_stock_count: i64,
    out_of_stock_count: i64,
    total_value: Decimal,
}

impl DashboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Resumo geral, lido num único snapshot somente-leitura
    pub async fn get_stats(&self) -> Result<DashboardStats, AppError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        // A. Contagens e valor dos itens ativos
        let totals = sqlx::query_as::<_, ItemTotals>(
            r#"
            SELECT
                COUNT(*) AS total_items,
                COUNT(*) FILTER (WHERE qty_on_hand > 0 AND qty_on_hand <= min_threshold) AS low_stock_count,
                COUNT(*) FILTER (WHERE qty_on_hand = 0) AS out_of_stock_count,
                COALESCE(SUM(qty_on_hand * unit_cost), 0) AS total_value
            FROM items
            WHERE is_active = TRUE
            "#,
        )
        .fetch_one(&mut *tx)
        .await?;

        // B. Últimas movimentações
        let recent_transactions = sqlx::query_as::<_, StockTransaction>(
            "SELECT * FROM stock_transactions ORDER BY created_at DESC, transaction_id DESC LIMIT $1",
        )
        .bind(RECENT_TRANSACTIONS)
        .fetch_all(&mut *tx)
        .await?;

        // C. Alertas em aberto
        let open_alert_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM stock_alerts WHERE is_resolved = FALSE",
        )
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(DashboardStats {
            total_items: totals.total_items,
            low_stock_count: totals.low_stock_count,
            out_of_stock_count: totals.out_of_stock_count,
            total_value: totals.total_value,
            recent_transactions,
            open_alert_count,
        })
    }
}
