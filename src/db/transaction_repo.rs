// src/db/transaction_repo.rs

use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_constraint_error, error::AppError, pagination::PageRequest},
    models::transaction::{NewTransaction, StockTransaction, TransactionFilter},
};

// Livro-razão: só existe INSERT e SELECT. Não há caminho de UPDATE/DELETE.
#[derive(Clone)]
pub struct TransactionRepository {
    pool: PgPool,
}

impl TransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Grava a movimentação. Devolve `None` quando o `transaction_id` já existe,
    /// para o chamador gerar outro e tentar de novo.
    pub async fn insert<'e, E>(
        &self,
        executor: E,
        draft: &NewTransaction,
    ) -> Result<Option<StockTransaction>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, StockTransaction>(
            r#"
            INSERT INTO stock_transactions (
                transaction_id, item_id, item_sku, ledger_type, sub_type,
                quantity, inbound, unit_cost, total_value,
                balance_after, available_after,
                reason, reference, notes, supplier_id, customer_ref,
                created_by, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            ON CONFLICT (transaction_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(&draft.transaction_id)
        .bind(draft.item_id)
        .bind(&draft.item_sku)
        .bind(draft.ledger_type)
        .bind(draft.sub_type)
        .bind(draft.quantity)
        .bind(draft.inbound)
        .bind(draft.unit_cost)
        .bind(draft.total_value)
        .bind(draft.balance_after)
        .bind(draft.available_after)
        .bind(&draft.reason)
        .bind(&draft.reference)
        .bind(&draft.notes)
        .bind(draft.supplier_id)
        .bind(&draft.customer_ref)
        .bind(draft.created_by)
        .bind(draft.status)
        .fetch_optional(executor)
        .await
        .map_err(|e| map_constraint_error(e, "movimentação"))
    }

    /// Histórico de um item, mais recente primeiro.
    pub async fn history<'e, E>(
        &self,
        executor: E,
        item_id: Uuid,
        limit: i64,
    ) -> Result<Vec<StockTransaction>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, StockTransaction>(
            r#"
            SELECT * FROM stock_transactions
            WHERE item_id = $1
            ORDER BY created_at DESC, transaction_id DESC
            LIMIT $2
            "#,
        )
        .bind(item_id)
        .bind(limit)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn list(
        &self,
        filter: &TransactionFilter,
        page: PageRequest,
    ) -> Result<(Vec<StockTransaction>, i64), AppError> {
        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM stock_transactions");
        push_transaction_filters(&mut count_query, filter);
        let total = count_query
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM stock_transactions");
        push_transaction_filters(&mut query, filter);
        query
            .push(" ORDER BY created_at DESC, transaction_id DESC LIMIT ")
            .push_bind(page.page_size)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = query
            .build_query_as::<StockTransaction>()
            .fetch_all(&self.pool)
            .await?;

        Ok((rows, total))
    }
}

fn push_transaction_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &TransactionFilter) {
    query.push(" WHERE TRUE");
    if let Some(item_id) = filter.item_id {
        query.push(" AND item_id = ").push_bind(item_id);
    }
    if let Some(ledger_type) = filter.ledger_type {
        query.push(" AND ledger_type = ").push_bind(ledger_type);
    }
}
