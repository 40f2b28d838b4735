// src/db/inventory_repo.rs

use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{like_pattern, map_constraint_error},
        error::AppError,
        pagination::PageRequest,
    },
    models::inventory::{InventoryItem, ItemFilter},
};

#[derive(Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Funções de "Leitura" (Getters)
    // ---

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<InventoryItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, InventoryItem>("SELECT * FROM items WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(item.map(InventoryItem::with_status))
    }

    /// Trava a linha do item até o fim da transação.
    /// Toda mutação de quantidade passa por aqui antes de calcular o novo saldo.
    pub async fn find_for_update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<InventoryItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, InventoryItem>("SELECT * FROM items WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(item.map(InventoryItem::with_status))
    }

    /// Listagem paginada. Ordem total (updated_at, id) para a paginação não
    /// repetir nem pular itens.
    pub async fn list(
        &self,
        filter: &ItemFilter,
        page: PageRequest,
    ) -> Result<(Vec<InventoryItem>, i64), AppError> {
        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM items");
        push_item_filters(&mut count_query, filter);
        let total = count_query
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM items");
        push_item_filters(&mut query, filter);
        query
            .push(" ORDER BY updated_at DESC, id ASC LIMIT ")
            .push_bind(page.page_size)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let items = query
            .build_query_as::<InventoryItem>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(InventoryItem::with_status)
            .collect();

        Ok((items, total))
    }

    // ---
    // Funções de "Escrita" (Transacionais)
    // ---
    // Rodam dentro da transação aberta pelo InventoryService.

    pub async fn insert<'e, E>(&self, executor: E, item: &InventoryItem) -> Result<InventoryItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let created = sqlx::query_as::<_, InventoryItem>(
            r#"
            INSERT INTO items (
                sku, name, description, category_id, item_type, unit,
                unit_cost, selling_price,
                qty_on_hand, qty_reserved, qty_ordered, qty_available,
                min_threshold, max_threshold, reorder_point,
                supplier_id, warehouse, aisle, shelf,
                is_active, is_hazardous, hazard_info, tags, lead_time_days,
                created_by, updated_by
            )
            VALUES (
                $1, $2, $3, $4, $5, $6,
                $7, $8,
                $9, $10, $11, $12,
                $13, $14, $15,
                $16, $17, $18, $19,
                $20, $21, $22, $23, $24,
                $25, $26
            )
            RETURNING *
            "#,
        )
        .bind(&item.sku)
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.category_id)
        .bind(item.item_type)
        .bind(&item.unit)
        .bind(item.unit_cost)
        .bind(item.selling_price)
        .bind(item.qty_on_hand)
        .bind(item.qty_reserved)
        .bind(item.qty_ordered)
        .bind(item.qty_available)
        .bind(item.min_threshold)
        .bind(item.max_threshold)
        .bind(item.reorder_point)
        .bind(item.supplier_id)
        .bind(&item.location.warehouse)
        .bind(&item.location.aisle)
        .bind(&item.location.shelf)
        .bind(item.is_active)
        .bind(item.is_hazardous)
        .bind(&item.hazard_info)
        .bind(&item.tags)
        .bind(item.lead_time_days)
        .bind(item.created_by)
        .bind(item.updated_by)
        .fetch_one(executor)
        .await
        .map_err(|e| map_constraint_error(e, &format!("SKU '{}' já existe", item.sku)))?;

        Ok(created.with_status())
    }

    /// Grava o estado completo do item e incrementa `version`.
    pub async fn update<'e, E>(&self, executor: E, item: &InventoryItem) -> Result<InventoryItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let updated = sqlx::query_as::<_, InventoryItem>(
            r#"
            UPDATE items SET
                sku = $2, name = $3, description = $4, category_id = $5,
                item_type = $6, unit = $7, unit_cost = $8, selling_price = $9,
                qty_on_hand = $10, qty_reserved = $11, qty_ordered = $12, qty_available = $13,
                min_threshold = $14, max_threshold = $15, reorder_point = $16,
                supplier_id = $17, warehouse = $18, aisle = $19, shelf = $20,
                is_active = $21, is_hazardous = $22, hazard_info = $23,
                tags = $24, lead_time_days = $25,
                updated_by = $26,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(item.id)
        .bind(&item.sku)
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.category_id)
        .bind(item.item_type)
        .bind(&item.unit)
        .bind(item.unit_cost)
        .bind(item.selling_price)
        .bind(item.qty_on_hand)
        .bind(item.qty_reserved)
        .bind(item.qty_ordered)
        .bind(item.qty_available)
        .bind(item.min_threshold)
        .bind(item.max_threshold)
        .bind(item.reorder_point)
        .bind(item.supplier_id)
        .bind(&item.location.warehouse)
        .bind(&item.location.aisle)
        .bind(&item.location.shelf)
        .bind(item.is_active)
        .bind(item.is_hazardous)
        .bind(&item.hazard_info)
        .bind(&item.tags)
        .bind(item.lead_time_days)
        .bind(item.updated_by)
        .fetch_optional(executor)
        .await
        .map_err(|e| map_constraint_error(e, &format!("SKU '{}' já existe", item.sku)))?
        .ok_or_else(|| AppError::NotFound(format!("item {}", item.id)))?;

        Ok(updated.with_status())
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("item {}", id)));
        }
        Ok(())
    }
}

fn push_item_filters<'a>(query: &mut QueryBuilder<'a, Postgres>, filter: &'a ItemFilter) {
    query.push(" WHERE TRUE");

    if !filter.include_inactive {
        query.push(" AND is_active = TRUE");
    }
    if let Some(item_type) = filter.item_type {
        query.push(" AND item_type = ").push_bind(item_type);
    }
    if let Some(category_id) = filter.category_id {
        query.push(" AND category_id = ").push_bind(category_id);
    }
    if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let pattern = like_pattern(term);
        query
            .push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR sku ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    match filter.low_stock {
        Some(true) => {
            query.push(" AND qty_on_hand <= min_threshold");
        }
        Some(false) => {
            query.push(" AND qty_on_hand > min_threshold");
        }
        None => {}
    }
    if let Some(hazardous) = filter.hazardous {
        query.push(" AND is_hazardous = ").push_bind(hazardous);
    }
    match filter.reserved {
        Some(true) => {
            query.push(" AND qty_reserved > 0");
        }
        Some(false) => {
            query.push(" AND qty_reserved = 0");
        }
        None => {}
    }
    match filter.available {
        Some(true) => {
            query.push(" AND qty_available > 0");
        }
        Some(false) => {
            query.push(" AND qty_available <= 0");
        }
        None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_render_in_a_stable_order() {
        let filter = ItemFilter {
            search: Some("  bolt ".into()),
            low_stock: Some(true),
            reserved: Some(false),
            ..Default::default()
        };
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM items");
        push_item_filters(&mut query, &filter);

        assert_eq!(
            query.sql(),
            "SELECT COUNT(*) FROM items WHERE TRUE AND is_active = TRUE \
             AND (name ILIKE $1 OR sku ILIKE $2) \
             AND qty_on_hand <= min_threshold AND qty_reserved = 0"
        );
    }

    #[test]
    fn include_inactive_drops_the_active_clause() {
        let filter = ItemFilter {
            include_inactive: true,
            ..Default::default()
        };
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM items");
        push_item_filters(&mut query, &filter);
        assert_eq!(query.sql(), "SELECT * FROM items WHERE TRUE");
    }

    #[test]
    fn blank_search_is_ignored() {
        let filter = ItemFilter {
            search: Some("   ".into()),
            ..Default::default()
        };
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM items");
        push_item_filters(&mut query, &filter);
        assert!(!query.sql().contains("ILIKE"));
    }
}
