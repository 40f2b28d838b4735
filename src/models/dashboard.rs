// src/models/dashboard.rs

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::transaction::StockTransaction;

// Números do painel principal
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_items: i64,        // Itens ativos
    pub low_stock_count: i64,    // Ativos com 0 < qtyOnHand <= minThreshold
    pub out_of_stock_count: i64, // Ativos com qtyOnHand = 0
    pub total_value: Decimal,    // Σ qtyOnHand × unitCost dos ativos
    pub recent_transactions: Vec<StockTransaction>,
    pub open_alert_count: i64,
}
