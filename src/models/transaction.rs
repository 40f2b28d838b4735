// src/models/transaction.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::models::inventory::InventoryItem;

// --- Tipo da movimentação no livro-razão ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "ledger_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerType {
    In,
    Out,
    Adjust,
    Transfer,
    Reserve,
    Unreserve,
}

// --- Subtipo: cada um pertence a exatamente um LedgerType ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "ledger_sub_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerSubType {
    // IN
    Purchase,
    Return,
    Production,
    // OUT
    Sale,
    Consumption,
    Waste,
    Damaged,
    // ADJUST
    CountAdjust,
    LossAdjust,
    // TRANSFER
    WarehouseTransfer,
    // RESERVE
    OrderReserve,
    ProductionReserve,
    // UNRESERVE
    OrderRelease,
    ProductionRelease,
}

impl LedgerSubType {
    pub fn parent(self) -> LedgerType {
        match self {
            LedgerSubType::Purchase | LedgerSubType::Return | LedgerSubType::Production => {
                LedgerType::In
            }
            LedgerSubType::Sale
            | LedgerSubType::Consumption
            | LedgerSubType::Waste
            | LedgerSubType::Damaged => LedgerType::Out,
            LedgerSubType::CountAdjust | LedgerSubType::LossAdjust => LedgerType::Adjust,
            LedgerSubType::WarehouseTransfer => LedgerType::Transfer,
            LedgerSubType::OrderReserve | LedgerSubType::ProductionReserve => LedgerType::Reserve,
            LedgerSubType::OrderRelease | LedgerSubType::ProductionRelease => {
                LedgerType::Unreserve
            }
        }
    }
}

impl LedgerType {
    pub fn allows(self, sub_type: LedgerSubType) -> bool {
        sub_type.parent() == self
    }

    /// Subtipo usado quando o chamador não informa um.
    pub fn default_sub_type(self) -> LedgerSubType {
        match self {
            LedgerType::In => LedgerSubType::Production,
            LedgerType::Out => LedgerSubType::Consumption,
            LedgerType::Adjust => LedgerSubType::CountAdjust,
            LedgerType::Transfer => LedgerSubType::WarehouseTransfer,
            LedgerType::Reserve => LedgerSubType::OrderReserve,
            LedgerType::Unreserve => LedgerSubType::OrderRelease,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "transaction_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Approved,
    Completed,
    Cancelled,
}

// --- Movimentação de estoque (tabela 'stock_transactions') ---
// Registro imutável: não existe UPDATE nem DELETE para esta tabela.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockTransaction {
    pub id: Uuid,
    #[schema(example = "TXN17356896000001234")]
    pub transaction_id: String,
    pub item_id: Uuid,
    pub item_sku: String,
    pub ledger_type: LedgerType,
    pub sub_type: LedgerSubType,
    pub quantity: Decimal,
    // true quando a movimentação aumentou o saldo físico (INBOUND)
    pub inbound: bool,
    pub unit_cost: Decimal,
    pub total_value: Decimal,
    pub balance_after: Decimal,
    pub available_after: Decimal,
    pub reason: String,
    pub reference: String,
    pub notes: String,
    pub supplier_id: Option<Uuid>,
    pub customer_ref: Option<String>,
    pub created_by: Uuid,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

// Rascunho montado pelo TransactionRecorder e gravado pelo repositório.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub transaction_id: String,
    pub item_id: Uuid,
    pub item_sku: String,
    pub ledger_type: LedgerType,
    pub sub_type: LedgerSubType,
    pub quantity: Decimal,
    pub inbound: bool,
    pub unit_cost: Decimal,
    pub total_value: Decimal,
    pub balance_after: Decimal,
    pub available_after: Decimal,
    pub reason: String,
    pub reference: String,
    pub notes: String,
    pub supplier_id: Option<Uuid>,
    pub customer_ref: Option<String>,
    pub created_by: Uuid,
    pub status: TransactionStatus,
}

// Resposta de ajuste/reserva: o item atualizado e o lançamento gerado
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovementReceipt {
    pub item: InventoryItem,
    pub transaction: StockTransaction,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TransactionFilter {
    pub item_id: Option<Uuid>,
    pub ledger_type: Option<LedgerType>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryParams {
    /// Máximo de registros (padrão 50, máximo 200)
    pub limit: Option<i64>,
}

impl HistoryParams {
    pub const DEFAULT: i64 = 50;
    pub const MAX: i64 = 200;

    pub fn resolve(self) -> i64 {
        self.limit
            .filter(|l| *l >= 1)
            .unwrap_or(Self::DEFAULT)
            .min(Self::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_SUB_TYPES: [LedgerSubType; 14] = [
        LedgerSubType::Purchase,
        LedgerSubType::Return,
        LedgerSubType::Production,
        LedgerSubType::Sale,
        LedgerSubType::Consumption,
        LedgerSubType::Waste,
        LedgerSubType::Damaged,
        LedgerSubType::CountAdjust,
        LedgerSubType::LossAdjust,
        LedgerSubType::WarehouseTransfer,
        LedgerSubType::OrderReserve,
        LedgerSubType::ProductionReserve,
        LedgerSubType::OrderRelease,
        LedgerSubType::ProductionRelease,
    ];

    #[test]
    fn each_sub_type_belongs_to_exactly_one_type() {
        let types = [
            LedgerType::In,
            LedgerType::Out,
            LedgerType::Adjust,
            LedgerType::Transfer,
            LedgerType::Reserve,
            LedgerType::Unreserve,
        ];
        for sub in ALL_SUB_TYPES {
            let owners = types.iter().filter(|t| t.allows(sub)).count();
            assert_eq!(owners, 1, "{:?}", sub);
        }
    }

    #[test]
    fn default_sub_types_are_valid() {
        for t in [LedgerType::In, LedgerType::Out, LedgerType::Adjust, LedgerType::Reserve] {
            assert!(t.allows(t.default_sub_type()));
        }
        assert_eq!(LedgerType::In.default_sub_type(), LedgerSubType::Production);
        assert_eq!(LedgerType::Out.default_sub_type(), LedgerSubType::Consumption);
    }

    #[test]
    fn history_limit_is_bounded() {
        assert_eq!(HistoryParams { limit: None }.resolve(), 50);
        assert_eq!(HistoryParams { limit: Some(0) }.resolve(), 50);
        assert_eq!(HistoryParams { limit: Some(10_000) }.resolve(), 200);
    }

    #[test]
    fn wire_names_are_screaming_snake_case() {
        assert_eq!(serde_json::to_value(LedgerSubType::CountAdjust).unwrap(), "COUNT_ADJUST");
        assert_eq!(serde_json::to_value(LedgerType::Unreserve).unwrap(), "UNRESERVE");
        let parsed: LedgerSubType = serde_json::from_str("\"ORDER_RELEASE\"").unwrap();
        assert_eq!(parsed, LedgerSubType::OrderRelease);
    }
}
