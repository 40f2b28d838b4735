// src/services/transaction_recorder.rs

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        inventory::{fits_numeric, InventoryItem},
        transaction::{NewTransaction, TransactionStatus},
    },
    services::ledger::LedgerPlan,
};

/// Tentativas de gravação quando o `transaction_id` colide.
pub const MAX_ID_ATTEMPTS: usize = 5;

// Dados da movimentação que vêm do chamador (motivo, referência...)
#[derive(Debug, Clone, Default)]
pub struct EntryDetails {
    pub reason: String,
    pub reference: Option<String>,
    pub notes: Option<String>,
    /// Se não vier, usa o custo unitário atual do item
    pub unit_cost: Option<Decimal>,
    pub supplier_id: Option<Uuid>,
    pub customer_ref: Option<String>,
}

impl EntryDetails {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            ..Default::default()
        }
    }

    pub fn with_reference(mut self, reference: Option<String>) -> Self {
        self.reference = reference;
        self
    }
}

/// `TXN` + 13 dígitos de epoch em ms + 4 dígitos aleatórios.
/// Ordenável lexicograficamente pelo tempo.
pub fn generate_transaction_id() -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix = Uuid::new_v4().as_u128() % 10_000;
    format!("TXN{:013}{:04}", millis, suffix)
}

/// Monta o registro de auditoria a partir do item JÁ com o saldo novo.
pub fn record(
    item: &InventoryItem,
    plan: &LedgerPlan,
    details: &EntryDetails,
    actor: Uuid,
) -> Result<NewTransaction, AppError> {
    if !plan.ledger_type.allows(plan.sub_type) {
        return Err(AppError::InvalidSubType {
            ledger_type: plan.ledger_type,
            sub_type: plan.sub_type,
        });
    }

    let reason = details.reason.trim();
    if reason.is_empty() {
        return Err(AppError::ValidationFailed(
            "o motivo da movimentação é obrigatório".into(),
        ));
    }

    let unit_cost = details.unit_cost.unwrap_or(item.unit_cost);
    if unit_cost < Decimal::ZERO {
        return Err(AppError::ValidationFailed(
            "o custo unitário não pode ser negativo".into(),
        ));
    }
    if !fits_numeric(unit_cost) {
        return Err(AppError::ValidationFailed(format!(
            "custo unitário fora do limite armazenável ({})",
            unit_cost
        )));
    }

    // NUMERIC(18, 4) no banco
    let total_value = plan
        .quantity
        .checked_mul(unit_cost)
        .map(|total| total.round_dp(4))
        .filter(|total| fits_numeric(*total))
        .ok_or_else(|| {
            AppError::ValidationFailed(format!(
                "valor total ({} x {}) fora do limite armazenável",
                plan.quantity, unit_cost
            ))
        })?;

    Ok(NewTransaction {
        transaction_id: generate_transaction_id(),
        item_id: item.id,
        item_sku: item.sku.clone(),
        ledger_type: plan.ledger_type,
        sub_type: plan.sub_type,
        quantity: plan.quantity,
        inbound: plan.inbound,
        unit_cost,
        total_value,
        balance_after: item.qty_on_hand,
        available_after: item.qty_available,
        reason: reason.to_string(),
        reference: details.reference.clone().unwrap_or_default(),
        notes: details.notes.clone().unwrap_or_default(),
        supplier_id: details.supplier_id,
        customer_ref: details.customer_ref.clone(),
        created_by: actor,
        status: TransactionStatus::Completed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::inventory::{tests::sample_item, StockLevels};
    use crate::models::transaction::{LedgerSubType, LedgerType};
    use crate::services::ledger::{plan, StockMutation};
    use rust_decimal_macros::dec;

    #[test]
    fn transaction_id_has_the_expected_shape() {
        let id = generate_transaction_id();
        assert_eq!(id.len(), 3 + 13 + 4);
        assert!(id.starts_with("TXN"));
        assert!(id[3..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn transaction_ids_sort_by_time() {
        let first = generate_transaction_id();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = generate_transaction_id();
        assert!(first < second);
    }

    #[test]
    fn snapshot_comes_from_the_post_mutation_item() {
        // Cenário: criação com 100 e saída para 3
        let mut item = sample_item(dec!(100), dec!(5), dec!(1000));
        let p = plan(item.levels(), StockMutation::QuantitySet { target: dec!(3) })
            .unwrap()
            .unwrap();
        item.apply_levels(p.after);

        let actor = Uuid::new_v4();
        let draft = record(&item, &p, &EntryDetails::new("Contagem"), actor).unwrap();

        assert_eq!(draft.ledger_type, LedgerType::Out);
        assert_eq!(draft.sub_type, LedgerSubType::Consumption);
        assert_eq!(draft.quantity, dec!(97));
        assert_eq!(draft.balance_after, dec!(3));
        assert_eq!(draft.available_after, dec!(3));
        assert_eq!(draft.item_sku, "SKU001");
        assert_eq!(draft.created_by, actor);
        assert_eq!(draft.status, TransactionStatus::Completed);
    }

    #[test]
    fn total_value_uses_item_cost_by_default() {
        let mut item = sample_item(dec!(10), dec!(5), dec!(1000));
        let p = plan(item.levels(), StockMutation::QuantityDelta { delta: dec!(4), movement: None })
            .unwrap()
            .unwrap();
        item.apply_levels(p.after);

        let draft = record(&item, &p, &EntryDetails::new("Compra"), Uuid::new_v4()).unwrap();
        assert_eq!(draft.unit_cost, dec!(2.5));
        assert_eq!(draft.total_value, dec!(10));

        let details = EntryDetails {
            unit_cost: Some(dec!(3.125)),
            ..EntryDetails::new("Compra")
        };
        let draft = record(&item, &p, &details, Uuid::new_v4()).unwrap();
        assert_eq!(draft.total_value, dec!(12.5));
    }

    #[test]
    fn oversized_cost_is_a_validation_error() {
        let mut item = sample_item(dec!(10), dec!(5), dec!(1000));
        let p = plan(item.levels(), StockMutation::QuantityDelta { delta: dec!(2), movement: None })
            .unwrap()
            .unwrap();
        item.apply_levels(p.after);

        // Estouraria o Decimal na multiplicação
        let details = EntryDetails {
            unit_cost: Some(Decimal::from_f64_retain(7e28).unwrap()),
            ..EntryDetails::new("Compra")
        };
        let err = record(&item, &p, &details, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, AppError::ValidationFailed(_)));

        // Cabe no Decimal mas não na coluna do total
        let details = EntryDetails {
            unit_cost: Some(dec!(99999999999999)),
            ..EntryDetails::new("Compra")
        };
        let err = record(&item, &p, &details, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, AppError::ValidationFailed(_)));

        // Custo do próprio item também passa pela checagem
        item.unit_cost = dec!(0.00001);
        let err = record(&item, &p, &EntryDetails::new("Compra"), Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, AppError::ValidationFailed(_)));
    }

    #[test]
    fn mismatched_sub_type_is_rejected() {
        let item = sample_item(dec!(10), dec!(5), dec!(1000));
        let bad = LedgerPlan {
            after: item.levels(),
            ledger_type: LedgerType::In,
            sub_type: LedgerSubType::Sale,
            quantity: dec!(1),
            inbound: true,
        };
        let err = record(&item, &bad, &EntryDetails::new("x"), Uuid::new_v4()).unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidSubType { ledger_type: LedgerType::In, sub_type: LedgerSubType::Sale }
        ));
    }

    #[test]
    fn blank_reason_is_rejected() {
        let item = sample_item(dec!(10), dec!(5), dec!(1000));
        let p = plan(item.levels(), StockMutation::Reserve { quantity: dec!(1), sub_type: None })
            .unwrap()
            .unwrap();
        let err = record(&item, &p, &EntryDetails::new("   "), Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, AppError::ValidationFailed(_)));
    }

    #[test]
    fn delete_records_a_zero_balance() {
        let mut item = sample_item(dec!(12), dec!(5), dec!(1000));
        item.apply_levels(StockLevels::new(dec!(12), dec!(2)));
        let p = plan(item.levels(), StockMutation::Delete).unwrap().unwrap();
        item.apply_levels(p.after);

        let draft = record(&item, &p, &EntryDetails::new("Item excluído"), Uuid::new_v4()).unwrap();
        assert_eq!(draft.quantity, dec!(12));
        assert_eq!(draft.balance_after, Decimal::ZERO);
        assert_eq!(draft.available_after, Decimal::ZERO);
        assert!(!draft.inbound);
    }
}
