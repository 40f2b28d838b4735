// src/services/alert_evaluator.rs

use uuid::Uuid;

use crate::models::{
    alert::{AlertKind, AlertPriority, NewAlert, StockAlert},
    inventory::InventoryItem,
};

#[derive(Debug, Clone, PartialEq)]
pub enum AlertAction {
    None,
    Opened(NewAlert),
    /// Já existe um alerta aberto do mesmo tipo
    Unchanged(Uuid),
}

/// Condição de alerta do item, na ordem: zerado > baixo > excesso.
pub fn condition(item: &InventoryItem) -> Option<(AlertKind, AlertPriority)> {
    if item.qty_on_hand.is_zero() {
        Some((AlertKind::OutOfStock, AlertPriority::Critical))
    } else if item.qty_on_hand <= item.min_threshold {
        Some((AlertKind::LowStock, AlertPriority::Medium))
    } else if item.qty_on_hand >= item.max_threshold {
        Some((AlertKind::Overstock, AlertPriority::Low))
    } else {
        None
    }
}

/// Decide se um alerta novo precisa ser aberto. Nunca resolve alertas:
/// a resolução é sempre manual.
pub fn reconcile(item: &InventoryItem, open_alerts: &[StockAlert]) -> AlertAction {
    let Some((kind, priority)) = condition(item) else {
        return AlertAction::None;
    };

    if let Some(existing) = open_alerts
        .iter()
        .find(|a| a.item_id == item.id && a.kind == kind && !a.is_resolved)
    {
        return AlertAction::Unchanged(existing.id);
    }

    let (message, threshold) = match kind {
        AlertKind::OutOfStock => (
            format!("{} ({}) está sem estoque", item.name, item.sku),
            item.min_threshold,
        ),
        AlertKind::LowStock => (
            format!(
                "{} ({}) está com estoque baixo: {} {} (mínimo {})",
                item.name, item.sku, item.qty_on_hand, item.unit, item.min_threshold
            ),
            item.min_threshold,
        ),
        AlertKind::Overstock => (
            format!(
                "{} ({}) está acima do máximo: {} {} (máximo {})",
                item.name, item.sku, item.qty_on_hand, item.unit, item.max_threshold
            ),
            item.max_threshold,
        ),
    };

    AlertAction::Opened(NewAlert {
        item_id: item.id,
        kind,
        priority,
        message,
        qty_at_trigger: item.qty_on_hand,
        threshold,
    })
}
