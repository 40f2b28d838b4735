// src/models/alert.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "alert_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    OutOfStock,
    LowStock,
    Overstock,
}

// A ordem das variantes é a ordem de prioridade (LOW < CRITICAL)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "alert_priority", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertPriority {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "alert_action", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionTaken {
    Reordered,
    Adjusted,
    Transferred,
    Ignored,
    #[default]
    Other,
}

// --- Alerta de estoque (tabela 'stock_alerts') ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockAlert {
    pub id: Uuid,
    pub item_id: Uuid,
    pub kind: AlertKind,
    pub priority: AlertPriority,
    pub message: String,
    pub qty_at_trigger: Decimal,
    pub threshold: Decimal,
    pub is_resolved: bool,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<Uuid>,
    pub resolution_notes: String,
    pub action_taken: Option<ActionTaken>,
    pub created_at: DateTime<Utc>,
}

impl StockAlert {
    /// Transição única aberto -> resolvido. Resolver de novo é erro.
    pub fn resolve(
        &mut self,
        actor: Uuid,
        notes: Option<String>,
        action_taken: ActionTaken,
    ) -> Result<(), AppError> {
        if self.is_resolved {
            return Err(AppError::AlreadyResolved(self.id));
        }
        self.is_resolved = true;
        self.resolved_at = Some(Utc::now());
        self.resolved_by = Some(actor);
        self.resolution_notes = notes.unwrap_or_default();
        self.action_taken = Some(action_taken);
        Ok(())
    }
}

// Alerta a ser criado (saída do AlertEvaluator)
#[derive(Debug, Clone, PartialEq)]
pub struct NewAlert {
    pub item_id: Uuid,
    pub kind: AlertKind,
    pub priority: AlertPriority,
    pub message: String,
    pub qty_at_trigger: Decimal,
    pub threshold: Decimal,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResolveAlertPayload {
    #[validate(length(max = 2000, message = "As notas podem ter no máximo 2000 caracteres."))]
    pub notes: Option<String>,
    #[serde(default)]
    pub action_taken: ActionTaken,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AlertFilter {
    pub resolved: Option<bool>,
    pub priority: Option<AlertPriority>,
    pub item_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_alert() -> StockAlert {
        StockAlert {
            id: Uuid::new_v4(),
            item_id: Uuid::new_v4(),
            kind: AlertKind::LowStock,
            priority: AlertPriority::Medium,
            message: "Estoque baixo".into(),
            qty_at_trigger: Decimal::from(3),
            threshold: Decimal::from(5),
            is_resolved: false,
            resolved_at: None,
            resolved_by: None,
            resolution_notes: String::new(),
            action_taken: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn resolving_twice_fails_and_keeps_first_resolution() {
        let mut alert = open_alert();
        let first = Uuid::new_v4();
        alert
            .resolve(first, Some("Pedido de compra 42".into()), ActionTaken::Reordered)
            .unwrap();
        assert!(alert.is_resolved);
        assert_eq!(alert.resolved_by, Some(first));

        let err = alert
            .resolve(Uuid::new_v4(), None, ActionTaken::Other)
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyResolved(id) if id == alert.id));
        assert!(alert.is_resolved);
        assert_eq!(alert.resolved_by, Some(first));
        assert_eq!(alert.action_taken, Some(ActionTaken::Reordered));
    }

    #[test]
    fn priorities_are_ordered() {
        assert!(AlertPriority::Critical > AlertPriority::Medium);
        assert!(AlertPriority::Medium > AlertPriority::Low);
    }

    #[test]
    fn action_defaults_to_other() {
        let payload: ResolveAlertPayload = serde_json::from_str("{}").unwrap();
        assert_eq!(payload.action_taken, ActionTaken::Other);
    }
}
