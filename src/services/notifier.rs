// src/services/notifier.rs

use serde::Serialize;
use tokio::sync::broadcast;
use utoipa::ToSchema;

use crate::models::inventory::InventoryItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Created,
    Updated,
    Deleted,
}

// Payload enviado aos assinantes: { "type": "updated", "item": {...} }
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InventoryEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub item: InventoryItem,
}

/// Canal de notificações em memória. Publicar nunca bloqueia nem falha:
/// sem assinantes o evento é descartado, e assinante lento perde eventos antigos.
#[derive(Clone)]
pub struct StockNotifier {
    sender: broadcast::Sender<InventoryEvent>,
}

impl StockNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn publish(&self, kind: EventKind, item: InventoryItem) {
        let sku = item.sku.clone();
        match self.sender.send(InventoryEvent { kind, item }) {
            Ok(receivers) => {
                tracing::debug!("📣 Evento {:?} de {} enviado a {} assinante(s)", kind, sku, receivers)
            }
            Err(_) => tracing::debug!("Evento {:?} de {} sem assinantes", kind, sku),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<InventoryEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
