// src/handlers/events.rs

use std::{convert::Infallible, time::Duration};

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use tokio::sync::broadcast;
use tokio_stream::{wrappers::BroadcastStream, StreamExt};

use crate::{config::AppState, services::notifier::InventoryEvent};

pub const EVENT_NAME: &str = "inventory-updated";

// GET /api/events: stream SSE com cada item criado/alterado/excluído
#[utoipa::path(
    get,
    path = "/api/events",
    tag = "Events",
    responses(
        (status = 200, description = "Stream text/event-stream; evento 'inventory-updated' com { type, item }", body = InventoryEvent, content_type = "text/event-stream")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn stream_events(
    State(app_state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = app_state.notifier.subscribe();
    tracing::debug!(
        "📡 Novo assinante de eventos ({} ativos)",
        app_state.notifier.subscriber_count()
    );

    Sse::new(event_stream(rx)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn event_stream(
    rx: broadcast::Receiver<InventoryEvent>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(event) => Event::default()
            .event(EVENT_NAME)
            .json_data(&event)
            .ok()
            .map(Ok),
        // Assinante atrasado: os eventos perdidos são pulados
        Err(_) => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::inventory::tests::sample_item;
    use crate::services::notifier::{EventKind, StockNotifier};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn lagged_events_are_skipped_and_stream_ends_with_the_channel() {
        let notifier = StockNotifier::new(1);
        let stream = event_stream(notifier.subscribe());

        let item = sample_item(dec!(5), dec!(1), dec!(10));
        notifier.publish(EventKind::Created, item.clone());
        notifier.publish(EventKind::Updated, item.clone());
        notifier.publish(EventKind::Deleted, item);
        drop(notifier);

        let delivered: Vec<_> = stream.collect().await;
        assert_eq!(delivered.len(), 1);
    }
}
