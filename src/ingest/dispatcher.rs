//! Single-consumer event dispatcher.
//!
//! One dispatcher task drains the queue in arrival order and applies each
//! event through the sync handler. Delivery is at-most-once: a handler
//! failure or deadline overrun is logged and the event is dropped, never
//! retried. Unknown event kinds are discarded without touching the store.

use crate::ingest::SyncHandler;
use crate::models::ChangeEvent;
use std::time::Duration;
use tokio::sync::mpsc;

pub struct Dispatcher {
    receiver: mpsc::Receiver<ChangeEvent>,
    handler: SyncHandler,
    handler_timeout: Duration,
}

impl Dispatcher {
    pub fn new(
        receiver: mpsc::Receiver<ChangeEvent>,
        handler: SyncHandler,
        handler_timeout: Duration,
    ) -> Self {
        Self {
            receiver,
            handler,
            handler_timeout,
        }
    }

    /// Drain the queue until every submission handle is dropped, then exit.
    /// Events already buffered at shutdown are still processed.
    pub async fn run(mut self) {
        tracing::info!("Event dispatcher started");

        while let Some(event) = self.receiver.recv().await {
            self.process(event).await;
        }

        tracing::info!("Event queue drained, dispatcher exiting");
    }

    async fn process(&self, event: ChangeEvent) {
        let Some(kind) = event.parsed_kind() else {
            tracing::warn!(
                kind = %event.kind,
                entity_id = %event.entity_id,
                "Unknown event kind, discarding"
            );
            return;
        };

        match tokio::time::timeout(self.handler_timeout, self.handler.apply(kind, &event)).await {
            Ok(Ok(())) => {
                tracing::debug!(kind = %event.kind, entity_id = %event.entity_id, "Event applied");
            }
            Ok(Err(e)) => {
                tracing::error!(
                    kind = %event.kind,
                    entity_id = %event.entity_id,
                    error = %e,
                    "Event handler failed, dropping event"
                );
            }
            Err(_) => {
                tracing::error!(
                    kind = %event.kind,
                    entity_id = %event.entity_id,
                    timeout_secs = self.handler_timeout.as_secs(),
                    "Event handler deadline exceeded, dropping event"
                );
            }
        }
    }
}
