//! Per-kind sync handlers: apply the semantic effect of a change event to
//! the document store.

use crate::error::{AppError, Result};
use crate::models::{ChangeEvent, EventKind, ServiceDescriptor};
use crate::store::DocumentStore;
use chrono::Utc;
use std::sync::Arc;

pub struct SyncHandler {
    store: Arc<dyn DocumentStore>,
}

impl SyncHandler {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Apply one event. Errors are terminal for the event; the dispatcher
    /// logs them and moves on.
    pub async fn apply(&self, kind: EventKind, event: &ChangeEvent) -> Result<()> {
        match kind {
            EventKind::Added => self.handle_added(event).await,
            EventKind::Updated => self.handle_updated(event).await,
            EventKind::Deleted => self.handle_deleted(event).await,
        }
    }

    /// Index a new descriptor. Overwrites an existing document with the
    /// same id, which makes redelivery harmless.
    async fn handle_added(&self, event: &ChangeEvent) -> Result<()> {
        let mut descriptor = ServiceDescriptor::from_payload(&event.payload)
            .map_err(|e| AppError::Decode(format!("added payload: {}", e)))?;

        if descriptor.id.is_empty() {
            descriptor.id = event.entity_id.clone();
        }

        let now = Utc::now();
        descriptor.indexed_at = now;
        descriptor.last_updated = now;

        self.store.put(&descriptor).await?;
        tracing::info!(entity_id = %descriptor.id, "Descriptor indexed");
        Ok(())
    }

    /// Replace an existing descriptor with the payload-decoded one.
    ///
    /// This is whole-document replacement, not a field-level patch: fields
    /// omitted from the payload fall back to their defaults. Only the
    /// stable identity (`id`, `indexed_at`) survives from the stored copy.
    async fn handle_updated(&self, event: &ChangeEvent) -> Result<()> {
        let existing = self
            .store
            .get(&event.entity_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("descriptor {} not indexed", event.entity_id))
            })?;

        let mut merged = ServiceDescriptor::from_payload(&event.payload)
            .map_err(|e| AppError::Decode(format!("updated payload: {}", e)))?;

        merged.id = existing.id;
        merged.indexed_at = existing.indexed_at;
        merged.last_updated = Utc::now();

        self.store.put(&merged).await?;
        tracing::info!(entity_id = %merged.id, "Descriptor updated");
        Ok(())
    }

    /// Remove a descriptor. Deleting an absent id is already satisfied.
    async fn handle_deleted(&self, event: &ChangeEvent) -> Result<()> {
        self.store.delete(&event.entity_id).await?;
        tracing::info!(entity_id = %event.entity_id, "Descriptor deleted");
        Ok(())
    }
}
