//! Bounded in-memory event queue.
//!
//! Decouples the fast acknowledgment path from index mutation: `enqueue`
//! never blocks, and a full queue is reported to the submitter as a
//! retryable `QueueFull` instead of being silently dropped.

use crate::error::{AppError, Result};
use crate::models::ChangeEvent;
use tokio::sync::mpsc;

/// Submission handle for the ingestion queue. Cloneable; the dispatcher
/// exits once every handle is dropped and the buffer is drained.
#[derive(Clone)]
pub struct EventQueue {
    sender: mpsc::Sender<ChangeEvent>,
}

impl EventQueue {
    /// Create a queue with the given capacity. Returns the submission
    /// handle and the receiver the single dispatcher drains.
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<ChangeEvent>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }

    /// Enqueue an event without blocking.
    pub fn enqueue(&self, event: ChangeEvent) -> Result<()> {
        match self.sender.try_send(event) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(event)) => {
                tracing::warn!(
                    kind = %event.kind,
                    entity_id = %event.entity_id,
                    "Event queue full, rejecting event"
                );
                Err(AppError::QueueFull)
            }
            Err(mpsc::error::TrySendError::Closed(event)) => {
                tracing::error!(
                    kind = %event.kind,
                    entity_id = %event.entity_id,
                    "Event queue closed, rejecting event"
                );
                Err(AppError::Internal("event queue closed".to_string()))
            }
        }
    }
}
