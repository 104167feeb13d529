use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Recognized change-notification kinds.
///
/// The wire format carries the kind as a free string so that unknown kinds
/// travel through the queue and are discarded by the dispatcher rather than
/// rejected at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    Added,
    Updated,
    Deleted,
}

/// A change notification from the upstream registry.
///
/// Events are consumed exactly once and never persisted; the registry is the
/// durable source of truth and may redeliver after a restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Event kind as submitted (`added`, `updated`, `deleted`, or anything else)
    #[serde(rename = "kind")]
    pub kind: String,

    /// Identifier of the affected descriptor
    pub entity_id: String,

    /// When the change happened upstream
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,

    /// Opaque payload; decoded per-kind by the sync handlers
    #[serde(default)]
    pub payload: serde_json::Map<String, serde_json::Value>,
}

impl ChangeEvent {
    /// Boundary validation: events missing `kind` or `entity_id` are
    /// malformed and must never be enqueued.
    pub fn validate(&self) -> Result<()> {
        if self.kind.trim().is_empty() {
            return Err(AppError::Validation("event kind is required".to_string()));
        }
        if self.entity_id.trim().is_empty() {
            return Err(AppError::Validation(
                "event entity_id is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse the kind into the closed enum, if recognized.
    pub fn parsed_kind(&self) -> Option<EventKind> {
        self.kind.parse().ok()
    }
}
