pub mod handlers;
pub mod routes;

pub use routes::*;

use crate::ingest::EventQueue;
use crate::search::SearchService;
use std::sync::Arc;
use std::time::Duration;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub queue: EventQueue,
    pub search: Arc<SearchService>,
    pub internal_key_header: String,
    pub internal_key: Option<String>,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(queue: EventQueue, search: Arc<SearchService>) -> Self {
        Self {
            queue,
            search,
            internal_key_header: "X-Internal-Key".to_string(),
            internal_key: None,
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Require the given key on internal endpoints
    pub fn with_internal_key(mut self, header: String, key: Option<String>) -> Self {
        self.internal_key_header = header;
        self.internal_key = key;
        self
    }

    /// Wall-clock deadline applied to every HTTP request
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
