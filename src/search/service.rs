//! Query-path service: translate, execute against the store, decode facets.

use crate::config::SearchConfig;
use crate::error::{AppError, Result};
use crate::models::ServiceDescriptor;
use crate::search::{decode_facets, translate, Facet, SearchRequest};
use crate::store::DocumentStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Result of one search: total matches, a page of scored descriptors, and
/// the fixed facet summaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub total: u64,
    pub descriptors: Vec<ServiceDescriptor>,
    pub facets: Vec<Facet>,
}

/// Search service over the document store.
///
/// Each query runs in its own bounded-duration context; queries share no
/// mutable state with each other or with the ingestion pipeline.
pub struct SearchService {
    store: Arc<dyn DocumentStore>,
    config: SearchConfig,
}

impl SearchService {
    pub fn new(store: Arc<dyn DocumentStore>, config: SearchConfig) -> Self {
        Self { store, config }
    }

    /// Execute a search request.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let mut request = request.clone();
        if request.limit == 0 {
            request.limit = self.config.default_limit;
        }
        request.limit = request.limit.min(self.config.max_limit);

        let spec = translate(&request);

        let deadline = Duration::from_secs(self.config.query_timeout_secs);
        let output = tokio::time::timeout(deadline, self.store.query(&spec))
            .await
            .map_err(|_| AppError::Timeout("search query".to_string()))??;

        let descriptors = output
            .hits
            .into_iter()
            .map(|hit| {
                let mut descriptor = hit.descriptor;
                descriptor.score = Some(hit.score);
                descriptor
            })
            .collect();

        let facets = decode_facets(output.aggregations.as_ref());

        tracing::debug!(
            total = output.total,
            text = %request.text,
            sort = %request.sort,
            "Search executed"
        );

        Ok(SearchResponse {
            total: output.total,
            descriptors,
            facets,
        })
    }

    /// Fetch a single descriptor by id.
    pub async fn get_descriptor(&self, id: &str) -> Result<ServiceDescriptor> {
        let deadline = Duration::from_secs(self.config.query_timeout_secs);
        tokio::time::timeout(deadline, self.store.get(id))
            .await
            .map_err(|_| AppError::Timeout("descriptor fetch".to_string()))??
            .ok_or_else(|| AppError::NotFound(format!("descriptor {} not found", id)))
    }
}
