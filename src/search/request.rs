//! User-facing search parameters.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{Display, EnumString};

/// Sort key for search results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Native relevance order from the store
    #[default]
    Relevance,
    Popularity,
    Trending,
    Rating,
    Recent,
}

impl SortKey {
    /// Parse a sort key, falling back to relevance for unknown values.
    pub fn parse_or_default(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

/// A faceted full-text search request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Free text; empty means match-all
    pub text: String,

    /// Named filter values, AND-combined
    pub filters: HashMap<String, String>,

    /// Sort key
    pub sort: SortKey,

    /// Pagination offset
    pub offset: usize,

    /// Page size
    pub limit: usize,
}

impl SearchRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            filters: HashMap::new(),
            sort: SortKey::default(),
            offset: 0,
            limit: 20,
        }
    }

    pub fn with_filter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(name.into(), value.into());
        self
    }

    pub fn with_sort(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}
