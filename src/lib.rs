//! Catalog search service: event-driven index synchronization plus faceted
//! full-text search over service descriptors.
//!
//! Upstream catalog changes arrive as events on `/internal/events`, land on
//! a bounded queue, and are applied to the document store by a single
//! dispatcher task. Read traffic goes through the search service, which
//! translates caller intent into the store-native query spec and decodes
//! the engine's aggregations into facet summaries.

pub mod api;
pub mod config;
pub mod error;
pub mod ingest;
pub mod models;
pub mod search;
pub mod store;

pub use error::{AppError, Result};
