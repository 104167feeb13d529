//! Faceted full-text search over the descriptor catalog.
//!
//! The query path is a straight pipeline:
//!
//! ```text
//! SearchRequest ──translate──▶ QuerySpec ──store──▶ QueryOutput
//!                                                       │
//! SearchResponse ◀──decode_facets / score annotation────┘
//! ```
//!
//! Translation is pure; the store adapter owns execution; facet decoding
//! turns the engine's raw aggregation output back into typed summaries.

mod request;
mod service;
mod translate;

pub use request::{SearchRequest, SortKey};
pub use service::{SearchResponse, SearchService};
pub use translate::{decode_facets, translate, Facet, FacetValue};
