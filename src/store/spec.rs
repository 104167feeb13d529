//! Store-native query specification.
//!
//! `QuerySpec` is the contract between the query translator and the document
//! store adapters: a structured description of predicate, sort, window, and
//! facet aggregations. `to_engine_body` renders it into the index engine's
//! JSON query DSL; the in-memory backend interprets the same structure
//! directly.

use crate::models::ServiceDescriptor;
use serde_json::{json, Value};

/// A search predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryNode {
    /// Matches every document
    MatchAll,

    /// Weighted full-text match across several fields, best field wins
    MultiMatch {
        query: String,
        fields: Vec<FieldBoost>,
    },

    /// Exact match on a top-level keyword field
    Term { field: String, value: String },

    /// Predicate that must hold within a single element of a repeated
    /// sub-structure, never across elements
    Scoped { path: String, query: Box<QueryNode> },

    /// Conjunction of scoring (`must`) and non-scoring (`filter`) clauses
    Bool {
        must: Vec<QueryNode>,
        filter: Vec<QueryNode>,
    },
}

/// A field name with an optional relevance boost.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldBoost {
    pub field: String,
    pub boost: Option<u32>,
}

impl FieldBoost {
    pub fn plain(field: &str) -> Self {
        Self {
            field: field.to_string(),
            boost: None,
        }
    }

    pub fn boosted(field: &str, boost: u32) -> Self {
        Self {
            field: field.to_string(),
            boost: Some(boost),
        }
    }

    fn render(&self) -> String {
        match self.boost {
            Some(boost) => format!("{}^{}", self.field, boost),
            None => self.field.clone(),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Explicit sort criterion; `None` on the spec means native relevance order.
#[derive(Debug, Clone, PartialEq)]
pub struct SortSpec {
    pub field: String,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn descending(field: &str) -> Self {
        Self {
            field: field.to_string(),
            order: SortOrder::Descending,
        }
    }
}

/// One facet aggregation request.
#[derive(Debug, Clone, PartialEq)]
pub struct FacetSpec {
    /// Name of the aggregation in the raw output
    pub name: String,

    /// Field the buckets are computed over
    pub field: String,

    /// Maximum bucket count
    pub size: usize,

    /// Sub-structure path when the field lives inside a repeated element
    pub scope: Option<String>,
}

/// Complete query specification handed to a document store.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    pub query: QueryNode,
    pub sort: Option<SortSpec>,
    pub offset: usize,
    pub limit: usize,
    pub facets: Vec<FacetSpec>,
}

impl QuerySpec {
    /// Render the spec into the engine's JSON query DSL.
    pub fn to_engine_body(&self) -> Value {
        let mut body = json!({
            "query": render_node(&self.query),
            "from": self.offset,
            "size": self.limit,
            "track_total_hits": true,
        });

        if let Some(ref sort) = self.sort {
            let order = match sort.order {
                SortOrder::Ascending => "asc",
                SortOrder::Descending => "desc",
            };
            body["sort"] = json!([{ (sort.field.clone()): { "order": order } }]);
        }

        if !self.facets.is_empty() {
            let mut aggs = serde_json::Map::new();
            for facet in &self.facets {
                let terms = json!({
                    "terms": { "field": facet.field.clone(), "size": facet.size }
                });
                let agg = match facet.scope {
                    Some(ref path) => json!({
                        "nested": { "path": path.clone() },
                        "aggs": { "types": terms }
                    }),
                    None => terms,
                };
                aggs.insert(facet.name.clone(), agg);
            }
            body["aggs"] = Value::Object(aggs);
        }

        body
    }
}

fn render_node(node: &QueryNode) -> Value {
    match node {
        QueryNode::MatchAll => json!({ "match_all": {} }),
        QueryNode::MultiMatch { query, fields } => json!({
            "multi_match": {
                "query": query,
                "fields": fields.iter().map(FieldBoost::render).collect::<Vec<_>>(),
                "type": "best_fields",
            }
        }),
        QueryNode::Term { field, value } => json!({ "term": { (field.clone()): value } }),
        QueryNode::Scoped { path, query } => json!({
            "nested": { "path": path, "query": render_node(query) }
        }),
        QueryNode::Bool { must, filter } => {
            let mut clause = serde_json::Map::new();
            if !must.is_empty() {
                clause.insert(
                    "must".to_string(),
                    Value::Array(must.iter().map(render_node).collect()),
                );
            }
            if !filter.is_empty() {
                clause.insert(
                    "filter".to_string(),
                    Value::Array(filter.iter().map(render_node).collect()),
                );
            }
            json!({ "bool": clause })
        }
    }
}

/// One search hit with its relevance score.
#[derive(Debug, Clone)]
pub struct ScoredHit {
    pub descriptor: ServiceDescriptor,
    pub score: f64,
}

/// Raw result of a store query.
#[derive(Debug, Clone, Default)]
pub struct QueryOutput {
    /// Total number of matches across the full result set
    pub total: u64,

    /// The requested page of hits
    pub hits: Vec<ScoredHit>,

    /// Engine-shaped aggregation section, if any facets were requested
    pub aggregations: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_all_body() {
        let spec = QuerySpec {
            query: QueryNode::MatchAll,
            sort: None,
            offset: 0,
            limit: 20,
            facets: vec![],
        };

        let body = spec.to_engine_body();
        assert_eq!(body["query"], json!({ "match_all": {} }));
        assert_eq!(body["from"], 0);
        assert_eq!(body["size"], 20);
        assert!(body.get("sort").is_none());
        assert!(body.get("aggs").is_none());
    }

    #[test]
    fn test_multi_match_rendering() {
        let node = QueryNode::MultiMatch {
            query: "weather".to_string(),
            fields: vec![
                FieldBoost::boosted("name", 3),
                FieldBoost::boosted("description", 2),
                FieldBoost::plain("author"),
            ],
        };

        assert_eq!(
            render_node(&node),
            json!({
                "multi_match": {
                    "query": "weather",
                    "fields": ["name^3", "description^2", "author"],
                    "type": "best_fields",
                }
            })
        );
    }

    #[test]
    fn test_scoped_term_rendering() {
        let node = QueryNode::Scoped {
            path: "packages".to_string(),
            query: Box::new(QueryNode::Term {
                field: "packages.type".to_string(),
                value: "npm".to_string(),
            }),
        };

        assert_eq!(
            render_node(&node),
            json!({
                "nested": {
                    "path": "packages",
                    "query": { "term": { "packages.type": "npm" } }
                }
            })
        );
    }

    #[test]
    fn test_bool_omits_empty_clauses() {
        let node = QueryNode::Bool {
            must: vec![],
            filter: vec![QueryNode::Term {
                field: "license".to_string(),
                value: "MIT".to_string(),
            }],
        };

        let rendered = render_node(&node);
        assert!(rendered["bool"].get("must").is_none());
        assert_eq!(rendered["bool"]["filter"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_sort_and_facets_body() {
        let spec = QuerySpec {
            query: QueryNode::MatchAll,
            sort: Some(SortSpec::descending("popularity_score")),
            offset: 40,
            limit: 10,
            facets: vec![
                FacetSpec {
                    name: "categories".to_string(),
                    field: "categories".to_string(),
                    size: 20,
                    scope: None,
                },
                FacetSpec {
                    name: "package_types".to_string(),
                    field: "packages.type".to_string(),
                    size: 10,
                    scope: Some("packages".to_string()),
                },
            ],
        };

        let body = spec.to_engine_body();
        assert_eq!(
            body["sort"],
            json!([{ "popularity_score": { "order": "desc" } }])
        );
        assert_eq!(
            body["aggs"]["categories"],
            json!({ "terms": { "field": "categories", "size": 20 } })
        );
        assert_eq!(body["aggs"]["package_types"]["nested"]["path"], "packages");
        assert_eq!(
            body["aggs"]["package_types"]["aggs"]["types"]["terms"]["field"],
            "packages.type"
        );
    }
}
