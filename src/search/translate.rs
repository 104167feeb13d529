//! Translation between search intent and the store-native query spec,
//! plus decoding of raw aggregation output into typed facets.

use crate::search::{SearchRequest, SortKey};
use crate::store::{FacetSpec, FieldBoost, QueryNode, QuerySpec, SortSpec};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Bucket caps for the fixed facet aggregations.
const CATEGORY_FACET_SIZE: usize = 20;
const SCOPED_FACET_SIZE: usize = 10;

/// Translate a search request into a store query spec.
///
/// Pure function: same request, same spec. Filter entries are translated in
/// name order so the output is deterministic.
pub fn translate(request: &SearchRequest) -> QuerySpec {
    let mut must = Vec::new();
    let mut filter = Vec::new();

    if !request.text.trim().is_empty() {
        must.push(QueryNode::MultiMatch {
            query: request.text.clone(),
            fields: vec![
                FieldBoost::boosted("name", 3),
                FieldBoost::boosted("description", 2),
                FieldBoost::plain("author"),
                FieldBoost::plain("categories"),
            ],
        });
    }

    let mut names: Vec<&String> = request.filters.keys().collect();
    names.sort();
    for name in names {
        filter.push(translate_filter(name, &request.filters[name]));
    }

    let query = if must.is_empty() && filter.is_empty() {
        QueryNode::MatchAll
    } else {
        QueryNode::Bool { must, filter }
    };

    QuerySpec {
        query,
        sort: sort_spec(request.sort),
        offset: request.offset,
        limit: request.limit,
        facets: fixed_facets(),
    }
}

/// Translate one filter entry.
///
/// Fields living inside a repeated sub-structure become scoped predicates:
/// they must hold within a single element, never across elements. Everything
/// else is direct equality on a top-level field.
fn translate_filter(name: &str, value: &str) -> QueryNode {
    match name {
        "package_type" => QueryNode::Scoped {
            path: "packages".to_string(),
            query: Box::new(QueryNode::Term {
                field: "packages.type".to_string(),
                value: value.to_string(),
            }),
        },
        "transport" => QueryNode::Scoped {
            path: "remotes".to_string(),
            query: Box::new(QueryNode::Term {
                field: "remotes.transport".to_string(),
                value: value.to_string(),
            }),
        },
        "category" => QueryNode::Term {
            field: "categories".to_string(),
            value: value.to_string(),
        },
        other => QueryNode::Term {
            field: other.to_string(),
            value: value.to_string(),
        },
    }
}

fn sort_spec(sort: SortKey) -> Option<SortSpec> {
    match sort {
        SortKey::Relevance => None,
        SortKey::Popularity => Some(SortSpec::descending("popularity_score")),
        SortKey::Trending => Some(SortSpec::descending("trending_score")),
        SortKey::Rating => Some(SortSpec::descending("rating_average")),
        SortKey::Recent => Some(SortSpec::descending("last_updated")),
    }
}

/// The three facet aggregations every query requests.
fn fixed_facets() -> Vec<FacetSpec> {
    vec![
        FacetSpec {
            name: "categories".to_string(),
            field: "categories".to_string(),
            size: CATEGORY_FACET_SIZE,
            scope: None,
        },
        FacetSpec {
            name: "package_types".to_string(),
            field: "packages.type".to_string(),
            size: SCOPED_FACET_SIZE,
            scope: Some("packages".to_string()),
        },
        FacetSpec {
            name: "transports".to_string(),
            field: "remotes.transport".to_string(),
            size: SCOPED_FACET_SIZE,
            scope: Some("remotes".to_string()),
        },
    ]
}

/// A count-bucketed breakdown of one field across the full matching set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Facet {
    pub field: String,
    pub values: Vec<FacetValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FacetValue {
    pub value: String,
    pub count: u64,
}

/// Decode the store's raw aggregation output into typed facets.
///
/// A missing aggregation section yields an empty list; a facet with zero
/// buckets is omitted entirely.
pub fn decode_facets(aggregations: Option<&Value>) -> Vec<Facet> {
    let Some(aggregations) = aggregations else {
        return Vec::new();
    };

    let mut facets = Vec::new();

    if let Some(facet) = decode_facet(aggregations, "categories", "categories", false) {
        facets.push(facet);
    }
    if let Some(facet) = decode_facet(aggregations, "package_types", "package_type", true) {
        facets.push(facet);
    }
    if let Some(facet) = decode_facet(aggregations, "transports", "transport", true) {
        facets.push(facet);
    }

    facets
}

fn decode_facet(aggregations: &Value, name: &str, field: &str, scoped: bool) -> Option<Facet> {
    let agg = aggregations.get(name)?;
    // Scoped aggregations wrap their buckets in an inner terms aggregation
    let buckets = if scoped {
        agg.get("types")?.get("buckets")?
    } else {
        agg.get("buckets")?
    };

    let values: Vec<FacetValue> = buckets
        .as_array()?
        .iter()
        .filter_map(|bucket| {
            Some(FacetValue {
                value: bucket.get("key")?.as_str()?.to_string(),
                count: bucket.get("doc_count")?.as_u64()?,
            })
        })
        .collect();

    if values.is_empty() {
        return None;
    }

    Some(Facet {
        field: field.to_string(),
        values,
    })
}
