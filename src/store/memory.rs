//! In-memory document store for development mode and tests.
//!
//! Interprets `QuerySpec` directly instead of rendering it to the engine
//! DSL. Matching is deliberately simple (token containment); what matters
//! is that it honors the contract shape: scoped predicates bind within one
//! sub-structure element, facet counts cover the full matching set, and the
//! aggregation output mirrors the engine's raw format so facet decoding is
//! backend-agnostic.

use crate::error::Result;
use crate::models::ServiceDescriptor;
use crate::store::{
    DocumentStore, FacetSpec, QueryNode, QueryOutput, QuerySpec, ScoredHit, SortOrder,
};
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{json, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct InMemoryStore {
    documents: Arc<DashMap<String, ServiceDescriptor>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn put(&self, descriptor: &ServiceDescriptor) -> Result<()> {
        self.documents
            .insert(descriptor.id.clone(), descriptor.clone());
        tracing::debug!(id = %descriptor.id, "Descriptor stored");
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<ServiceDescriptor>> {
        Ok(self.documents.get(id).map(|entry| entry.clone()))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.documents.remove(id);
        Ok(())
    }

    async fn query(&self, spec: &QuerySpec) -> Result<QueryOutput> {
        let mut matched: Vec<ScoredHit> = self
            .documents
            .iter()
            .filter_map(|entry| {
                evaluate(&spec.query, entry.value()).map(|score| ScoredHit {
                    descriptor: entry.value().clone(),
                    score,
                })
            })
            .collect();

        match spec.sort {
            Some(ref sort) => {
                matched.sort_by(|a, b| {
                    let ordering = compare_field(&a.descriptor, &b.descriptor, &sort.field);
                    match sort.order {
                        SortOrder::Ascending => ordering,
                        SortOrder::Descending => ordering.reverse(),
                    }
                });
                // Explicit sorts carry no relevance score
                for hit in &mut matched {
                    hit.score = 0.0;
                }
            }
            None => {
                matched.sort_by(|a, b| {
                    b.score
                        .partial_cmp(&a.score)
                        .unwrap_or(Ordering::Equal)
                        .then_with(|| a.descriptor.id.cmp(&b.descriptor.id))
                });
            }
        }

        // Facets cover the full matching set, not the page window
        let aggregations = if spec.facets.is_empty() {
            None
        } else {
            Some(aggregate(&matched, &spec.facets))
        };

        let total = matched.len() as u64;
        let hits = matched
            .into_iter()
            .skip(spec.offset)
            .take(spec.limit)
            .collect();

        Ok(QueryOutput {
            total,
            hits,
            aggregations,
        })
    }
}

/// Evaluate a predicate against one descriptor. `Some(score)` on match.
fn evaluate(node: &QueryNode, descriptor: &ServiceDescriptor) -> Option<f64> {
    match node {
        QueryNode::MatchAll => Some(1.0),
        QueryNode::MultiMatch { query, fields } => {
            let tokens: Vec<String> = query
                .split_whitespace()
                .map(|t| t.to_lowercase())
                .collect();
            if tokens.is_empty() {
                return Some(1.0);
            }

            // best_fields: the highest-scoring single field wins
            let best = fields
                .iter()
                .filter_map(|field| {
                    let text = field_text(descriptor, &field.field)?.to_lowercase();
                    let matched = tokens.iter().filter(|t| text.contains(t.as_str())).count();
                    if matched == 0 {
                        None
                    } else {
                        Some(field.boost.unwrap_or(1) as f64 * matched as f64)
                    }
                })
                .fold(None::<f64>, |acc, score| {
                    Some(acc.map_or(score, |a| a.max(score)))
                });
            best
        }
        QueryNode::Term { field, value } => {
            if term_matches(descriptor, field, value) {
                Some(0.0)
            } else {
                None
            }
        }
        QueryNode::Scoped { path, query } => {
            if scoped_matches(descriptor, path, query) {
                Some(0.0)
            } else {
                None
            }
        }
        QueryNode::Bool { must, filter } => {
            for clause in filter {
                evaluate(clause, descriptor)?;
            }
            let mut score = 0.0;
            for clause in must {
                score += evaluate(clause, descriptor)?;
            }
            Some(score)
        }
    }
}

/// Concatenated searchable text for a multi-match field.
fn field_text(descriptor: &ServiceDescriptor, field: &str) -> Option<String> {
    match field {
        "name" => Some(descriptor.name.clone()),
        "description" => Some(descriptor.description.clone()),
        "author" => descriptor.author.clone(),
        "categories" => {
            if descriptor.categories.is_empty() {
                None
            } else {
                Some(descriptor.categories.join(" "))
            }
        }
        _ => None,
    }
}

/// Exact match on a top-level field.
fn term_matches(descriptor: &ServiceDescriptor, field: &str, value: &str) -> bool {
    match field {
        "id" => descriptor.id == value,
        "name" => descriptor.name == value,
        "source" => descriptor.source == value,
        "license" => descriptor.license.as_deref() == Some(value),
        "author" => descriptor.author.as_deref() == Some(value),
        "categories" => descriptor.categories.iter().any(|c| c == value),
        _ => false,
    }
}

/// A scoped predicate holds if a single sub-structure element satisfies it.
fn scoped_matches(descriptor: &ServiceDescriptor, path: &str, query: &QueryNode) -> bool {
    let QueryNode::Term { field, value } = query else {
        return false;
    };

    match (path, field.as_str()) {
        ("packages", "packages.type") => descriptor
            .packages
            .iter()
            .any(|p| p.package_type == *value),
        ("packages", "packages.name") => descriptor.packages.iter().any(|p| p.name == *value),
        ("remotes", "remotes.transport") => {
            descriptor.remotes.iter().any(|r| r.transport == *value)
        }
        ("remotes", "remotes.type") => {
            descriptor.remotes.iter().any(|r| r.endpoint_type == *value)
        }
        _ => false,
    }
}

/// Numeric/date field comparison for explicit sorts.
fn compare_field(a: &ServiceDescriptor, b: &ServiceDescriptor, field: &str) -> Ordering {
    match field {
        "popularity_score" => total_cmp(a.popularity_score, b.popularity_score),
        "trending_score" => total_cmp(a.trending_score, b.trending_score),
        "rating_average" => total_cmp(a.rating_average, b.rating_average),
        "last_updated" => a.last_updated.cmp(&b.last_updated),
        "install_count" => a.install_count.cmp(&b.install_count),
        _ => Ordering::Equal,
    }
}

fn total_cmp(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Build an engine-shaped aggregation section over the matching set.
fn aggregate(matched: &[ScoredHit], facets: &[FacetSpec]) -> Value {
    let mut aggregations = serde_json::Map::new();

    for facet in facets {
        let mut counts: HashMap<String, u64> = HashMap::new();
        let mut scoped_total: u64 = 0;

        for hit in matched {
            let descriptor = &hit.descriptor;
            match (facet.scope.as_deref(), facet.field.as_str()) {
                (None, "categories") => {
                    for category in &descriptor.categories {
                        *counts.entry(category.clone()).or_default() += 1;
                    }
                }
                (Some("packages"), "packages.type") => {
                    for package in &descriptor.packages {
                        scoped_total += 1;
                        *counts.entry(package.package_type.clone()).or_default() += 1;
                    }
                }
                (Some("remotes"), "remotes.transport") => {
                    for remote in &descriptor.remotes {
                        scoped_total += 1;
                        *counts.entry(remote.transport.clone()).or_default() += 1;
                    }
                }
                _ => {}
            }
        }

        let mut buckets: Vec<(String, u64)> = counts.into_iter().collect();
        buckets.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        buckets.truncate(facet.size);

        let buckets: Vec<Value> = buckets
            .into_iter()
            .map(|(key, doc_count)| json!({ "key": key, "doc_count": doc_count }))
            .collect();

        let agg = match facet.scope {
            Some(_) => json!({
                "doc_count": scoped_total,
                "types": { "buckets": buckets }
            }),
            None => json!({ "buckets": buckets }),
        };
        aggregations.insert(facet.name.clone(), agg);
    }

    Value::Object(aggregations)
}
