//! HTTP adapter for the external index engine.

use crate::config::StoreConfig;
use crate::error::{AppError, Result};
use crate::models::ServiceDescriptor;
use crate::store::{DocumentStore, QueryOutput, QuerySpec, ScoredHit};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

/// Document store backed by an Elasticsearch-compatible engine over HTTP.
#[derive(Clone)]
pub struct ElasticStore {
    client: Client,
    base_url: String,
    index: String,
}

impl ElasticStore {
    /// Create a new adapter. The per-request timeout bounds every store call
    /// so handler and query deadlines are never exceeded by a hung socket.
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            index: config.index.clone(),
        })
    }

    fn index_url(&self) -> String {
        format!("{}/{}", self.base_url, self.index)
    }

    fn doc_url(&self, id: &str) -> String {
        format!("{}/_doc/{}", self.index_url(), id)
    }

    /// Index mapping installed at startup. Repeated sub-structures are
    /// `nested` so scoped predicates match within one element only.
    fn index_mapping() -> Value {
        json!({
            "mappings": {
                "properties": {
                    "id": { "type": "keyword" },
                    "name": {
                        "type": "text",
                        "fields": { "keyword": { "type": "keyword" } }
                    },
                    "description": { "type": "text" },
                    "author": {
                        "type": "text",
                        "fields": { "keyword": { "type": "keyword" } }
                    },
                    "homepage": { "type": "keyword" },
                    "source": { "type": "keyword" },
                    "repository": { "type": "keyword" },
                    "license": { "type": "keyword" },
                    "categories": { "type": "keyword" },
                    "packages": {
                        "type": "nested",
                        "properties": {
                            "type": { "type": "keyword" },
                            "name": { "type": "keyword" },
                            "version": { "type": "keyword" }
                        }
                    },
                    "version": {
                        "properties": {
                            "version": { "type": "keyword" },
                            "sdk_version": { "type": "keyword" },
                            "protocol_version": { "type": "keyword" }
                        }
                    },
                    "remotes": {
                        "type": "nested",
                        "properties": {
                            "type": { "type": "keyword" },
                            "transport": { "type": "keyword" },
                            "command": { "type": "text" },
                            "args": { "type": "text" },
                            "url": { "type": "keyword" },
                            "headers": { "type": "object" }
                        }
                    },
                    "tools": {
                        "type": "nested",
                        "properties": {
                            "name": { "type": "keyword" },
                            "description": { "type": "text" }
                        }
                    },
                    "prompts": {
                        "type": "nested",
                        "properties": {
                            "name": { "type": "keyword" },
                            "description": { "type": "text" }
                        }
                    },
                    "templates": {
                        "type": "nested",
                        "properties": {
                            "name": { "type": "keyword" },
                            "description": { "type": "text" }
                        }
                    },
                    "indexed_at": { "type": "date" },
                    "last_updated": { "type": "date" },
                    "install_count": { "type": "long" },
                    "rating_average": { "type": "float" },
                    "rating_count": { "type": "long" },
                    "popularity_score": { "type": "float" },
                    "trending_score": { "type": "float" },
                    "quality_score": { "type": "float" }
                }
            }
        })
    }

    async fn fail_on_error(response: reqwest::Response, op: &str) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let detail = response.text().await.unwrap_or_default();
        Err(AppError::Store(format!("{} failed ({}): {}", op, status, detail)))
    }
}

#[async_trait]
impl DocumentStore for ElasticStore {
    async fn ensure_schema(&self) -> Result<()> {
        let response = self.client.head(self.index_url()).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                let response = self
                    .client
                    .put(self.index_url())
                    .json(&Self::index_mapping())
                    .send()
                    .await?;
                Self::fail_on_error(response, "index creation").await?;
                tracing::info!(index = %self.index, "Created index");
                Ok(())
            }
            status if status.is_success() => {
                tracing::debug!(index = %self.index, "Index already exists");
                Ok(())
            }
            status => Err(AppError::Store(format!(
                "index existence check failed ({})",
                status
            ))),
        }
    }

    async fn put(&self, descriptor: &ServiceDescriptor) -> Result<()> {
        let response = self
            .client
            .put(self.doc_url(&descriptor.id))
            .query(&[("refresh", "true")])
            .json(descriptor)
            .send()
            .await?;

        Self::fail_on_error(response, "document indexing").await?;
        tracing::debug!(id = %descriptor.id, "Descriptor indexed");
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<ServiceDescriptor>> {
        let response = self.client.get(self.doc_url(id)).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = Self::fail_on_error(response, "document fetch").await?;
        let body: GetResponse = response.json().await?;
        Ok(Some(body.source))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.doc_url(id))
            .query(&[("refresh", "true")])
            .send()
            .await?;

        // Already absent counts as deleted
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }

        Self::fail_on_error(response, "document deletion").await?;
        Ok(())
    }

    async fn query(&self, spec: &QuerySpec) -> Result<QueryOutput> {
        let response = self
            .client
            .post(format!("{}/_search", self.index_url()))
            .json(&spec.to_engine_body())
            .send()
            .await?;

        let response = Self::fail_on_error(response, "search").await?;
        let body: SearchResponse = response.json().await?;

        let hits = body
            .hits
            .hits
            .into_iter()
            .map(|hit| ScoredHit {
                descriptor: hit.source,
                // Explicit sorts carry no relevance score
                score: hit.score.unwrap_or(0.0),
            })
            .collect();

        Ok(QueryOutput {
            total: body.hits.total.value,
            hits,
            aggregations: body.aggregations,
        })
    }
}

#[derive(Deserialize)]
struct GetResponse {
    #[serde(rename = "_source")]
    source: ServiceDescriptor,
}

#[derive(Deserialize)]
struct SearchResponse {
    hits: SearchHits,
    #[serde(default)]
    aggregations: Option<Value>,
}

#[derive(Deserialize)]
struct SearchHits {
    total: TotalHits,
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct TotalHits {
    value: u64,
}

#[derive(Deserialize)]
struct SearchHit {
    #[serde(rename = "_source")]
    source: ServiceDescriptor,
    #[serde(rename = "_score")]
    score: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::QueryNode;
    use mockito::Matcher;

    fn store_for(server: &mockito::Server) -> ElasticStore {
        ElasticStore::new(&StoreConfig {
            backend: crate::config::StoreBackend::Elastic,
            url: server.url(),
            index: "service_descriptors".to_string(),
            timeout_secs: 2,
        })
        .unwrap()
    }

    fn match_all_spec() -> QuerySpec {
        QuerySpec {
            query: QueryNode::MatchAll,
            sort: None,
            offset: 0,
            limit: 20,
            facets: vec![],
        }
    }

    #[tokio::test]
    async fn test_ensure_schema_creates_missing_index() {
        let mut server = mockito::Server::new_async().await;
        let head = server
            .mock("HEAD", "/service_descriptors")
            .with_status(404)
            .create_async()
            .await;
        let create = server
            .mock("PUT", "/service_descriptors")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "mappings": { "properties": { "id": { "type": "keyword" } } }
            })))
            .with_status(200)
            .with_body(r#"{"acknowledged":true}"#)
            .create_async()
            .await;

        store_for(&server).ensure_schema().await.unwrap();

        head.assert_async().await;
        create.assert_async().await;
    }

    #[tokio::test]
    async fn test_ensure_schema_is_idempotent() {
        let mut server = mockito::Server::new_async().await;
        let head = server
            .mock("HEAD", "/service_descriptors")
            .with_status(200)
            .create_async()
            .await;

        store_for(&server).ensure_schema().await.unwrap();
        head.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_parses_source() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/service_descriptors/_doc/svc-1")
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "_id": "svc-1",
                    "_source": { "id": "svc-1", "name": "weather", "source": "github" }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let descriptor = store_for(&server).get("svc-1").await.unwrap().unwrap();
        assert_eq!(descriptor.id, "svc-1");
        assert_eq!(descriptor.name, "weather");
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/service_descriptors/_doc/ghost")
            .with_status(404)
            .create_async()
            .await;

        assert!(store_for(&server).get("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_is_success() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", "/service_descriptors/_doc/ghost")
            .match_query(Matcher::UrlEncoded("refresh".into(), "true".into()))
            .with_status(404)
            .create_async()
            .await;

        assert!(store_for(&server).delete("ghost").await.is_ok());
    }

    #[tokio::test]
    async fn test_query_parses_hits_and_aggregations() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/service_descriptors/_search")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "query": { "match_all": {} }
            })))
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "hits": {
                        "total": { "value": 2 },
                        "hits": [
                            { "_source": { "id": "a", "name": "alpha" }, "_score": 1.5 },
                            { "_source": { "id": "b", "name": "beta" }, "_score": null }
                        ]
                    },
                    "aggregations": {
                        "categories": { "buckets": [{ "key": "data", "doc_count": 2 }] }
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let output = store_for(&server).query(&match_all_spec()).await.unwrap();
        assert_eq!(output.total, 2);
        assert_eq!(output.hits.len(), 2);
        assert_eq!(output.hits[0].score, 1.5);
        assert_eq!(output.hits[1].score, 0.0);
        assert!(output.aggregations.is_some());
    }

    #[tokio::test]
    async fn test_engine_error_maps_to_store_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/service_descriptors/_search")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let err = store_for(&server).query(&match_all_spec()).await.unwrap_err();
        assert!(matches!(err, AppError::Store(_)));
    }
}
