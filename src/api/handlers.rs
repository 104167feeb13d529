use crate::api::AppState;
use crate::error::Result;
use crate::models::ChangeEvent;
use crate::search::{SearchRequest, SearchResponse, SortKey};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use validator::Validate;

/// Health check endpoint
pub async fn health_check() -> Result<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Submit a change event for asynchronous index synchronization.
///
/// Accepted means queued, not applied: the response is returned as soon as
/// the event lands on the queue.
pub async fn submit_event(
    State(state): State<AppState>,
    Json(event): Json<ChangeEvent>,
) -> Result<(StatusCode, Json<Value>)> {
    event.validate()?;
    state.queue.enqueue(event)?;

    Ok((StatusCode::ACCEPTED, Json(json!({ "status": "accepted" }))))
}

/// Search the descriptor catalog
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>> {
    params.validate()?;

    let mut request = SearchRequest::new(params.q.as_deref().unwrap_or(""))
        .with_sort(SortKey::parse_or_default(
            params.sort.as_deref().unwrap_or(""),
        ))
        .with_offset(params.offset.unwrap_or(0))
        .with_limit(params.limit.unwrap_or(0));

    let filters = [
        ("category", &params.category),
        ("license", &params.license),
        ("author", &params.author),
        ("source", &params.source),
        ("package_type", &params.package_type),
        ("transport", &params.transport),
    ];
    for (name, value) in filters {
        if let Some(value) = value {
            request = request.with_filter(name, value);
        }
    }

    let response = state.search.search(&request).await?;
    Ok(Json(response))
}

#[derive(Debug, Deserialize, Validate)]
pub struct SearchParams {
    #[validate(length(max = 512))]
    pub q: Option<String>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
    pub sort: Option<String>,
    pub category: Option<String>,
    pub license: Option<String>,
    pub author: Option<String>,
    pub source: Option<String>,
    pub package_type: Option<String>,
    pub transport: Option<String>,
}

/// Fetch a single descriptor by id
pub async fn get_descriptor(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<crate::models::ServiceDescriptor>> {
    let descriptor = state.search.get_descriptor(&id).await?;
    Ok(Json(descriptor))
}
