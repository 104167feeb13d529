use crate::api::{handlers, AppState};
use crate::error::AppError;
use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

/// Build the main API router
pub fn build_router(state: AppState) -> Router {
    let request_timeout = state.request_timeout;
    let internal = Router::new()
        .route("/internal/events", post(handlers::submit_event))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_internal_key,
        ));

    Router::new()
        // Health endpoints
        .route("/health", get(handlers::health_check))
        .route("/health/live", get(handlers::health_check))
        .route("/health/ready", get(handlers::health_check))
        // Catalog queries
        .route("/v1/search", get(handlers::search))
        .route("/v1/servers/:id", get(handlers::get_descriptor))
        // Event ingestion
        .merge(internal)
        // Add state
        .with_state(state)
        // Add middleware
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CorsLayer::permissive())
}

/// Reject internal-endpoint requests without the shared key. When no key is
/// configured the guard is disabled, which is the local-development setup.
async fn require_internal_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> std::result::Result<Response, AppError> {
    if let Some(expected) = &state.internal_key {
        let presented = request
            .headers()
            .get(state.internal_key_header.as_str())
            .and_then(|v| v.to_str().ok());

        if presented != Some(expected.as_str()) {
            return Err(AppError::Authentication("invalid internal key".to_string()));
        }
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use crate::ingest::EventQueue;
    use crate::search::SearchService;
    use crate::store::InMemoryStore;
    use crate::models::{ChangeEvent, ServiceDescriptor};
    use crate::store::{DocumentStore, QueryOutput, QuerySpec};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request as HttpRequest, StatusCode};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    // The receiver must stay alive for the duration of the test; dropping it
    // closes the queue and every submission fails.
    fn test_state(internal_key: Option<&str>) -> (AppState, mpsc::Receiver<ChangeEvent>) {
        let store = Arc::new(InMemoryStore::new());
        let (queue, receiver) = EventQueue::bounded(8);
        let search = Arc::new(SearchService::new(
            store,
            SearchConfig {
                default_limit: 20,
                max_limit: 100,
                query_timeout_secs: 5,
            },
        ));
        let state = AppState::new(queue, search).with_internal_key(
            "X-Internal-Key".to_string(),
            internal_key.map(String::from),
        );
        (state, receiver)
    }

    fn event_request(key: Option<&str>) -> HttpRequest<Body> {
        let body = serde_json::json!({
            "kind": "added",
            "entity_id": "svc-1",
            "payload": { "id": "svc-1", "name": "weather" }
        });
        let mut builder = HttpRequest::builder()
            .method("POST")
            .uri("/internal/events")
            .header("content-type", "application/json");
        if let Some(key) = key {
            builder = builder.header("X-Internal-Key", key);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (state, _receiver) = test_state(None);
        let app = build_router(state);
        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_submit_event_accepted() {
        let (state, mut receiver) = test_state(None);
        let app = build_router(state);
        let response = app.oneshot(event_request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        // Accepted means the event actually landed on the queue
        let queued = receiver.try_recv().unwrap();
        assert_eq!(queued.entity_id, "svc-1");
    }

    #[tokio::test]
    async fn test_internal_key_required_when_configured() {
        let (state, _receiver) = test_state(Some("secret"));
        let app = build_router(state);
        let response = app.oneshot(event_request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_internal_key_accepted() {
        let (state, _receiver) = test_state(Some("secret"));
        let app = build_router(state);
        let response = app.oneshot(event_request(Some("secret"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_search_endpoint_open() {
        let (state, _receiver) = test_state(Some("secret"));
        let app = build_router(state);
        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/v1/search?q=weather&sort=popularity")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_descriptor_is_404() {
        let (state, _receiver) = test_state(None);
        let app = build_router(state);
        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/v1/servers/ghost")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_event_rejected() {
        let (state, _receiver) = test_state(None);
        let app = build_router(state);
        let body = serde_json::json!({ "kind": "", "entity_id": "svc-1" });
        let response = app
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/internal/events")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    struct StalledStore;

    #[async_trait]
    impl DocumentStore for StalledStore {
        async fn ensure_schema(&self) -> crate::error::Result<()> {
            Ok(())
        }
        async fn put(&self, _: &ServiceDescriptor) -> crate::error::Result<()> {
            Ok(())
        }
        async fn get(&self, _: &str) -> crate::error::Result<Option<ServiceDescriptor>> {
            Ok(None)
        }
        async fn delete(&self, _: &str) -> crate::error::Result<()> {
            Ok(())
        }
        async fn query(&self, _: &QuerySpec) -> crate::error::Result<QueryOutput> {
            tokio::time::sleep(Duration::from_secs(7200)).await;
            Ok(QueryOutput::default())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_timeout_enforced() {
        let (queue, _receiver) = EventQueue::bounded(8);
        // Query deadline far beyond the request timeout so the HTTP layer
        // is the one that fires
        let search = Arc::new(SearchService::new(
            Arc::new(StalledStore),
            SearchConfig {
                default_limit: 20,
                max_limit: 100,
                query_timeout_secs: 3600,
            },
        ));
        let state =
            AppState::new(queue, search).with_request_timeout(Duration::from_secs(1));
        let app = build_router(state);

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/v1/search?q=weather")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }

    #[tokio::test]
    async fn test_full_queue_is_503() {
        let store = Arc::new(InMemoryStore::new());
        let (queue, _receiver) = EventQueue::bounded(1);
        let search = Arc::new(SearchService::new(
            store,
            SearchConfig {
                default_limit: 20,
                max_limit: 100,
                query_timeout_secs: 5,
            },
        ));
        let app = build_router(AppState::new(queue, search));

        let first = app.clone().oneshot(event_request(None)).await.unwrap();
        assert_eq!(first.status(), StatusCode::ACCEPTED);

        let second = app.oneshot(event_request(None)).await.unwrap();
        assert_eq!(second.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
