use catalog_search::{
    api::{build_router, AppState},
    config::Config,
    ingest::{Dispatcher, EventQueue, SyncHandler},
    search::SearchService,
    store::create_store,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load()?;

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("catalog_search={},tower_http=info", config.observability.log_level).into()
    });
    if config.observability.json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Starting catalog-search v{}", env!("CARGO_PKG_VERSION"));

    // Initialize document store
    tracing::info!(backend = ?config.store.backend, index = %config.store.index, "Store backend");
    let store = create_store(&config.store)?;
    store.ensure_schema().await?;
    tracing::info!("Document store ready");

    // Start the ingestion pipeline
    let (queue, receiver) = EventQueue::bounded(config.ingest.queue_capacity);
    let dispatcher = Dispatcher::new(
        receiver,
        SyncHandler::new(store.clone()),
        Duration::from_secs(config.ingest.handler_timeout_secs),
    );
    let dispatcher_handle = tokio::spawn(dispatcher.run());
    tracing::info!(
        queue_capacity = config.ingest.queue_capacity,
        "Event dispatcher started"
    );

    // Build HTTP router
    let search = Arc::new(SearchService::new(store, config.search.clone()));
    let internal_key = config.auth.internal_key();
    if internal_key.is_none() {
        tracing::warn!(
            env = %config.auth.internal_key_env,
            "No internal key configured, event submission is unauthenticated"
        );
    }
    let app_state = AppState::new(queue.clone(), search)
        .with_internal_key(config.auth.internal_key_header.clone(), internal_key)
        .with_request_timeout(Duration::from_secs(config.server.request_timeout_secs));
    let app = build_router(app_state);

    // Start HTTP server
    let http_addr = format!("{}:{}", config.server.host, config.server.http_port);
    let listener = tokio::net::TcpListener::bind(&http_addr).await?;
    tracing::info!("HTTP API server listening on http://{}", http_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Drop the last submission handle so the dispatcher drains and exits
    drop(queue);
    tracing::info!("Draining event queue");
    dispatcher_handle.await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}
