use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// Document store configuration
    pub store: StoreConfig,

    /// Event ingestion configuration
    pub ingest: IngestConfig,

    /// Search configuration
    pub search: SearchConfig,

    /// Observability configuration
    pub observability: ObservabilityConfig,

    /// Internal auth configuration
    pub auth: AuthConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/default.toml".to_string());

        config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(&config_path).required(false))
            // Override with environment variables (prefix: CATALOG_)
            .add_source(
                config::Environment::with_prefix("CATALOG")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Document store backend type
    #[serde(default)]
    pub backend: StoreBackend,

    /// Base URL of the index engine (for the elastic backend)
    #[serde(default = "default_store_url")]
    pub url: String,

    /// Index name holding the descriptor documents
    #[serde(default = "default_index_name")]
    pub index: String,

    /// Per-request timeout against the store (seconds)
    #[serde(default = "default_store_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Elastic,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Bounded capacity of the in-memory event queue
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Wall-clock deadline for processing a single event (seconds)
    #[serde(default = "default_handler_timeout")]
    pub handler_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Default page size when the caller does not specify one
    #[serde(default = "default_search_limit")]
    pub default_limit: usize,

    /// Hard cap on the requested page size
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,

    /// Deadline for a single query request (seconds)
    #[serde(default = "default_query_timeout")]
    pub query_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Header carrying the shared internal key on event submissions
    #[serde(default = "default_internal_key_header")]
    pub internal_key_header: String,

    /// Environment variable holding the shared internal key
    #[serde(default = "default_internal_key_env")]
    pub internal_key_env: String,
}

impl AuthConfig {
    /// Resolve the shared internal key from the environment
    pub fn internal_key(&self) -> Option<String> {
        std::env::var(&self.internal_key_env).ok().filter(|k| !k.is_empty())
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8081
}

fn default_request_timeout() -> u64 {
    30
}

fn default_store_url() -> String {
    "http://localhost:9200".to_string()
}

fn default_index_name() -> String {
    "service_descriptors".to_string()
}

fn default_store_timeout() -> u64 {
    10
}

fn default_queue_capacity() -> usize {
    1000
}

fn default_handler_timeout() -> u64 {
    30
}

fn default_search_limit() -> usize {
    20
}

fn default_max_limit() -> usize {
    100
}

fn default_query_timeout() -> u64 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_internal_key_header() -> String {
    "X-Internal-Key".to_string()
}

fn default_internal_key_env() -> String {
    "INTERNAL_API_KEY".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        assert_eq!(default_http_port(), 8081);
        assert_eq!(default_queue_capacity(), 1000);
        assert_eq!(default_handler_timeout(), 30);
        assert_eq!(default_query_timeout(), 5);
        assert_eq!(default_index_name(), "service_descriptors");
    }

    #[test]
    fn test_store_backend_default() {
        assert_eq!(StoreBackend::default(), StoreBackend::Elastic);
    }

    #[test]
    fn test_embedded_defaults_deserialize() {
        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.request_timeout_secs, 30);
        assert_eq!(config.ingest.queue_capacity, 1000);
        assert_eq!(config.search.max_limit, 100);
        assert_eq!(config.auth.internal_key_header, "X-Internal-Key");
    }
}
