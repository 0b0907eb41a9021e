// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;
use std::collections::BTreeMap;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    pub api: ApiConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common or json)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration, timeouts in seconds
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    /// Larger request bodies are answered with 413
    pub max_body_size: u64,
    pub cors_allow_origin: String,
    pub cors_allow_methods: String,
    /// Content-Type added to every controller response unless overridden
    pub default_content_type: String,
}

/// Resource API configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// Query parameter carrying `resource/arg1/arg2`
    pub request_param: String,
    /// Header that tunnels PUT/DELETE through POST
    pub method_override_header: String,
    /// Resource name -> controller kind
    #[serde(default)]
    pub resources: BTreeMap<String, String>,
}
