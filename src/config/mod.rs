// Configuration module entry point
// Layered loading: optional file, then APP_* environment, then defaults

mod types;

use std::net::SocketAddr;

pub use types::{ApiConfig, Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig};

/// Config file used when none is given on the command line
pub const DEFAULT_CONFIG_PATH: &str = "config";

impl Config {
    /// Load configuration from the default `config.toml`
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from specified file path (extension optional)
    ///
    /// A missing file is not an error; environment variables such as
    /// `APP_SERVER__PORT=9000` override file values.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.server_name", "restapi/0.1")?
            .set_default("http.max_body_size", 10_485_760)? // 10MB
            .set_default("http.cors_allow_origin", "*")?
            .set_default("http.cors_allow_methods", "*")?
            .set_default("http.default_content_type", "application/json")?
            .set_default("api.request_param", "request")?
            .set_default("api.method_override_header", "X-HTTP-Method")?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}
