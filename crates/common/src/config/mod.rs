//! Configuration management for Beans
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default, config/{APP_ENV}, config/local)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Login rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Statistics configuration
    #[serde(default)]
    pub stats: StatsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Debug mode: human readable logs, no host checks, dev secret allowed
    #[serde(default)]
    pub debug: bool,

    /// Host names this server answers to (empty list allows any host).
    /// Accepts a list or a space/comma separated string.
    #[serde(default, deserialize_with = "deserialize_host_list")]
    pub allowed_hosts: Vec<String>,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Full connection URL; takes precedence over the individual parts
    pub url: Option<String>,

    #[serde(default = "default_db_host")]
    pub host: String,

    #[serde(default = "default_db_port")]
    pub port: u16,

    #[serde(default = "default_db_user")]
    pub user: String,

    #[serde(default = "default_db_password")]
    pub password: String,

    #[serde(default = "default_db_name")]
    pub name: String,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Create missing tables and indexes on start-up
    #[serde(default = "default_enabled")]
    pub auto_migrate: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Secret used to sign session and API tokens
    pub secret_key: Option<String>,

    /// Token lifetime in seconds
    #[serde(default = "default_token_expiration")]
    pub token_expiration_secs: u64,

    /// Name of the session cookie
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,

    /// Mark cookies as Secure (HTTPS only)
    #[serde(default)]
    pub secure_cookies: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log filter directive (e.g. "info", "beans=debug,sea_orm=warn")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_enabled")]
    pub json_logging: bool,

    /// Prometheus exporter port (0 to disable)
    #[serde(default)]
    pub metrics_port: u16,

    /// Service name for logs
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Login attempts per second (process wide)
    #[serde(default = "default_rate_limit")]
    pub requests_per_second: u32,

    /// Burst capacity
    #[serde(default = "default_burst")]
    pub burst: u32,

    /// Enable rate limiting
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StatsConfig {
    /// Top-N size when the request does not ask for one
    #[serde(default = "default_stats_limit")]
    pub default_limit: u64,

    /// Upper bound for a requested top-N size
    #[serde(default = "default_stats_max_limit")]
    pub max_limit: u64,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8000 }
fn default_request_timeout() -> u64 { 30 }
fn default_db_host() -> String { "localhost".to_string() }
fn default_db_port() -> u16 { 5432 }
fn default_db_user() -> String { "user".to_string() }
fn default_db_password() -> String { "password".to_string() }
fn default_db_name() -> String { "beans".to_string() }
fn default_max_connections() -> u32 { 20 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 10 }
fn default_idle_timeout() -> u64 { 300 }
fn default_token_expiration() -> u64 { 60 * 60 * 24 * 14 }
fn default_session_cookie() -> String { "beans_session".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_service_name() -> String { "beans".to_string() }
fn default_rate_limit() -> u32 { 5 }
fn default_burst() -> u32 { 20 }
fn default_stats_limit() -> u64 { 5 }
fn default_stats_max_limit() -> u64 { 50 }
fn default_enabled() -> bool { true }

/// Secret used when running in debug mode without a configured key
const DEBUG_SECRET_KEY: &str = "beans-insecure-debug-secret";

fn deserialize_host_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum HostList {
        Text(String),
        List(Vec<String>),
    }

    let hosts = match HostList::deserialize(deserializer)? {
        HostList::Text(text) => split_host_list(&text),
        HostList::List(list) => list,
    };

    Ok(hosts)
}

/// Split "example.com www.example.com,localhost" into its host names
pub fn split_host_list(text: &str) -> Vec<String> {
    text.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|host| !host.is_empty())
        .map(|host| host.to_string())
        .collect()
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables with APP__ prefix
            // e.g., APP__SERVER__PORT=8081
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a specific file, still honouring APP__ overrides
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that are unsafe to serve
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.server.debug && self.auth.secret_key.as_deref().map_or(true, str::is_empty) {
            return Err(ConfigError::Message(
                "auth.secret_key must be set when server.debug is off".to_string(),
            ));
        }

        if self.stats.default_limit == 0 || self.stats.default_limit > self.stats.max_limit {
            return Err(ConfigError::Message(
                "stats.default_limit must be between 1 and stats.max_limit".to_string(),
            ));
        }

        Ok(())
    }

    /// Secret used to sign tokens
    pub fn secret_key(&self) -> &str {
        self.auth
            .secret_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .unwrap_or(DEBUG_SECRET_KEY)
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }
}

impl DatabaseConfig {
    /// Connection URL, built from the individual parts when no URL is given
    pub fn connection_url(&self) -> String {
        match &self.url {
            Some(url) if !url.is_empty() => url.clone(),
            _ => format!(
                "postgres://{}:{}@{}:{}/{}",
                self.user, self.password, self.host, self.port, self.name
            ),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            debug: false,
            allowed_hosts: Vec::new(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: default_db_host(),
            port: default_db_port(),
            user: default_db_user(),
            password: default_db_password(),
            name: default_db_name(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            auto_migrate: default_enabled(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            token_expiration_secs: default_token_expiration(),
            session_cookie: default_session_cookie(),
            secure_cookies: false,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_enabled(),
            metrics_port: 0,
            service_name: default_service_name(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_rate_limit(),
            burst: default_burst(),
            enabled: default_enabled(),
        }
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            default_limit: default_stats_limit(),
            max_limit: default_stats_max_limit(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            observability: ObservabilityConfig::default(),
            rate_limit: RateLimitConfig::default(),
            stats: StatsConfig::default(),
        }
    }
}
