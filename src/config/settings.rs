//! Application settings and configuration management

use crate::error::{AppError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub image_api: ImageApiConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_request_timeout() -> u64 {
    300
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Image generation API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImageApiConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_image_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_quality")]
    pub quality: String,
    #[serde(default = "default_image_timeout")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Length of one backoff time unit
    #[serde(default = "default_backoff_unit")]
    pub backoff_unit_ms: u64,
    /// Pause between the images of a multi-image batch, in backoff units
    #[serde(default = "default_inter_image_delay")]
    pub inter_image_delay_units: u32,
}

fn default_image_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_model() -> String {
    "dall-e-3".to_string()
}

fn default_quality() -> String {
    "standard".to_string()
}

fn default_image_timeout() -> u64 {
    120000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_unit() -> u64 {
    1000
}

fn default_inter_image_delay() -> u32 {
    2
}

impl Default for ImageApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_image_base_url(),
            model: default_model(),
            quality: default_quality(),
            timeout_ms: default_image_timeout(),
            max_attempts: default_max_attempts(),
            backoff_unit_ms: default_backoff_unit(),
            inter_image_delay_units: default_inter_image_delay(),
        }
    }
}

impl ImageApiConfig {
    pub fn backoff_unit(&self) -> Duration {
        Duration::from_millis(self.backoff_unit_ms)
    }

    pub fn inter_image_delay(&self) -> Duration {
        self.backoff_unit() * self.inter_image_delay_units
    }
}

/// A single analytics query and the row field it feeds
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalyticsQuery {
    #[serde(default)]
    pub query_id: String,
    pub field: String,
}

impl AnalyticsQuery {
    pub fn new(query_id: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            query_id: query_id.into(),
            field: field.into(),
        }
    }
}

/// Analytics API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalyticsConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_analytics_base_url")]
    pub base_url: String,
    #[serde(default = "default_key_header")]
    pub key_header: String,
    #[serde(default = "default_analytics_timeout")]
    pub timeout_ms: u64,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_startup_timeout")]
    pub startup_timeout_ms: u64,
    #[serde(default = "default_tokens_created_query")]
    pub tokens_created: AnalyticsQuery,
    #[serde(default = "default_trading_volume_query")]
    pub trading_volume: AnalyticsQuery,
    #[serde(default = "default_active_users_query")]
    pub active_users: AnalyticsQuery,
}

fn default_analytics_base_url() -> String {
    "https://api.dune.com".to_string()
}

fn default_key_header() -> String {
    "X-Dune-API-Key".to_string()
}

fn default_analytics_timeout() -> u64 {
    30000
}

fn default_refresh_interval() -> u64 {
    300
}

fn default_startup_timeout() -> u64 {
    10000
}

fn default_tokens_created_query() -> AnalyticsQuery {
    AnalyticsQuery::new("", "token_count")
}

fn default_trading_volume_query() -> AnalyticsQuery {
    AnalyticsQuery::new("", "total_volume")
}

fn default_active_users_query() -> AnalyticsQuery {
    AnalyticsQuery::new("", "active_users")
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_analytics_base_url(),
            key_header: default_key_header(),
            timeout_ms: default_analytics_timeout(),
            refresh_interval_secs: default_refresh_interval(),
            startup_timeout_ms: default_startup_timeout(),
            tokens_created: default_tokens_created_query(),
            trading_volume: default_trading_volume_query(),
            active_users: default_active_users_query(),
        }
    }
}

/// Rate limiting configuration for the generation endpoint
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_rpm")]
    pub requests_per_minute: u32,
    #[serde(default = "default_burst")]
    pub burst_size: u32,
}

fn default_true() -> bool {
    true
}

fn default_rpm() -> u32 {
    30
}

fn default_burst() -> u32 {
    5
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_minute: default_rpm(),
            burst_size: default_burst(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Present, non-blank credential
fn credential(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Settings {
    /// Load settings from configuration files and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/default.toml")
    }

    /// Load settings from a specific configuration file path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            // Load from configuration file
            .add_source(File::with_name(path.as_ref().to_str().unwrap_or("config/default")).required(false))
            // Override with environment variables (e.g. FORGE__SERVER__PORT)
            .add_source(
                Environment::with_prefix("FORGE")
                    .separator("__")
                    .try_parsing(true),
            )
            // Conventional credential variables win over everything else
            .set_override_option("image_api.api_key", std::env::var("OPENAI_API_KEY").ok())?
            .set_override_option("analytics.api_key", std::env::var("DUNE_API_KEY").ok())?
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        Ok(settings)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.image_api_key().is_none() {
            return Err(AppError::MissingCredential(
                "OPENAI_API_KEY is required".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(AppError::Config(config::ConfigError::Message(
                "Server port cannot be 0".to_string(),
            )));
        }

        if self.image_api.max_attempts == 0 {
            return Err(AppError::Config(config::ConfigError::Message(
                "image_api.max_attempts must be at least 1".to_string(),
            )));
        }

        if self.analytics.refresh_interval_secs == 0 {
            return Err(AppError::Config(config::ConfigError::Message(
                "analytics.refresh_interval_secs cannot be 0".to_string(),
            )));
        }

        // Query identifiers only matter when the analytics API is reachable
        if self.analytics_api_key().is_some() {
            for (name, query) in self.analytics_queries() {
                if query.query_id.trim().is_empty() {
                    return Err(AppError::Config(config::ConfigError::Message(format!(
                        "analytics.{}.query_id cannot be empty",
                        name
                    ))));
                }
            }
        }

        Ok(())
    }

    pub fn image_api_key(&self) -> Option<&str> {
        credential(&self.image_api.api_key)
    }

    pub fn analytics_api_key(&self) -> Option<&str> {
        credential(&self.analytics.api_key)
    }

    fn analytics_queries(&self) -> [(&'static str, &AnalyticsQuery); 3] {
        [
            ("tokens_created", &self.analytics.tokens_created),
            ("trading_volume", &self.analytics.trading_volume),
            ("active_users", &self.analytics.active_users),
        ]
    }
}
