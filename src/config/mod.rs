//! Configuration module

pub mod settings;

pub use settings::{
    AnalyticsConfig, AnalyticsQuery, ImageApiConfig, LoggingConfig, RateLimitConfig,
    ServerConfig, Settings,
};
