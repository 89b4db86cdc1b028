//! FORGE image relay
//!
//! Forwards templated prompts to an image generation API with retry and
//! exponential backoff, and serves dashboard counters cached from an
//! analytics API.

pub mod api;
pub mod backend;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod middleware;
pub mod stats;

pub use error::{AppError, Result};

use std::sync::Arc;

use dispatch::Dispatcher;
use stats::{StatsRefresher, StatsStore};

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Arc<config::Settings>,
    pub dispatcher: Arc<Dispatcher>,
    pub refresher: Arc<StatsRefresher>,
    pub stats: Arc<StatsStore>,
}
