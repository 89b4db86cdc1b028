//! Common traits and types for the remote collaborators

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

/// Request for a single image generation call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRequest {
    /// Fully rendered prompt
    pub prompt: String,

    /// Output size, e.g. "1024x1024"
    pub size: String,

    /// Model identifier
    pub model: String,

    /// Quality tier
    pub quality: String,

    /// Number of images to generate
    pub n: u32,
}

/// Generated image data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedImage {
    /// URL to the image
    pub url: Option<String>,

    /// Revised prompt if the model modified it
    pub revised_prompt: Option<String>,
}

/// One result row of an analytics query
pub type Row = Map<String, Value>;

/// Trait for image generation APIs
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Get the generator name
    fn name(&self) -> &str;

    /// Generate images for a request
    async fn generate(&self, request: ImageRequest) -> Result<Vec<GeneratedImage>>;
}

/// Trait for analytics query APIs
#[async_trait]
pub trait AnalyticsSource: Send + Sync {
    /// Fetch the latest result rows of a stored query, in the order the API returns them
    async fn fetch_rows(&self, query_id: &str) -> Result<Vec<Row>>;
}
