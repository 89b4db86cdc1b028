//! HTTP client for OpenAI-compatible image generation APIs

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::backend::traits::{GeneratedImage, ImageGenerator, ImageRequest};
use crate::config::ImageApiConfig;
use crate::error::{AppError, Result};

/// Image generation client speaking the `/v1/images/generations` protocol
pub struct OpenAiImageClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct ApiGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    size: &'a str,
    quality: &'a str,
    n: u32,
}

#[derive(Debug, Deserialize)]
struct ApiGenerateResponse {
    #[serde(default)]
    data: Vec<ApiImageData>,
}

#[derive(Debug, Deserialize)]
struct ApiImageData {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    revised_prompt: Option<String>,
}

impl OpenAiImageClient {
    /// Create a new client from configuration
    pub fn new(config: &ImageApiConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl ImageGenerator for OpenAiImageClient {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, request: ImageRequest) -> Result<Vec<GeneratedImage>> {
        let url = format!("{}/v1/images/generations", self.base_url);
        let body = ApiGenerateRequest {
            model: &request.model,
            prompt: &request.prompt,
            size: &request.size,
            quality: &request.quality,
            n: request.n,
        };

        debug!(url = %url, size = %request.size, "Sending image generation request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Timeout(format!("Image API did not answer in time: {}", e))
                } else {
                    AppError::HttpClient(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::RemoteCall(format!(
                "Image API returned {}: {}",
                status, body
            )));
        }

        let api_response = response
            .json::<ApiGenerateResponse>()
            .await
            .map_err(|e| AppError::RemoteCall(format!("Failed to parse image response: {}", e)))?;

        Ok(api_response
            .data
            .into_iter()
            .map(|img| GeneratedImage {
                url: img.url,
                revised_prompt: img.revised_prompt,
            })
            .collect())
    }
}
