//! Image request dispatcher with retry and exponential backoff

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::backend::traits::{ImageGenerator, ImageRequest};
use crate::config::ImageApiConfig;
use crate::dispatch::templates::{GenerationMode, ImageKind};
use crate::error::{AppError, Result};

/// A validated generation request
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub user_prompt: String,
    pub mode: GenerationMode,
}

/// One generated image as returned to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageResult {
    pub url: String,
    #[serde(rename = "type")]
    pub kind: ImageKind,
}

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub model: String,
    pub quality: String,
    pub max_attempts: u32,
    /// One backoff time unit; the wait before attempt k is 2^(k-1) units
    pub backoff_unit: Duration,
    /// Fixed pause between consecutive images of one request
    pub inter_image_delay: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self::from(&ImageApiConfig::default())
    }
}

impl From<&ImageApiConfig> for DispatchConfig {
    fn from(config: &ImageApiConfig) -> Self {
        Self {
            model: config.model.clone(),
            quality: config.quality.clone(),
            max_attempts: config.max_attempts,
            backoff_unit: config.backoff_unit(),
            inter_image_delay: config.inter_image_delay(),
        }
    }
}

/// Milliseconds for log fields, pinned at `u64::MAX` for saturated backoffs
pub(crate) fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Dispatches image requests to the generator, one at a time
pub struct Dispatcher {
    generator: Arc<dyn ImageGenerator>,
    config: DispatchConfig,
}

impl Dispatcher {
    /// Create a new dispatcher
    pub fn new(generator: Arc<dyn ImageGenerator>, config: DispatchConfig) -> Self {
        Self { generator, config }
    }

    /// Sleep before the given (1-based) attempt. Uncapped and without jitter.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        2u32.checked_pow(attempt - 1)
            .and_then(|factor| self.config.backoff_unit.checked_mul(factor))
            .unwrap_or(Duration::MAX)
    }

    /// Generate a single image, retrying up to `max_attempts` times in total
    pub async fn generate(
        &self,
        prompt: &str,
        size: &str,
        kind: ImageKind,
        max_attempts: u32,
    ) -> Result<ImageResult> {
        let attempts = max_attempts.max(1);
        let request = ImageRequest {
            prompt: prompt.to_string(),
            size: size.to_string(),
            model: self.config.model.clone(),
            quality: self.config.quality.clone(),
            n: 1,
        };

        let mut last_error = None;

        for attempt in 1..=attempts {
            if attempt > 1 {
                let delay = self.backoff_delay(attempt);
                info!(
                    kind = %kind,
                    attempt = attempt,
                    delay_ms = saturating_millis(delay),
                    "Waiting before retry"
                );
                tokio::time::sleep(delay).await;
            }

            info!(
                kind = %kind,
                attempt = attempt,
                max_attempts = attempts,
                generator = %self.generator.name(),
                "Requesting image"
            );

            let outcome = self.generator.generate(request.clone()).await.and_then(|images| {
                images
                    .into_iter()
                    .next()
                    .and_then(|image| image.url)
                    .ok_or_else(|| AppError::RemoteCall("Image API returned no image URL".to_string()))
            });

            match outcome {
                Ok(url) => {
                    info!(kind = %kind, attempt = attempt, outcome = "success", "Image generated");
                    return Ok(ImageResult { url, kind });
                }
                Err(e) => {
                    warn!(
                        kind = %kind,
                        attempt = attempt,
                        outcome = "failure",
                        error = %e,
                        "Image attempt failed"
                    );
                    last_error = Some(e);
                }
            }
        }

        error!(kind = %kind, attempts = attempts, "All image attempts failed");

        Err(AppError::ImageGeneration {
            kind: kind.to_string(),
            attempts,
            message: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown error".to_string()),
        })
    }

    /// Generate every image a mode calls for, strictly in order
    pub async fn generate_for_mode(&self, request: &GenerationRequest) -> Result<Vec<ImageResult>> {
        let kinds = request.mode.kinds();
        let mut images = Vec::with_capacity(kinds.len());

        info!(mode = %request.mode, images = kinds.len(), "Processing generation request");

        for (idx, kind) in kinds.iter().enumerate() {
            info!(mode = %request.mode, kind = %kind, index = idx + 1, total = kinds.len(), "Generating image");

            let prompt = kind.render_prompt(&request.user_prompt);
            let result = self
                .generate(&prompt, kind.size(), *kind, self.config.max_attempts)
                .await;

            match result {
                Ok(image) => images.push(image),
                Err(e) if kinds.len() > 1 => {
                    error!(mode = %request.mode, kind = %kind, completed = images.len(), "Aborting image batch");
                    return Err(AppError::BatchAborted {
                        mode: request.mode.to_string(),
                        completed: images.len(),
                        source: Box::new(e),
                    });
                }
                Err(e) => return Err(e),
            }

            // Keep a fixed gap between images to stay under the remote rate limit
            if idx + 1 < kinds.len() {
                info!(
                    delay_ms = saturating_millis(self.config.inter_image_delay),
                    "Waiting before next generation"
                );
                tokio::time::sleep(self.config.inter_image_delay).await;
            }
        }

        info!(mode = %request.mode, total = images.len(), "All images generated");
        Ok(images)
    }
}
