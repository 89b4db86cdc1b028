//! Unit tests for mode orchestration in the dispatcher

use async_trait::async_trait;
use forge_relay::backend::traits::{GeneratedImage, ImageGenerator, ImageRequest};
use forge_relay::dispatch::{
    DispatchConfig, Dispatcher, GenerationMode, GenerationRequest, ImageKind,
};
use forge_relay::{AppError, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Records every request; fails any request whose prompt contains `fail_on`
struct RecordingGenerator {
    fail_on: Option<&'static str>,
    requests: Mutex<Vec<ImageRequest>>,
}

impl RecordingGenerator {
    fn new(fail_on: Option<&'static str>) -> Arc<Self> {
        Arc::new(Self {
            fail_on,
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<ImageRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl ImageGenerator for RecordingGenerator {
    fn name(&self) -> &str {
        "recording"
    }

    async fn generate(&self, request: ImageRequest) -> Result<Vec<GeneratedImage>> {
        let failing = self
            .fail_on
            .map(|needle| request.prompt.contains(needle))
            .unwrap_or(false);
        let index = {
            let mut requests = self.requests.lock();
            requests.push(request);
            requests.len()
        };

        if failing {
            return Err(AppError::RemoteCall("content policy violation".to_string()));
        }
        Ok(vec![GeneratedImage {
            url: Some(format!("https://img.test/{}.png", index)),
            revised_prompt: None,
        }])
    }
}

fn design(prompt: &str) -> GenerationRequest {
    GenerationRequest {
        user_prompt: prompt.to_string(),
        mode: GenerationMode::Design,
    }
}

#[tokio::test(start_paused = true)]
async fn test_design_returns_logo_then_banner() {
    let generator = RecordingGenerator::new(None);
    let dispatcher = Dispatcher::new(generator.clone(), DispatchConfig::default());

    let images = dispatcher.generate_for_mode(&design("rocket bakery")).await.unwrap();

    assert_eq!(images.len(), 2);
    assert_eq!(images[0].kind, ImageKind::Logo);
    assert_eq!(images[1].kind, ImageKind::Banner);

    let requests = generator.requests();
    assert!(requests[0].prompt.contains("logo image"));
    assert!(requests[1].prompt.contains("banner image"));
    assert!(requests.iter().all(|r| r.size == "1024x1024" && r.n == 1));
    assert!(requests.iter().all(|r| r.model == "dall-e-3" && r.quality == "standard"));
}

#[tokio::test(start_paused = true)]
async fn test_website_returns_single_wide_image() {
    let generator = RecordingGenerator::new(None);
    let dispatcher = Dispatcher::new(generator.clone(), DispatchConfig::default());

    let request = GenerationRequest {
        user_prompt: "portfolio".to_string(),
        mode: GenerationMode::Website,
    };
    let images = dispatcher.generate_for_mode(&request).await.unwrap();

    assert_eq!(images.len(), 1);
    assert_eq!(images[0].kind, ImageKind::Website);

    let requests = generator.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].size, "1792x1024");
    assert!(requests[0].prompt.ends_with("User request: portfolio"));
}

#[tokio::test(start_paused = true)]
async fn test_logo_failure_never_attempts_banner() {
    let generator = RecordingGenerator::new(Some("logo image"));
    let dispatcher = Dispatcher::new(generator.clone(), DispatchConfig::default());

    let err = dispatcher.generate_for_mode(&design("anything")).await.unwrap_err();

    assert!(matches!(err, AppError::BatchAborted { completed: 0, .. }));
    assert_eq!(err.failed_kind(), Some("logo"));

    let requests = generator.requests();
    assert_eq!(requests.len(), 3);
    assert!(requests.iter().all(|r| r.prompt.contains("logo image")));
}

#[tokio::test(start_paused = true)]
async fn test_banner_failure_returns_no_partial_set() {
    let generator = RecordingGenerator::new(Some("banner image"));
    let dispatcher = Dispatcher::new(generator.clone(), DispatchConfig::default());

    let err = dispatcher.generate_for_mode(&design("anything")).await.unwrap_err();

    assert!(matches!(err, AppError::BatchAborted { completed: 1, .. }));
    assert_eq!(err.failed_kind(), Some("banner"));
    // One logo call plus three banner attempts
    assert_eq!(generator.requests().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_website_failure_is_not_a_batch_error() {
    let generator = RecordingGenerator::new(Some("website mockup"));
    let config = DispatchConfig {
        max_attempts: 2,
        ..DispatchConfig::default()
    };
    let dispatcher = Dispatcher::new(generator.clone(), config);

    let request = GenerationRequest {
        user_prompt: "shop".to_string(),
        mode: GenerationMode::Website,
    };
    let err = dispatcher.generate_for_mode(&request).await.unwrap_err();

    assert!(matches!(err, AppError::ImageGeneration { attempts: 2, .. }));
    assert_eq!(generator.requests().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_total_backoff_before_final_attempt() {
    let generator = RecordingGenerator::new(Some("logo image"));
    let dispatcher = Dispatcher::new(generator, DispatchConfig::default());

    let started = tokio::time::Instant::now();
    let _ = dispatcher
        .generate(&ImageKind::Logo.render_prompt("x"), "1024x1024", ImageKind::Logo, 3)
        .await;

    // 2 units before attempt 2, 4 units before attempt 3
    assert_eq!(started.elapsed(), Duration::from_secs(6));
}
