//! HTTP handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::dispatch::{GenerationMode, GenerationRequest, ImageResult};
use crate::error::{AppError, Result};
use crate::stats::StatsSnapshot;
use crate::AppState;

/// Body of `POST /generate-images`
#[derive(Debug, Deserialize)]
pub struct GenerateImagesBody {
    pub user_prompt: String,
    #[serde(alias = "chat_type")]
    pub mode: String,
}

/// Response of `POST /generate-images`
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateImagesResponse {
    pub images: Vec<ImageResult>,
    #[serde(rename = "type")]
    pub mode: GenerationMode,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "openai_api_key")]
    pub image_api_key: String,
    pub analytics_api_key: String,
    pub stats_last_updated: Option<DateTime<Utc>>,
}

fn presence(value: Option<&str>) -> String {
    let status = if value.is_some() { "present" } else { "missing" };
    status.to_string()
}

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "FORGE AI Image Generator API".to_string(),
        status: "running".to_string(),
    })
}

pub async fn generate_images(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<GenerateImagesBody>, JsonRejection>,
) -> Result<Json<GenerateImagesResponse>> {
    let Json(body) = body.map_err(|e| AppError::InvalidRequest(e.body_text()))?;

    let request_id = Uuid::new_v4();
    let span = info_span!("generate_images", request_id = %request_id, mode = %body.mode);

    async move {
        info!(user_prompt = %body.user_prompt, "New image generation request received");

        // Unknown modes are rejected before any remote call
        let mode = body.mode.parse::<GenerationMode>().map_err(|e| {
            warn!(error = %e, "Rejected generation request");
            e
        })?;

        let request = GenerationRequest {
            user_prompt: body.user_prompt,
            mode,
        };

        let images = state.dispatcher.generate_for_mode(&request).await?;

        Ok::<_, AppError>(Json(GenerateImagesResponse { images, mode }))
    }
    .instrument(span)
    .await
}

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsSnapshot> {
    Json(state.stats.load().as_ref().clone())
}

/// Refresh synchronously. Refresh failures are absorbed: the caller gets the
/// snapshot that is installed afterwards, which is the previous one.
pub async fn refresh_stats(State(state): State<Arc<AppState>>) -> Json<StatsSnapshot> {
    let snapshot = match state.refresher.refresh().await {
        Ok(snapshot) => snapshot,
        Err(_) => state.stats.load(),
    };
    Json(snapshot.as_ref().clone())
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let health = HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now(),
        image_api_key: presence(state.settings.image_api_key()),
        analytics_api_key: presence(state.settings.analytics_api_key()),
        stats_last_updated: state.stats.last_updated(),
    };

    info!(
        image_api_key = %health.image_api_key,
        analytics_api_key = %health.analytics_api_key,
        "Health check"
    );

    Json(health)
}
