//! HTTP client for the analytics query API

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::backend::traits::{AnalyticsSource, Row};
use crate::config::AnalyticsConfig;
use crate::error::{AppError, Result};

/// Client reading the latest results of stored analytics queries
pub struct AnalyticsClient {
    client: Client,
    base_url: String,
    key_header: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct QueryResultsResponse {
    #[serde(default)]
    result: Option<QueryResult>,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    #[serde(default)]
    rows: Vec<Row>,
}

impl AnalyticsClient {
    /// Create a new client from configuration
    pub fn new(config: &AnalyticsConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            key_header: config.key_header.clone(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl AnalyticsSource for AnalyticsClient {
    async fn fetch_rows(&self, query_id: &str) -> Result<Vec<Row>> {
        let url = format!("{}/api/v1/query/{}/results", self.base_url, query_id);

        debug!(query_id = %query_id, "Fetching analytics query results");

        let response = self
            .client
            .get(&url)
            .header(self.key_header.as_str(), &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::RemoteCall(format!(
                "Analytics query {} returned {}: {}",
                query_id, status, body
            )));
        }

        let parsed = response.json::<QueryResultsResponse>().await.map_err(|e| {
            AppError::RemoteCall(format!(
                "Failed to parse analytics query {} results: {}",
                query_id, e
            ))
        })?;

        Ok(parsed.result.map(|r| r.rows).unwrap_or_default())
    }
}
