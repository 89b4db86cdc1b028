//! Stats refresher: queries the analytics API and installs a new snapshot

use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::backend::traits::{AnalyticsSource, Row};
use crate::config::{AnalyticsConfig, AnalyticsQuery};
use crate::dispatch::dispatcher::saturating_millis;
use crate::error::{AppError, Result};
use crate::stats::snapshot::{StatsSnapshot, StatsStore};

/// The three queries feeding the snapshot counters
#[derive(Debug, Clone)]
pub struct StatsQueries {
    pub tokens_created: AnalyticsQuery,
    pub trading_volume: AnalyticsQuery,
    pub active_users: AnalyticsQuery,
}

impl From<&AnalyticsConfig> for StatsQueries {
    fn from(config: &AnalyticsConfig) -> Self {
        Self {
            tokens_created: config.tokens_created.clone(),
            trading_volume: config.trading_volume.clone(),
            active_users: config.active_users.clone(),
        }
    }
}

/// Refreshes the shared stats snapshot
pub struct StatsRefresher {
    /// `None` when no analytics key is configured
    source: Option<Arc<dyn AnalyticsSource>>,
    queries: StatsQueries,
    store: Arc<StatsStore>,
    /// Serialises timer-driven and on-demand refreshes
    refresh_lock: Mutex<()>,
}

impl StatsRefresher {
    pub fn new(
        source: Option<Arc<dyn AnalyticsSource>>,
        queries: StatsQueries,
        store: Arc<StatsStore>,
    ) -> Self {
        Self {
            source,
            queries,
            store,
            refresh_lock: Mutex::new(()),
        }
    }

    /// Run every query and aggregate the first rows into a new snapshot.
    ///
    /// A failed query contributes zero to its counter. Only when every query
    /// fails is the whole aggregation an error.
    pub async fn fetch_and_aggregate(&self) -> Result<StatsSnapshot> {
        let source = match &self.source {
            Some(source) => source,
            None => {
                warn!("Analytics API key not configured, using zero-valued stats");
                return Ok(StatsSnapshot::zeroed_at(Utc::now()));
            }
        };

        let (tokens, volume, users) = futures::join!(
            first_row(source.as_ref(), &self.queries.tokens_created),
            first_row(source.as_ref(), &self.queries.trading_volume),
            first_row(source.as_ref(), &self.queries.active_users),
        );

        if tokens.is_err() && volume.is_err() && users.is_err() {
            return Err(AppError::RemoteCall("All analytics queries failed".to_string()));
        }

        Ok(StatsSnapshot {
            tokens_created: read_i64(ok_row(&tokens), &self.queries.tokens_created.field),
            trading_volume: read_f64(ok_row(&volume), &self.queries.trading_volume.field),
            active_users: read_i64(ok_row(&users), &self.queries.active_users.field),
            last_updated: Some(Utc::now()),
        })
    }

    /// Fetch, aggregate and install a new snapshot.
    ///
    /// On failure the previous snapshot stays in place.
    pub async fn refresh(&self) -> Result<Arc<StatsSnapshot>> {
        let _guard = self.refresh_lock.lock().await;

        match self.fetch_and_aggregate().await {
            Ok(snapshot) => {
                let installed = self.store.replace(snapshot);
                info!(
                    tokens_created = installed.tokens_created,
                    trading_volume = installed.trading_volume,
                    active_users = installed.active_users,
                    "Stats refreshed"
                );
                Ok(installed)
            }
            Err(e) => {
                warn!(error = %e, "Stats refresh failed, keeping previous snapshot");
                Err(e)
            }
        }
    }

    /// Refresh bounded by `timeout`; never fails, used at startup
    pub async fn refresh_best_effort(&self, timeout: Duration) -> Arc<StatsSnapshot> {
        match tokio::time::timeout(timeout, self.refresh()).await {
            Ok(Ok(snapshot)) => snapshot,
            Ok(Err(_)) => self.store.load(),
            Err(_) => {
                warn!(
                    timeout_ms = saturating_millis(timeout),
                    "Initial stats refresh timed out"
                );
                self.store.load()
            }
        }
    }
}

async fn first_row(source: &dyn AnalyticsSource, query: &AnalyticsQuery) -> Result<Option<Row>> {
    match source.fetch_rows(&query.query_id).await {
        // Most recent row wins: index 0, no sorting
        Ok(rows) => Ok(rows.into_iter().next()),
        Err(e) => {
            warn!(query_id = %query.query_id, field = %query.field, error = %e, "Analytics query failed");
            Err(e)
        }
    }
}

fn ok_row(outcome: &Result<Option<Row>>) -> Option<&Row> {
    outcome.as_ref().ok().and_then(Option::as_ref)
}

fn read_i64(row: Option<&Row>, field: &str) -> i64 {
    match row.and_then(|r| r.get(field)) {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)).unwrap_or(0),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .ok()
            .or_else(|| s.trim().parse::<f64>().ok().map(|f| f as i64))
            .unwrap_or(0),
        _ => 0,
    }
}

fn read_f64(row: Option<&Row>, field: &str) -> f64 {
    match row.and_then(|r| r.get(field)) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    }
}
