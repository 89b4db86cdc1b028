//! Unit tests for the stats refresher

use async_trait::async_trait;
use forge_relay::backend::traits::{AnalyticsSource, Row};
use forge_relay::config::{AnalyticsConfig, AnalyticsQuery};
use forge_relay::stats::{StatsQueries, StatsRefresher, StatsStore};
use forge_relay::{AppError, Result};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

/// Serves canned rows per query id; ids mapped to `None` fail
#[derive(Default)]
struct CannedSource {
    responses: Mutex<HashMap<String, Option<Vec<Value>>>>,
}

impl CannedSource {
    fn set(&self, query_id: &str, rows: Option<Vec<Value>>) {
        self.responses.lock().insert(query_id.to_string(), rows);
    }
}

#[async_trait]
impl AnalyticsSource for CannedSource {
    async fn fetch_rows(&self, query_id: &str) -> Result<Vec<Row>> {
        let response = self.responses.lock().get(query_id).cloned().flatten();
        match response {
            Some(rows) => Ok(rows
                .into_iter()
                .filter_map(|v| v.as_object().cloned())
                .collect()),
            None => Err(AppError::RemoteCall(format!("query {} failed", query_id))),
        }
    }
}

fn queries() -> StatsQueries {
    StatsQueries {
        tokens_created: AnalyticsQuery::new("token_created", "token_count"),
        trading_volume: AnalyticsQuery::new("trading_volume", "total_volume"),
        active_users: AnalyticsQuery::new("active_users", "active_users"),
    }
}

fn refresher(source: Arc<CannedSource>) -> (StatsRefresher, Arc<StatsStore>) {
    let store = Arc::new(StatsStore::new());
    let refresher = StatsRefresher::new(
        Some(source as Arc<dyn AnalyticsSource>),
        queries(),
        store.clone(),
    );
    (refresher, store)
}

#[tokio::test]
async fn test_first_row_feeds_counter() {
    let source = Arc::new(CannedSource::default());
    source.set("token_created", Some(vec![json!({"token_count": 42}), json!({"token_count": 7})]));
    source.set("trading_volume", Some(vec![json!({"total_volume": 1250.75})]));
    source.set("active_users", Some(vec![json!({"active_users": 18})]));
    let (refresher, _) = refresher(source);

    let snapshot = refresher.fetch_and_aggregate().await.unwrap();

    assert_eq!(snapshot.tokens_created, 42);
    assert_eq!(snapshot.trading_volume, 1250.75);
    assert_eq!(snapshot.active_users, 18);
    assert!(snapshot.last_updated.is_some());
}

#[tokio::test]
async fn test_empty_rows_yield_zero() {
    let source = Arc::new(CannedSource::default());
    source.set("token_created", Some(vec![]));
    source.set("trading_volume", Some(vec![json!({"total_volume": 3.5})]));
    source.set("active_users", Some(vec![json!({"other": 1})]));
    let (refresher, _) = refresher(source);

    let snapshot = refresher.fetch_and_aggregate().await.unwrap();

    assert_eq!(snapshot.tokens_created, 0);
    assert_eq!(snapshot.trading_volume, 3.5);
    assert_eq!(snapshot.active_users, 0);
}

#[tokio::test]
async fn test_one_failing_query_only_zeroes_its_counter() {
    let source = Arc::new(CannedSource::default());
    source.set("token_created", Some(vec![json!({"token_count": 42})]));
    source.set("trading_volume", None);
    source.set("active_users", Some(vec![json!({"active_users": 9})]));
    let (refresher, _) = refresher(source);

    let snapshot = refresher.fetch_and_aggregate().await.unwrap();

    assert_eq!(snapshot.tokens_created, 42);
    assert_eq!(snapshot.trading_volume, 0.0);
    assert_eq!(snapshot.active_users, 9);
}

#[tokio::test]
async fn test_successive_refreshes_replace_without_merging() {
    let source = Arc::new(CannedSource::default());
    source.set("token_created", Some(vec![json!({"token_count": 1})]));
    source.set("trading_volume", Some(vec![json!({"total_volume": 10.0})]));
    source.set("active_users", Some(vec![json!({"active_users": 100})]));
    let (refresher, store) = refresher(source.clone());

    let first = assert_ok!(refresher.refresh().await);

    source.set("token_created", Some(vec![json!({"token_count": 2})]));
    source.set("trading_volume", Some(vec![json!({"total_volume": 20.0})]));
    source.set("active_users", Some(vec![]));
    let second = assert_ok!(refresher.refresh().await);

    assert!(second.last_updated > first.last_updated);
    assert_eq!(second.tokens_created, 2);
    assert_eq!(second.trading_volume, 20.0);
    assert_eq!(second.active_users, 0);
    assert_eq!(*store.load(), *second);
}

#[tokio::test]
async fn test_all_queries_failing_keeps_previous_snapshot() {
    let source = Arc::new(CannedSource::default());
    source.set("token_created", Some(vec![json!({"token_count": 5})]));
    source.set("trading_volume", Some(vec![json!({"total_volume": 1.0})]));
    source.set("active_users", Some(vec![json!({"active_users": 2})]));
    let (refresher, store) = refresher(source.clone());
    let installed = assert_ok!(refresher.refresh().await);

    source.set("token_created", None);
    source.set("trading_volume", None);
    source.set("active_users", None);
    assert_err!(refresher.refresh().await);

    assert_eq!(*store.load(), *installed);
}

#[tokio::test]
async fn test_missing_analytics_key_installs_zero_snapshot() {
    let store = Arc::new(StatsStore::new());
    let refresher = StatsRefresher::new(
        None,
        StatsQueries::from(&AnalyticsConfig::default()),
        store.clone(),
    );

    let snapshot = assert_ok!(refresher.refresh().await);

    assert_eq!(snapshot.tokens_created, 0);
    assert_eq!(snapshot.active_users, 0);
    assert!(store.last_updated().is_some());
}

/// Never answers
struct HangingSource;

#[async_trait]
impl AnalyticsSource for HangingSource {
    async fn fetch_rows(&self, _query_id: &str) -> Result<Vec<Row>> {
        std::future::pending().await
    }
}

#[tokio::test(start_paused = true)]
async fn test_best_effort_refresh_gives_up_after_timeout() {
    let store = Arc::new(StatsStore::new());
    let refresher = StatsRefresher::new(
        Some(Arc::new(HangingSource) as Arc<dyn AnalyticsSource>),
        queries(),
        store.clone(),
    );

    let snapshot = refresher.refresh_best_effort(Duration::from_secs(10)).await;

    assert_eq!(snapshot.tokens_created, 0);
    assert!(snapshot.last_updated.is_none());
    assert!(store.last_updated().is_none());
}
