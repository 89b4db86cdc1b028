//! Recurring stats refresh task

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::stats::refresher::StatsRefresher;

struct RunningTask {
    handle: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

/// Owns the background task that refreshes stats on a fixed interval
pub struct RefreshScheduler {
    refresher: Arc<StatsRefresher>,
    task: Mutex<Option<RunningTask>>,
}

impl RefreshScheduler {
    pub fn new(refresher: Arc<StatsRefresher>) -> Self {
        Self {
            refresher,
            task: Mutex::new(None),
        }
    }

    /// Start the refresh task. The first tick fires one interval from now.
    pub async fn start(&self, interval: Duration) {
        let mut task = self.task.lock().await;
        if let Some(running) = task.take() {
            stop_task(running).await;
        }

        let refresher = self.refresher.clone();
        let (shutdown, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => {
                        debug!("Scheduled stats refresh");
                        // Failures are logged by the refresher and leave the old snapshot
                        let _ = refresher.refresh().await;
                    }
                }
            }
        });

        *task = Some(RunningTask { handle, shutdown });
        info!(interval_secs = interval.as_secs(), "Started stats refresh task");
    }

    /// Stop the refresh task and wait for it to finish
    pub async fn stop(&self) {
        if let Some(running) = self.task.lock().await.take() {
            stop_task(running).await;
            info!("Stopped stats refresh task");
        }
    }

    pub async fn is_running(&self) -> bool {
        self.task.lock().await.is_some()
    }
}

async fn stop_task(running: RunningTask) {
    let _ = running.shutdown.send(true);
    let _ = running.handle.await;
}
