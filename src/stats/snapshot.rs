//! Shared stats snapshot cell

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Aggregate dashboard counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub tokens_created: i64,
    pub trading_volume: f64,
    pub active_users: i64,
    pub last_updated: Option<DateTime<Utc>>,
}

impl StatsSnapshot {
    /// Zero-valued snapshot stamped with the given time
    pub fn zeroed_at(at: DateTime<Utc>) -> Self {
        Self {
            last_updated: Some(at),
            ..Self::default()
        }
    }
}

/// Owns the current snapshot.
///
/// Writers build a complete `StatsSnapshot` and swap it in with one
/// assignment; readers hold an `Arc` to whichever snapshot was current when
/// they looked, so a reader can never see a mix of two refreshes.
#[derive(Debug, Default)]
pub struct StatsStore {
    current: RwLock<Arc<StatsSnapshot>>,
}

impl StatsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot
    pub fn load(&self) -> Arc<StatsSnapshot> {
        self.current.read().clone()
    }

    /// Install a new snapshot, returning what was installed.
    ///
    /// `last_updated` is forced to be strictly later than the previous one.
    pub fn replace(&self, mut snapshot: StatsSnapshot) -> Arc<StatsSnapshot> {
        let mut current = self.current.write();

        if let (Some(prev), Some(next)) = (current.last_updated, snapshot.last_updated) {
            if next <= prev {
                snapshot.last_updated = Some(prev + Duration::microseconds(1));
            }
        }

        let installed = Arc::new(snapshot);
        *current = installed.clone();
        installed
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.current.read().last_updated
    }
}
