//! Stats module - Snapshot cell, analytics refresher and its recurring task

pub mod refresher;
pub mod scheduler;
pub mod snapshot;

pub use refresher::{StatsQueries, StatsRefresher};
pub use scheduler::RefreshScheduler;
pub use snapshot::{StatsSnapshot, StatsStore};
