//! Harvest pipeline: paginated collection and resumable detail enrichment.
//!
//! Each stage reads its snapshot once, drives requests through a
//! [`Scheduler`] one at a time, and persists after every successful unit so
//! an interrupted run can simply be started again.

mod collect;
mod enrich;
mod scheduler;
mod snapshot;

pub use collect::{collect_specialists, list_page_url, pages_for, ListQuery, PageCursor};
pub use enrich::{detail_url, enrich};
pub use scheduler::Scheduler;
pub use snapshot::{read_json, read_json_or_default, write_json_atomic, Snapshot};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a stage did during one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageSummary {
    pub stage: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Requests issued (each followed by one throttle pause).
    pub requests: usize,
    /// Records newly written to the snapshot.
    pub added: usize,
    /// Work units skipped because the snapshot already had them.
    pub already_present: usize,
    /// Pages or ids that failed and were skipped; a later run retries them.
    pub failed: Vec<String>,
    /// Records in the snapshot when the stage finished.
    pub snapshot_len: usize,
}

impl StageSummary {
    pub fn start(stage: &str) -> Self {
        Self {
            stage: stage.to_string(),
            started_at: Utc::now(),
            completed_at: None,
            requests: 0,
            added: 0,
            already_present: 0,
            failed: Vec::new(),
            snapshot_len: 0,
        }
    }

    pub fn finish(mut self, requests: usize, snapshot_len: usize) -> Self {
        self.requests = requests;
        self.snapshot_len = snapshot_len;
        self.completed_at = Some(Utc::now());
        self
    }

    pub fn duration_ms(&self) -> Option<i64> {
        self.completed_at
            .map(|done| (done - self.started_at).num_milliseconds())
    }
}
