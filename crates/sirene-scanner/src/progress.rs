//! Batch progress tracking.
//!
//! Each batch keeps live counters, per-site results and a bounded log
//! of recent activity. A snapshot view adds derived figures
//! (throughput, ETA) without exposing the mutable state. Counters
//! freeze once the batch reaches its terminal state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sirene_core::{BatchId, Outcome};
use sirene_extract::IdentifierSet;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Instant;

/// Bound on the recent-activity ring buffer.
const RECENT_LINES: usize = 50;

/// Terminal record for one site in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteResult {
    /// The submitted URL
    pub url: String,
    /// What was found
    pub identifiers: IdentifierSet,
    /// How the site resolved
    pub outcome: Outcome,
    /// Error detail for `Error` and `Blocked` outcomes
    pub error: Option<String>,
    /// Page the identifiers were found on
    pub found_on: Option<String>,
    /// Pages fetched for this site
    pub pages_checked: usize,
    /// Whether the visible-browser fallback was used
    pub used_visible: bool,
    /// Worker slot that processed the site
    pub worker_slot: usize,
    /// Credential-free proxy label, if one was used
    pub proxy: Option<String>,
    /// Wall-clock time spent on the site, in milliseconds
    pub duration_ms: u64,
    /// When the site finished
    pub finished_at: DateTime<Utc>,
}

/// Mutable state of one batch.
#[derive(Debug)]
pub struct BatchState {
    id: BatchId,
    total: usize,
    completed: usize,
    success: usize,
    no_data: usize,
    error: usize,
    blocked: usize,
    in_progress: bool,
    started: Instant,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    final_elapsed: Option<std::time::Duration>,
    results: Vec<SiteResult>,
    recent: VecDeque<String>,
}

impl BatchState {
    /// Fresh in-progress state for `total` sites.
    #[must_use]
    pub fn new(id: BatchId, total: usize) -> Self {
        Self {
            id,
            total,
            completed: 0,
            success: 0,
            no_data: 0,
            error: 0,
            blocked: 0,
            in_progress: true,
            started: Instant::now(),
            started_at: Utc::now(),
            finished_at: None,
            final_elapsed: None,
            results: Vec::with_capacity(total),
            recent: VecDeque::with_capacity(RECENT_LINES),
        }
    }

    /// Batch identifier.
    #[must_use]
    pub fn id(&self) -> &BatchId {
        &self.id
    }

    /// Record one terminal site result. Ignored once the batch has
    /// finished, so late stragglers cannot corrupt frozen counters.
    pub fn record(&mut self, result: SiteResult) {
        if !self.in_progress {
            tracing::warn!(batch = %self.id, url = %result.url, "result after batch finished, dropped");
            return;
        }

        self.completed += 1;
        match result.outcome {
            Outcome::Success => self.success += 1,
            Outcome::NoData => self.no_data += 1,
            Outcome::Error => self.error += 1,
            Outcome::Blocked => self.blocked += 1,
        }

        let line = match (&result.outcome, &result.found_on) {
            (Outcome::Success, Some(found_on)) => {
                format!("{} -> {} (on {})", result.url, result.outcome, found_on)
            }
            _ => format!("{} -> {}", result.url, result.outcome),
        };
        if self.recent.len() >= RECENT_LINES {
            self.recent.pop_front();
        }
        self.recent.push_back(line);

        self.results.push(result);
    }

    /// Flip to the terminal state. Idempotent. Elapsed time freezes
    /// here so late snapshots report the batch's real duration.
    pub fn finish(&mut self) {
        if self.in_progress {
            self.in_progress = false;
            self.finished_at = Some(Utc::now());
            self.final_elapsed = Some(self.started.elapsed());
        }
    }

    /// All recorded results so far.
    #[must_use]
    pub fn results(&self) -> &[SiteResult] {
        &self.results
    }

    /// Point-in-time view with derived figures.
    #[must_use]
    pub fn snapshot(&self) -> BatchSnapshot {
        let elapsed = self
            .final_elapsed
            .unwrap_or_else(|| self.started.elapsed())
            .as_secs_f64();
        let throughput = if elapsed > 0.0 && self.completed > 0 {
            Some(self.completed as f64 / elapsed)
        } else {
            None
        };
        let eta_secs = match (self.in_progress, throughput) {
            (true, Some(rate)) if rate > 0.0 => {
                Some(((self.total - self.completed) as f64 / rate) as u64)
            }
            _ => None,
        };

        BatchSnapshot {
            id: self.id.clone(),
            total: self.total,
            completed: self.completed,
            success: self.success,
            failed: self.no_data + self.error + self.blocked,
            no_data: self.no_data,
            error: self.error,
            blocked: self.blocked,
            in_progress: self.in_progress,
            started_at: self.started_at,
            finished_at: self.finished_at,
            elapsed_secs: elapsed,
            throughput_per_sec: throughput,
            eta_secs,
            recent: self.recent.iter().cloned().collect(),
        }
    }
}

/// Read-only progress view of one batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSnapshot {
    /// Batch identifier
    pub id: BatchId,
    /// Sites submitted
    pub total: usize,
    /// Sites finished, any outcome
    pub completed: usize,
    /// Sites with at least one identifier
    pub success: usize,
    /// Sites without one: `no_data + error + blocked`
    pub failed: usize,
    /// Sites checked clean
    pub no_data: usize,
    /// Sites that failed to fetch
    pub error: usize,
    /// Sites stuck behind a challenge
    pub blocked: usize,
    /// Whether work is still running
    pub in_progress: bool,
    /// When the batch started
    pub started_at: DateTime<Utc>,
    /// When the batch finished, if it has
    pub finished_at: Option<DateTime<Utc>>,
    /// Elapsed wall-clock seconds, frozen once the batch finishes
    pub elapsed_secs: f64,
    /// Completed sites per second
    pub throughput_per_sec: Option<f64>,
    /// Estimated seconds remaining, only while in progress
    pub eta_secs: Option<u64>,
    /// Most recent activity lines, oldest first
    pub recent: Vec<String>,
}

/// Storage seam for batch state.
///
/// The in-memory implementation below is the only one shipped; the
/// trait keeps a persistent backend possible without touching the
/// scheduler.
pub trait BatchStore: Send + Sync {
    /// Register a new batch.
    fn insert(&self, state: BatchState);

    /// Mutate a batch's state in place. Returns false when the batch
    /// is unknown.
    fn update(&self, id: &BatchId, apply: &mut dyn FnMut(&mut BatchState)) -> bool;

    /// Progress snapshot for a batch.
    fn snapshot(&self, id: &BatchId) -> Option<BatchSnapshot>;

    /// Per-site results recorded so far.
    fn results(&self, id: &BatchId) -> Option<Vec<SiteResult>>;
}

/// `HashMap`-backed batch store.
#[derive(Debug, Default)]
pub struct InMemoryBatchStore {
    batches: Mutex<HashMap<BatchId, BatchState>>,
}

impl InMemoryBatchStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl BatchStore for InMemoryBatchStore {
    fn insert(&self, state: BatchState) {
        if let Ok(mut batches) = self.batches.lock() {
            batches.insert(state.id().clone(), state);
        }
    }

    fn update(&self, id: &BatchId, apply: &mut dyn FnMut(&mut BatchState)) -> bool {
        let Ok(mut batches) = self.batches.lock() else {
            return false;
        };
        match batches.get_mut(id) {
            Some(state) => {
                apply(state);
                true
            }
            None => false,
        }
    }

    fn snapshot(&self, id: &BatchId) -> Option<BatchSnapshot> {
        self.batches.lock().ok()?.get(id).map(BatchState::snapshot)
    }

    fn results(&self, id: &BatchId) -> Option<Vec<SiteResult>> {
        self.batches
            .lock()
            .ok()?
            .get(id)
            .map(|state| state.results().to_vec())
    }
}
