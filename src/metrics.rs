// Performance metrics module
//
// Provides lightweight counters for monitoring crafting runs

use crate::models::RunOutcome;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Process-wide crafting metrics
///
/// Uses atomic operations for thread-safe metric tracking without locks.
/// Metrics are collected across runs and logged on shutdown.
#[derive(Debug)]
pub struct Metrics {
    /// Runs that were started
    pub runs_started: AtomicUsize,

    /// Runs that ended on their own (completed, exhausted or stalled)
    pub runs_succeeded: AtomicUsize,

    /// Runs that were cancelled or faulted
    pub runs_failed: AtomicUsize,

    /// Crafting cycles executed across all runs
    pub cycles: AtomicU64,

    /// Work queue builds
    pub queue_builds: AtomicU64,

    /// Work queue builds that found no inventory data
    pub queue_build_failures: AtomicU64,

    pub items_applied: AtomicUsize,
    pub items_skipped: AtomicUsize,

    /// Wall time spent inside runs, in milliseconds
    pub total_run_time_ms: AtomicU64,

    /// Application start time
    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            runs_started: AtomicUsize::new(0),
            runs_succeeded: AtomicUsize::new(0),
            runs_failed: AtomicUsize::new(0),
            cycles: AtomicU64::new(0),
            queue_builds: AtomicU64::new(0),
            queue_build_failures: AtomicU64::new(0),
            items_applied: AtomicUsize::new(0),
            items_skipped: AtomicUsize::new(0),
            total_run_time_ms: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_run_started(&self) {
        self.runs_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Record how a run ended and how long it took
    pub fn record_run_finished(&self, outcome: &RunOutcome, duration: Duration) {
        if outcome.is_success() {
            self.runs_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.runs_failed.fetch_add(1, Ordering::Relaxed);
        }
        self.total_run_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn record_cycle(&self) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_queue_build(&self) {
        self.queue_builds.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_queue_build_failure(&self) {
        self.queue_build_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_item_applied(&self) {
        self.items_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_item_skipped(&self) {
        self.items_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average applications per cycle
    pub fn avg_items_per_cycle(&self) -> f64 {
        let items = self.items_applied.load(Ordering::Relaxed);
        let cycles = self.cycles.load(Ordering::Relaxed);
        if cycles > 0 {
            items as f64 / cycles as f64
        } else {
            0.0
        }
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        let uptime = self.uptime();
        tracing::info!("=== Crafting Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", uptime.as_secs_f64());
        tracing::info!(
            "Runs: {} started, {} succeeded, {} failed",
            self.runs_started.load(Ordering::Relaxed),
            self.runs_succeeded.load(Ordering::Relaxed),
            self.runs_failed.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Cycles: {} (avg: {:.2} items per cycle), time in runs: {:.2}s",
            self.cycles.load(Ordering::Relaxed),
            self.avg_items_per_cycle(),
            self.total_run_time_ms.load(Ordering::Relaxed) as f64 / 1000.0
        );
        tracing::info!(
            "Items: {} applied, {} skipped",
            self.items_applied.load(Ordering::Relaxed),
            self.items_skipped.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Queue builds: {}, unavailable snapshots: {}",
            self.queue_builds.load(Ordering::Relaxed),
            self.queue_build_failures.load(Ordering::Relaxed)
        );
    }

    /// Log progress at the end of a cycle
    pub fn log_periodic(&self) {
        tracing::debug!(
            "Metrics: {} cycles, {} items applied, {} skipped, uptime {:.0}s",
            self.cycles.load(Ordering::Relaxed),
            self.items_applied.load(Ordering::Relaxed),
            self.items_skipped.load(Ordering::Relaxed),
            self.uptime().as_secs_f64()
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
