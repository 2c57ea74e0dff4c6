//! Thread-safe metrics collection
//!
//! Atomic counters for the task lifecycle and mutex-protected collections for
//! per-stage timing. A snapshot is served on `GET /metrics`.

use crate::agents::Stage;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Keep at most this many duration samples per series
const MAX_SAMPLES: usize = 1000;

/// Global metrics collector instance
pub static METRICS: Lazy<MetricsCollector> = Lazy::new(MetricsCollector::new);

/// Get reference to global metrics collector
pub fn metrics() -> &'static MetricsCollector {
    &METRICS
}

/// Thread-safe metrics collector using atomics and mutexes
pub struct MetricsCollector {
    tasks_submitted: AtomicU64,
    tasks_rejected: AtomicU64,
    tasks_in_flight: AtomicU64,
    max_in_flight: AtomicU64,
    tasks_completed: AtomicU64,
    tasks_failed: AtomicU64,

    // milliseconds
    task_durations: Mutex<Vec<u64>>,
    stage_stats: Mutex<HashMap<Stage, StageStats>>,

    uptime_start: AtomicU64,
}

#[derive(Debug, Default)]
struct StageStats {
    invocations: u64,
    failures: u64,
    // milliseconds, over every invocation
    total_duration_ms: u64,
    durations: Vec<u64>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            tasks_submitted: AtomicU64::new(0),
            tasks_rejected: AtomicU64::new(0),
            tasks_in_flight: AtomicU64::new(0),
            max_in_flight: AtomicU64::new(0),
            tasks_completed: AtomicU64::new(0),
            tasks_failed: AtomicU64::new(0),
            task_durations: Mutex::new(Vec::new()),
            stage_stats: Mutex::new(HashMap::new()),
            uptime_start: AtomicU64::new(current_timestamp()),
        }
    }

    pub fn task_submitted(&self) {
        self.tasks_submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn task_rejected(&self) {
        self.tasks_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn task_started(&self) {
        let in_flight = self.tasks_in_flight.fetch_add(1, Ordering::Relaxed) + 1;
        self.max_in_flight.fetch_max(in_flight, Ordering::Relaxed);
    }

    pub fn task_completed(&self, duration: Duration) {
        self.tasks_completed.fetch_add(1, Ordering::Relaxed);
        self.task_finished(duration);
    }

    pub fn task_failed(&self, duration: Duration) {
        self.tasks_failed.fetch_add(1, Ordering::Relaxed);
        self.task_finished(duration);
    }

    /// Count a failure for a task that never reached `task_started`
    pub fn task_failed_before_start(&self) {
        self.tasks_failed.fetch_add(1, Ordering::Relaxed);
    }

    fn task_finished(&self, duration: Duration) {
        let _ = self
            .tasks_in_flight
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
                Some(n.saturating_sub(1))
            });

        if let Ok(mut durations) = self.task_durations.lock() {
            push_sample(&mut durations, duration);
        }
    }

    pub fn stage_finished(&self, stage: Stage, duration: Duration, success: bool) {
        if let Ok(mut stats) = self.stage_stats.lock() {
            let entry = stats.entry(stage).or_default();
            entry.invocations += 1;
            if !success {
                entry.failures += 1;
            }
            entry.total_duration_ms = entry
                .total_duration_ms
                .saturating_add(duration.as_millis() as u64);
            push_sample(&mut entry.durations, duration);
        }
    }

    /// Reset all metrics (useful for testing)
    pub fn reset(&self) {
        for counter in [
            &self.tasks_submitted,
            &self.tasks_rejected,
            &self.tasks_in_flight,
            &self.max_in_flight,
            &self.tasks_completed,
            &self.tasks_failed,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        if let Ok(mut durations) = self.task_durations.lock() {
            durations.clear();
        }
        if let Ok(mut stats) = self.stage_stats.lock() {
            stats.clear();
        }
        self.uptime_start
            .store(current_timestamp(), Ordering::Relaxed);
    }

    fn task_duration_statistics(&self) -> (f64, f64, f64) {
        let Ok(durations) = self.task_durations.lock() else {
            return (0.0, 0.0, 0.0);
        };
        if durations.is_empty() {
            return (0.0, 0.0, 0.0);
        }

        let mut sorted = durations.clone();
        sorted.sort_unstable();
        (
            average(&sorted),
            percentile(&sorted, 50.0),
            percentile(&sorted, 95.0),
        )
    }

    fn stage_snapshots(&self) -> HashMap<String, StageSnapshot> {
        let Ok(stats) = self.stage_stats.lock() else {
            return HashMap::new();
        };

        stats
            .iter()
            .map(|(stage, stats)| {
                (
                    stage.as_str().to_string(),
                    StageSnapshot {
                        invocations: stats.invocations,
                        failures: stats.failures,
                        avg_duration_ms: average(&stats.durations),
                        total_duration_ms: stats.total_duration_ms,
                    },
                )
            })
            .collect()
    }

    /// Get complete metrics snapshot
    pub fn get_metrics(&self) -> MetricsSnapshot {
        let now = current_timestamp();
        let (avg_duration_ms, p50, p95) = self.task_duration_statistics();

        MetricsSnapshot {
            tasks: TaskMetrics {
                submitted: self.tasks_submitted.load(Ordering::Relaxed),
                rejected: self.tasks_rejected.load(Ordering::Relaxed),
                in_flight: self.tasks_in_flight.load(Ordering::Relaxed),
                max_in_flight: self.max_in_flight.load(Ordering::Relaxed),
                completed: self.tasks_completed.load(Ordering::Relaxed),
                failed: self.tasks_failed.load(Ordering::Relaxed),
                avg_duration_ms,
                duration_p50_ms: p50,
                duration_p95_ms: p95,
            },
            stages: self.stage_snapshots(),
            uptime_seconds: now.saturating_sub(self.uptime_start.load(Ordering::Relaxed)),
            timestamp: now,
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub tasks: TaskMetrics,
    pub stages: HashMap<String, StageSnapshot>,
    pub uptime_seconds: u64,
    pub timestamp: u64,
}

#[derive(Debug, Serialize)]
pub struct TaskMetrics {
    pub submitted: u64,
    pub rejected: u64,
    pub in_flight: u64,
    pub max_in_flight: u64,
    pub completed: u64,
    pub failed: u64,
    pub avg_duration_ms: f64,
    pub duration_p50_ms: f64,
    pub duration_p95_ms: f64,
}

#[derive(Debug, Serialize)]
pub struct StageSnapshot {
    pub invocations: u64,
    pub failures: u64,
    pub avg_duration_ms: f64,
    pub total_duration_ms: u64,
}

fn push_sample(samples: &mut Vec<u64>, duration: Duration) {
    samples.push(duration.as_millis() as u64);
    if samples.len() > MAX_SAMPLES {
        samples.remove(0);
    }
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn average(data: &[u64]) -> f64 {
    if data.is_empty() {
        0.0
    } else {
        data.iter().sum::<u64>() as f64 / data.len() as f64
    }
}

fn percentile(sorted_data: &[u64], percentile: f64) -> f64 {
    if sorted_data.is_empty() {
        return 0.0;
    }

    let index = (percentile / 100.0) * (sorted_data.len() - 1) as f64;
    let lower = sorted_data[index.floor() as usize] as f64;
    let upper = sorted_data[index.ceil() as usize] as f64;

    lower + (upper - lower) * index.fract()
}
