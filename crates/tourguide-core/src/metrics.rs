//! Per-conversation quality counters
//!
//! Counters are cheap atomics shared between the orchestrator and the tool
//! dispatcher. They can be snapshotted for logs or exported as Prometheus text.

use serde::Serialize;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A thread-safe counter metric
#[derive(Debug, Default, Clone)]
pub struct Counter {
    value: Arc<AtomicU64>,
}

impl Counter {
    /// Create a new counter
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the counter by 1
    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the counter by a specific amount
    pub fn inc_by(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    /// Get the current value
    #[must_use]
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    /// Reset the counter to zero
    pub fn reset(&self) {
        self.value.store(0, Ordering::Relaxed);
    }
}

/// Counters of one conversation; clones share the same values
#[derive(Debug, Default, Clone)]
pub struct OrchestratorMetrics {
    /// Text announced a search without calling the tool
    pub promised_search_detections: Counter,
    /// Search blocked because a booking slot was missing
    pub cascade_incomplete_detections: Counter,
    /// Departure window repaired before submission
    pub date_window_corrections: Counter,
    /// Night range repaired before submission
    pub night_corrections: Counter,
    /// Searches submitted to the backend
    pub total_searches: Counter,
    /// User turns
    pub total_messages: Counter,
    /// Search blocked because a named resort had no region filter
    pub resort_without_region_detections: Counter,
}

/// Point-in-time copy of [`OrchestratorMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub promised_search_detections: u64,
    pub cascade_incomplete_detections: u64,
    pub date_window_corrections: u64,
    pub night_corrections: u64,
    pub total_searches: u64,
    pub total_messages: u64,
    pub resort_without_region_detections: u64,
}

impl OrchestratorMetrics {
    /// Create zeroed metrics
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn counters(&self) -> [(&'static str, &Counter); 7] {
        [
            ("promised_search_detections", &self.promised_search_detections),
            ("cascade_incomplete_detections", &self.cascade_incomplete_detections),
            ("date_window_corrections", &self.date_window_corrections),
            ("night_corrections", &self.night_corrections),
            ("total_searches", &self.total_searches),
            ("total_messages", &self.total_messages),
            ("resort_without_region_detections", &self.resort_without_region_detections),
        ]
    }

    /// Current values
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            promised_search_detections: self.promised_search_detections.get(),
            cascade_incomplete_detections: self.cascade_incomplete_detections.get(),
            date_window_corrections: self.date_window_corrections.get(),
            night_corrections: self.night_corrections.get(),
            total_searches: self.total_searches.get(),
            total_messages: self.total_messages.get(),
            resort_without_region_detections: self.resort_without_region_detections.get(),
        }
    }

    /// Zero every counter
    pub fn reset(&self) {
        for (_, counter) in self.counters() {
            counter.reset();
        }
    }

    /// Export in Prometheus text format, names prefixed with `tourguide_`
    #[must_use]
    pub fn export_prometheus(&self) -> String {
        let mut output = String::new();
        for (name, counter) in self.counters() {
            let _ = write!(
                output,
                "# TYPE tourguide_{name} counter\ntourguide_{name} {}\n",
                counter.get()
            );
        }
        output
    }
}
