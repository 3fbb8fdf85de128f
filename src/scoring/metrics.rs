//! Running scoring statistics.
//!
//! Updated with relaxed atomics so recording never sits on the critical
//! path of returning a score, and never fails the scoring call.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

use crate::scoring::ConfidenceLevel;

/// Lock-free counters shared across concurrent scoring pipelines.
#[derive(Debug, Default)]
pub struct ScoringMetrics {
    scored: AtomicU64,
    total_micros: AtomicU64,
    by_level: [AtomicU64; 5],
}

/// Point-in-time view of the counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub scored: u64,
    pub very_high: u64,
    pub high: u64,
    pub medium: u64,
    pub low: u64,
    pub very_low: u64,
    pub average_processing_time: Duration,
}

impl ScoringMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one scored match. Best-effort: relaxed ordering, no locks.
    pub fn record(&self, level: ConfidenceLevel, elapsed: Duration) {
        self.scored.fetch_add(1, Ordering::Relaxed);
        self.total_micros
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
        self.by_level[level_index(level)].fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let scored = self.scored.load(Ordering::Relaxed);
        let total_micros = self.total_micros.load(Ordering::Relaxed);
        let average = if scored == 0 {
            Duration::ZERO
        } else {
            Duration::from_micros(total_micros / scored)
        };
        MetricsSnapshot {
            scored,
            very_high: self.by_level[0].load(Ordering::Relaxed),
            high: self.by_level[1].load(Ordering::Relaxed),
            medium: self.by_level[2].load(Ordering::Relaxed),
            low: self.by_level[3].load(Ordering::Relaxed),
            very_low: self.by_level[4].load(Ordering::Relaxed),
            average_processing_time: average,
        }
    }
}

fn level_index(level: ConfidenceLevel) -> usize {
    match level {
        ConfidenceLevel::VeryHigh => 0,
        ConfidenceLevel::High => 1,
        ConfidenceLevel::Medium => 2,
        ConfidenceLevel::Low => 3,
        ConfidenceLevel::VeryLow => 4,
    }
}
