//! Short-term memory of headings the robot has recently pointed along.
//!
//! Headings are bucketed at 0.1 rad. Entries older than the configured
//! window are forgotten, and the history is capped so memory stays bounded
//! on long runs.

use std::collections::{BTreeSet, VecDeque};
use std::f64::consts::PI;

use helm_ir::normalize_angle;
use serde::{Deserialize, Serialize};

pub const BUCKET_WIDTH: f64 = 0.1;

/// Buckets needed to cover a full turn.
pub fn bucket_count() -> usize {
    (2.0 * PI / BUCKET_WIDTH).ceil() as usize
}

pub fn bucket_of(angle: f64) -> i64 {
    (normalize_angle(angle) / BUCKET_WIDTH).round() as i64
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Visit {
    bucket: i64,
    at_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorationMemory {
    visits: VecDeque<Visit>,
    window_ms: u64,
    capacity: usize,
}

impl ExplorationMemory {
    pub fn new(window_ms: u64, capacity: usize) -> Self {
        Self {
            visits: VecDeque::new(),
            window_ms,
            capacity: capacity.max(1),
        }
    }

    pub fn record(&mut self, heading: f64, now_ms: u64) {
        self.visits.push_back(Visit {
            bucket: bucket_of(heading),
            at_ms: now_ms,
        });
        while self.visits.len() > self.capacity {
            self.visits.pop_front();
        }
    }

    /// Drop visits older than the window.
    pub fn forget(&mut self, now_ms: u64) {
        let cutoff = now_ms.saturating_sub(self.window_ms);
        while self.visits.front().is_some_and(|v| v.at_ms < cutoff) {
            self.visits.pop_front();
        }
    }

    pub fn visits(&self, heading: f64) -> usize {
        let bucket = bucket_of(heading);
        self.visits.iter().filter(|v| v.bucket == bucket).count()
    }

    /// 1.0 for a heading never visited, shrinking with each visit.
    pub fn novelty(&self, heading: f64) -> f64 {
        1.0 / (1.0 + self.visits(heading) as f64)
    }

    /// Fraction of all heading buckets visited within the window.
    pub fn exploration_score(&self) -> f64 {
        let distinct: BTreeSet<i64> = self.visits.iter().map(|v| v.bucket).collect();
        (distinct.len() as f64 / bucket_count() as f64).min(1.0)
    }

    pub fn len(&self) -> usize {
        self.visits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visits.is_empty()
    }

    pub fn clear(&mut self) {
        self.visits.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_novelty_decays_with_visits() {
        let mut memory = ExplorationMemory::new(60_000, 100);
        assert_eq!(memory.novelty(0.0), 1.0);
        memory.record(0.0, 0);
        memory.record(0.02, 10);
        assert_eq!(memory.visits(0.0), 2);
        assert!((memory.novelty(0.0) - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(memory.novelty(1.0), 1.0);
    }

    #[test]
    fn test_forget_after_window() {
        let mut memory = ExplorationMemory::new(60_000, 100);
        memory.record(0.5, 1_000);
        memory.record(1.5, 50_000);
        memory.forget(61_001);
        assert_eq!(memory.len(), 1);
        assert_eq!(memory.visits(0.5), 0);
        assert_eq!(memory.visits(1.5), 1);
    }

    #[test]
    fn test_capacity_bound() {
        let mut memory = ExplorationMemory::new(60_000, 3);
        for i in 0..10 {
            memory.record(i as f64 * 0.3, i);
        }
        assert_eq!(memory.len(), 3);
    }

    #[test]
    fn test_exploration_score_counts_distinct_buckets() {
        let mut memory = ExplorationMemory::new(60_000, 100);
        assert_eq!(memory.exploration_score(), 0.0);
        memory.record(0.0, 0);
        memory.record(0.0, 1);
        memory.record(1.0, 2);
        let expected = 2.0 / bucket_count() as f64;
        assert!((memory.exploration_score() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_seam_headings_share_bucket() {
        assert_eq!(bucket_of(PI), bucket_of(-PI));
    }
}
