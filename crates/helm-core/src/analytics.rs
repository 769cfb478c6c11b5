//! Run analytics.
//!
//! Tracks per-frame execution counts, sim2real divergences and the urgency
//! profile of the navigation that produced each frame.

use std::collections::BTreeMap;

use helm_nav::{NavigationResult, Urgency};
use helm_sim2real::FrameOutcome;
use serde::{Deserialize, Serialize};

/// A frame on which the two legs disagreed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivergencePoint {
    /// Frame sequence number within the run.
    pub frame: u64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunAnalytics {
    /// Frames handed to the runner.
    pub frames_executed: u64,
    pub instructions_executed: u64,
    pub instructions_blocked: u64,
    /// Frames that were compared across both legs.
    pub comparisons: u64,
    pub divergences: Vec<DivergencePoint>,
    /// How often each urgency level was predicted.
    pub urgency_counts: BTreeMap<Urgency, u64>,
    /// Highest exploration score seen.
    pub peak_exploration: f64,
    /// Last reported motor runtime (ms).
    pub motor_runtime_ms: u64,
}

impl RunAnalytics {
    pub fn new() -> Self {
        Self {
            frames_executed: 0,
            instructions_executed: 0,
            instructions_blocked: 0,
            comparisons: 0,
            divergences: Vec::new(),
            urgency_counts: BTreeMap::new(),
            peak_exploration: 0.0,
            motor_runtime_ms: 0,
        }
    }

    /// Record the navigation step that produced a frame.
    pub fn record_navigation(&mut self, result: &NavigationResult) {
        *self
            .urgency_counts
            .entry(result.prediction.urgency)
            .or_insert(0) += 1;
        if result.exploration_score > self.peak_exploration {
            self.peak_exploration = result.exploration_score;
        }
    }

    /// Record a runner outcome. Counts come from the simulation leg when it
    /// ran, otherwise from the physical leg.
    pub fn record_outcome(&mut self, frame: u64, outcome: &FrameOutcome) {
        self.frames_executed += 1;

        if let Some(result) = outcome.simulation.as_ref().or(outcome.physical.as_ref()) {
            self.instructions_executed += result.executed.len() as u64;
            self.instructions_blocked += result.blocked.len() as u64;
            self.motor_runtime_ms = result.motor_runtime;
        }

        if let Some(comparison) = &outcome.comparison {
            self.comparisons += 1;
            if let Some(reason) = &comparison.divergence_reason {
                self.divergences.push(DivergencePoint {
                    frame,
                    reason: reason.clone(),
                });
            }
        }
    }

    /// Share of compared frames that were equivalent. 1.0 when nothing was
    /// compared.
    pub fn equivalence_rate(&self) -> f64 {
        if self.comparisons == 0 {
            1.0
        } else {
            1.0 - self.divergences.len() as f64 / self.comparisons as f64
        }
    }

    /// Share of instructions that were blocked.
    pub fn block_rate(&self) -> f64 {
        let total = self.instructions_executed + self.instructions_blocked;
        if total == 0 {
            0.0
        } else {
            self.instructions_blocked as f64 / total as f64
        }
    }

    pub fn urgency_count(&self, urgency: Urgency) -> u64 {
        self.urgency_counts.get(&urgency).copied().unwrap_or(0)
    }

    pub fn summary(&self) -> AnalyticsSummary {
        AnalyticsSummary {
            frames_executed: self.frames_executed,
            block_rate: self.block_rate(),
            equivalence_rate: self.equivalence_rate(),
            divergence_count: self.divergences.len() as u64,
            critical_frames: self.urgency_count(Urgency::Critical),
            peak_exploration: self.peak_exploration,
            motor_runtime_ms: self.motor_runtime_ms,
        }
    }
}

impl Default for RunAnalytics {
    fn default() -> Self {
        Self::new()
    }
}

/// Compact summary for logs and reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub frames_executed: u64,
    pub block_rate: f64,
    pub equivalence_rate: f64,
    pub divergence_count: u64,
    pub critical_frames: u64,
    pub peak_exploration: f64,
    pub motor_runtime_ms: u64,
}
