//! Sim-vs-physical equivalence check.

use std::fmt;

use helm_interp::ExecutionTickResult;
use serde::{Deserialize, Serialize};

/// First point at which two tick results disagree, in check order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum Divergence {
    Executed { simulation: Vec<usize>, physical: Vec<usize> },
    Blocked { simulation: Vec<usize>, physical: Vec<usize> },
    ErrorCount { simulation: usize, physical: usize },
    Mode { simulation: Option<String>, physical: Option<String> },
    Goal { simulation: Option<String>, physical: Option<String> },
    MotorRuntime { simulation: u64, physical: u64, tolerance: u64 },
}

impl fmt::Display for Divergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Divergence::Executed {
                simulation,
                physical,
            } => write!(
                f,
                "Executed instructions differ: simulation {simulation:?}, physical {physical:?}"
            ),
            Divergence::Blocked {
                simulation,
                physical,
            } => write!(
                f,
                "Blocked instructions differ: simulation {simulation:?}, physical {physical:?}"
            ),
            Divergence::ErrorCount {
                simulation,
                physical,
            } => write!(
                f,
                "Error count differs: simulation {simulation}, physical {physical}"
            ),
            Divergence::Mode {
                simulation,
                physical,
            } => write!(
                f,
                "Mode change differs: simulation {simulation:?}, physical {physical:?}"
            ),
            Divergence::Goal {
                simulation,
                physical,
            } => write!(
                f,
                "Goal change differs: simulation {simulation:?}, physical {physical:?}"
            ),
            Divergence::MotorRuntime {
                simulation,
                physical,
                tolerance,
            } => write!(
                f,
                "Motor runtime differs beyond {tolerance}ms tolerance: simulation {simulation}ms, physical {physical}ms"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub equivalent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub divergence_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub divergence: Option<Divergence>,
}

impl ComparisonResult {
    pub fn equivalent() -> Self {
        Self {
            equivalent: true,
            divergence_reason: None,
            divergence: None,
        }
    }

    pub fn diverged(divergence: Divergence) -> Self {
        Self {
            equivalent: false,
            divergence_reason: Some(divergence.to_string()),
            divergence: Some(divergence),
        }
    }
}

/// Compare two tick results, stopping at the first disagreement.
pub fn compare_results(
    simulation: &ExecutionTickResult,
    physical: &ExecutionTickResult,
    tolerance_ms: u64,
) -> ComparisonResult {
    match find_divergence(simulation, physical, tolerance_ms) {
        None => ComparisonResult::equivalent(),
        Some(divergence) => ComparisonResult::diverged(divergence),
    }
}

fn find_divergence(
    sim: &ExecutionTickResult,
    phys: &ExecutionTickResult,
    tolerance: u64,
) -> Option<Divergence> {
    if sim.executed != phys.executed {
        return Some(Divergence::Executed {
            simulation: sim.executed.clone(),
            physical: phys.executed.clone(),
        });
    }
    if sim.blocked != phys.blocked {
        return Some(Divergence::Blocked {
            simulation: sim.blocked.clone(),
            physical: phys.blocked.clone(),
        });
    }
    if sim.errors.len() != phys.errors.len() {
        return Some(Divergence::ErrorCount {
            simulation: sim.errors.len(),
            physical: phys.errors.len(),
        });
    }
    if sim.state_changes.mode != phys.state_changes.mode {
        return Some(Divergence::Mode {
            simulation: sim.state_changes.mode.map(|m| m.to_string()),
            physical: phys.state_changes.mode.map(|m| m.to_string()),
        });
    }
    if sim.state_changes.goal != phys.state_changes.goal {
        return Some(Divergence::Goal {
            simulation: sim.state_changes.goal.clone(),
            physical: phys.state_changes.goal.clone(),
        });
    }
    if sim.motor_runtime.abs_diff(phys.motor_runtime) > tolerance {
        return Some(Divergence::MotorRuntime {
            simulation: sim.motor_runtime,
            physical: phys.motor_runtime,
            tolerance,
        });
    }
    None
}
