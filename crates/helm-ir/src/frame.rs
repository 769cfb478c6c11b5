use std::fmt;

use serde::{Deserialize, Serialize};

use crate::instruction::BytecodeInstruction;
use crate::pose::Pose;

/// Operating mode of the robot session.
///
/// There is no enforced transition table; any instruction may move the
/// session to any mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    #[default]
    Idle,
    Exploring,
    Navigating,
    Executing,
    Paused,
    Emergency,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExecutionMode::Idle => "idle",
            ExecutionMode::Exploring => "exploring",
            ExecutionMode::Navigating => "navigating",
            ExecutionMode::Executing => "executing",
            ExecutionMode::Paused => "paused",
            ExecutionMode::Emergency => "emergency",
        };
        f.write_str(name)
    }
}

/// What the decision process expects the world to look like after this frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatePredictions {
    /// Expected distance to the nearest obstacle ahead, in cm.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obstacle_distance_cm: Option<f64>,
    /// Expected battery voltage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_voltage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_pose: Option<Pose>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// One decision cycle's payload.
///
/// Instruction indices are stable: every index in a tick result refers to a
/// position in `instructions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub instructions: Vec<BytecodeInstruction>,
    #[serde(default)]
    pub state_predictions: StatePredictions,
    #[serde(default)]
    pub mode: ExecutionMode,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

fn default_confidence() -> f64 {
    1.0
}

impl OutputFrame {
    pub fn new(instructions: Vec<BytecodeInstruction>) -> Self {
        Self {
            id: None,
            instructions,
            state_predictions: StatePredictions::default(),
            mode: ExecutionMode::default(),
            confidence: default_confidence(),
        }
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_predictions(mut self, predictions: StatePredictions) -> Self {
        self.state_predictions = predictions;
        self
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}
