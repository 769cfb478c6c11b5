use std::collections::BTreeMap;

use helm_ir::{ExecutionMode, Primitive, StateTransition};
use serde::{Deserialize, Serialize};

use crate::target::SensorReadings;

/// Session state carried across ticks. Cleared only by an explicit reset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub mode: ExecutionMode,
    pub goal: Option<String>,
    pub variables: BTreeMap<String, Primitive>,
}

impl SessionState {
    /// Merge a transition. Absent fields leave the current value alone.
    pub fn apply(&mut self, transition: &StateTransition) {
        if let Some(mode) = transition.mode {
            self.mode = mode;
        }
        if let Some(goal) = &transition.goal {
            self.goal = Some(goal.clone());
        }
        for (key, value) in &transition.variables {
            self.variables.insert(key.clone(), value.clone());
        }
    }
}

/// What a single tick changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<ExecutionMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    pub variables: BTreeMap<String, Primitive>,
    pub sensor_readings: SensorReadings,
}

impl StateChanges {
    pub fn record_transition(&mut self, transition: &StateTransition) {
        if let Some(mode) = transition.mode {
            self.mode = Some(mode);
        }
        if let Some(goal) = &transition.goal {
            self.goal = Some(goal.clone());
        }
        self.variables.extend(
            transition
                .variables
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
    }

    pub fn record_readings(&mut self, readings: SensorReadings) {
        self.sensor_readings.extend(readings);
    }

    pub fn is_empty(&self) -> bool {
        self.mode.is_none()
            && self.goal.is_none()
            && self.variables.is_empty()
            && self.sensor_readings.is_empty()
    }
}
