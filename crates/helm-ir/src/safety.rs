//! Hardware safety policy shared by the validator and the interpreter.
use serde::{Deserialize, Serialize};

/// Numeric safety limits.
///
/// Owned by the caller and passed by value; nothing in the core mutates it.
/// Defaults mirror the robot firmware's safety layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConstraints {
    /// Speeds above this are clamped (PWM units, default: 200).
    pub max_motor_speed: f64,
    /// Forward motion is refused when an obstacle is predicted this close.
    pub emergency_stop_distance_cm: f64,
    /// Longest single timed motor command accepted (default: 30 s).
    pub max_continuous_motor_ms: u64,
    /// Refuse motor activation when the predicted battery voltage is low.
    pub enforce_voltage_limits: bool,
    /// Battery cutoff used when `enforce_voltage_limits` is set.
    pub min_battery_voltage: f64,
    /// Longest single `timing` wait accepted.
    pub max_wait_ms: u64,
}

impl Default for SafetyConstraints {
    fn default() -> Self {
        Self {
            max_motor_speed: 200.0,
            emergency_stop_distance_cm: 8.0,
            max_continuous_motor_ms: 30_000,
            enforce_voltage_limits: true,
            min_battery_voltage: 3.0,
            max_wait_ms: 10_000,
        }
    }
}
