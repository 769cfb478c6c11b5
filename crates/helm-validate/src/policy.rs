//! Frame-level hardware policy.
//!
//! The firmware safety layer refuses forward motion when an obstacle is inside
//! the emergency-stop distance and refuses any motor activation when the
//! battery is below cutoff. The same rules apply here to the frame's own
//! predictions, before anything reaches the robot.

use helm_ir::{BytecodeInstruction, OutputFrame, SafetyConstraints};

use crate::validate::InstructionFault;

/// Policy inputs extracted once per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FramePolicy {
    /// Set when the predicted obstacle is within the emergency distance.
    pub emergency: Option<(f64, f64)>,
    /// Set when voltage limits are enforced and the prediction is below cutoff.
    pub low_battery: Option<(f64, f64)>,
}

impl FramePolicy {
    pub fn from_frame(frame: &OutputFrame, constraints: &SafetyConstraints) -> Self {
        let predictions = &frame.state_predictions;

        let emergency = predictions
            .obstacle_distance_cm
            .filter(|d| *d <= constraints.emergency_stop_distance_cm)
            .map(|d| (d, constraints.emergency_stop_distance_cm));

        let low_battery = if constraints.enforce_voltage_limits {
            predictions
                .battery_voltage
                .filter(|v| *v < constraints.min_battery_voltage)
                .map(|v| (v, constraints.min_battery_voltage))
        } else {
            None
        };

        Self {
            emergency,
            low_battery,
        }
    }
}

pub fn check_frame_policy(
    instruction: &BytecodeInstruction,
    policy: &FramePolicy,
) -> Result<(), InstructionFault> {
    if let Some((voltage, min_voltage)) = policy.low_battery {
        if instruction.activates_motors() {
            return Err(InstructionFault::LowBattery {
                voltage,
                min_voltage,
            });
        }
    }
    if let Some((distance_cm, limit_cm)) = policy.emergency {
        if instruction.drives_forward() {
            return Err(InstructionFault::EmergencyStop {
                distance_cm,
                limit_cm,
            });
        }
    }
    Ok(())
}
