//! Steering command → bytecode.

use helm_ir::{
    BytecodeInstruction, ExecutionMode, MotorAction, MotorTarget, OutputFrame, StatePredictions,
};
use helm_nav::{NavigationResult, SteeringCommand, Urgency};

fn wheel_action(speed: f64) -> (MotorAction, f64) {
    let magnitude = speed.abs().round();
    if magnitude == 0.0 {
        (MotorAction::Stop, 0.0)
    } else if speed > 0.0 {
        (MotorAction::Forward, magnitude)
    } else {
        (MotorAction::Backward, magnitude)
    }
}

/// Encode one control cycle.
///
/// A moving command becomes an atomic composite: drive (both wheels at once
/// when they match, otherwise each wheel), wait out the cycle, stop. A stop
/// command is a single `both` stop.
pub fn encode_steering(
    command: &SteeringCommand,
    cycle_ms: u64,
    mode: ExecutionMode,
) -> OutputFrame {
    let left = wheel_action(command.left_speed);
    let right = wheel_action(command.right_speed);

    if left.0 == MotorAction::Stop && right.0 == MotorAction::Stop {
        return OutputFrame::new(vec![BytecodeInstruction::stop()]).with_mode(mode);
    }

    let mut steps = if left == right {
        vec![BytecodeInstruction::motor(MotorTarget::Both, left.0, left.1)]
    } else {
        vec![
            BytecodeInstruction::motor(MotorTarget::LeftWheel, left.0, left.1),
            BytecodeInstruction::motor(MotorTarget::RightWheel, right.0, right.1),
        ]
    };
    steps.push(BytecodeInstruction::wait(cycle_ms));
    steps.push(BytecodeInstruction::stop());

    OutputFrame::new(vec![BytecodeInstruction::composite(steps, true)]).with_mode(mode)
}

/// Encode a navigation result, carrying its obstacle estimate along as the
/// frame's prediction. Critical urgency switches the frame to emergency mode.
pub fn encode_navigation(
    result: &NavigationResult,
    cycle_ms: u64,
    mode: ExecutionMode,
) -> OutputFrame {
    let mode = if result.prediction.urgency == Urgency::Critical {
        ExecutionMode::Emergency
    } else {
        mode
    };
    let mut frame = encode_steering(&result.recommended_steering, cycle_ms, mode)
        .with_predictions(StatePredictions {
            obstacle_distance_cm: Some(result.ultrasound.distance),
            expected_pose: result.prediction.collision_point,
            ..Default::default()
        });
    frame.confidence = result.ultrasound.confidence.clamp(0.0, 1.0);
    frame
}
