use helm_ir::{
    BytecodeInstruction, CompositeInstruction, LedInstruction, MotorInstruction, OutputFrame,
    SafetyConstraints,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::policy::{check_frame_policy, FramePolicy};

/// Why a single instruction was refused.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InstructionFault {
    #[error("Invalid motor target '{target}'")]
    InvalidMotorTarget { target: String },

    #[error("Invalid motor action '{action}'")]
    InvalidMotorAction { action: String },

    #[error("Invalid motor speed {speed}: must be finite and non-negative")]
    InvalidSpeed { speed: f64 },

    #[error("Motor duration {duration_ms}ms exceeds continuous limit of {max_ms}ms")]
    DurationTooLong { duration_ms: u64, max_ms: u64 },

    #[error("LED channel '{channel}' value {value} outside 0-255")]
    LedOutOfRange { channel: char, value: i32 },

    #[error("Wait of {duration_ms}ms exceeds limit of {max_ms}ms")]
    WaitTooLong { duration_ms: u64, max_ms: u64 },

    #[error("Composite instruction has no sub-instructions")]
    EmptyComposite,

    #[error("Composite sub-instruction {index}: {fault}")]
    InvalidSubInstruction {
        index: usize,
        fault: Box<InstructionFault>,
    },

    #[error("Emergency stop: obstacle predicted at {distance_cm}cm (limit {limit_cm}cm)")]
    EmergencyStop { distance_cm: f64, limit_cm: f64 },

    #[error("Battery voltage {voltage}V below minimum {min_voltage}V")]
    LowBattery { voltage: f64, min_voltage: f64 },
}

/// The validator itself could not do its job.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidatorError {
    #[error("Invalid safety constraints: {0}")]
    InvalidConstraints(String),
}

/// Result of validating a whole frame.
///
/// `validated_frame` holds the surviving (possibly clamped) instructions in
/// their original order; `validated_indices[k]` is the original index of
/// `validated_frame.instructions[k]`. Blocked and validated indices are
/// disjoint and together cover the frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub validated_frame: OutputFrame,
    pub validated_indices: Vec<usize>,
    pub blocked_instructions: Vec<usize>,
    pub reasons: Vec<String>,
}

impl ValidationOutcome {
    pub fn is_clean(&self) -> bool {
        self.blocked_instructions.is_empty()
    }
}

/// Pre-execution gate between a decision process and the interpreter.
pub trait FrameValidator: Send + Sync {
    /// Clamp or remove unsafe instructions from `frame`.
    fn validate_output_frame(
        &self,
        frame: &OutputFrame,
        constraints: &SafetyConstraints,
    ) -> Result<ValidationOutcome, ValidatorError>;

    /// Structural check of one instruction, independent of any constraints.
    fn validate_instruction(
        &self,
        instruction: &BytecodeInstruction,
    ) -> Result<(), InstructionFault>;
}

/// Default validator: structural checks, constraint checks, speed clamping and
/// the frame-level hardware policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct SafetyValidator;

impl FrameValidator for SafetyValidator {
    fn validate_output_frame(
        &self,
        frame: &OutputFrame,
        constraints: &SafetyConstraints,
    ) -> Result<ValidationOutcome, ValidatorError> {
        check_constraints(constraints)?;
        let policy = FramePolicy::from_frame(frame, constraints);

        let mut validated = Vec::with_capacity(frame.instructions.len());
        let mut validated_indices = Vec::new();
        let mut blocked_instructions = Vec::new();
        let mut reasons = Vec::new();

        for (index, instruction) in frame.instructions.iter().enumerate() {
            let verdict = self
                .validate_instruction(instruction)
                .and_then(|()| check_against_constraints(instruction, constraints))
                .and_then(|()| check_frame_policy(instruction, &policy));

            match verdict {
                Ok(()) => {
                    validated.push(clamp_instruction(instruction, constraints));
                    validated_indices.push(index);
                }
                Err(fault) => {
                    debug!(index, %fault, "instruction rejected by validator");
                    blocked_instructions.push(index);
                    reasons.push(format!("Instruction {index}: {fault}"));
                }
            }
        }

        let mut validated_frame = frame.clone();
        validated_frame.instructions = validated;

        Ok(ValidationOutcome {
            validated_frame,
            validated_indices,
            blocked_instructions,
            reasons,
        })
    }

    fn validate_instruction(
        &self,
        instruction: &BytecodeInstruction,
    ) -> Result<(), InstructionFault> {
        match instruction {
            BytecodeInstruction::Motor(m) => check_motor_shape(m),
            BytecodeInstruction::Led(led) => check_led(led),
            BytecodeInstruction::Sensor(_)
            | BytecodeInstruction::Timing(_)
            | BytecodeInstruction::StateTransition(_) => Ok(()),
            BytecodeInstruction::Composite(c) => {
                check_composite(c, |sub| self.validate_instruction(sub))
            }
        }
    }
}

fn check_constraints(constraints: &SafetyConstraints) -> Result<(), ValidatorError> {
    if !constraints.max_motor_speed.is_finite() || constraints.max_motor_speed < 0.0 {
        return Err(ValidatorError::InvalidConstraints(format!(
            "max_motor_speed must be finite and non-negative, got {}",
            constraints.max_motor_speed
        )));
    }
    if !constraints.emergency_stop_distance_cm.is_finite() {
        return Err(ValidatorError::InvalidConstraints(
            "emergency_stop_distance_cm must be finite".to_string(),
        ));
    }
    Ok(())
}

fn check_motor_shape(m: &MotorInstruction) -> Result<(), InstructionFault> {
    if !m.target.is_recognized() {
        return Err(InstructionFault::InvalidMotorTarget {
            target: m.target.to_string(),
        });
    }
    if !m.action.is_recognized() {
        return Err(InstructionFault::InvalidMotorAction {
            action: m.action.to_string(),
        });
    }
    if !m.speed.is_finite() || m.speed < 0.0 {
        return Err(InstructionFault::InvalidSpeed { speed: m.speed });
    }
    Ok(())
}

fn check_led(led: &LedInstruction) -> Result<(), InstructionFault> {
    for (channel, value) in [('r', led.r), ('g', led.g), ('b', led.b)] {
        if !(0..=255).contains(&value) {
            return Err(InstructionFault::LedOutOfRange { channel, value });
        }
    }
    Ok(())
}

/// A composite is rejected if it is empty or if any sub-instruction is.
fn check_composite<F>(
    composite: &CompositeInstruction,
    mut check: F,
) -> Result<(), InstructionFault>
where
    F: FnMut(&BytecodeInstruction) -> Result<(), InstructionFault>,
{
    if composite.instructions.is_empty() {
        return Err(InstructionFault::EmptyComposite);
    }
    for (index, sub) in composite.instructions.iter().enumerate() {
        check(sub).map_err(|fault| InstructionFault::InvalidSubInstruction {
            index,
            fault: Box::new(fault),
        })?;
    }
    Ok(())
}

fn check_against_constraints(
    instruction: &BytecodeInstruction,
    constraints: &SafetyConstraints,
) -> Result<(), InstructionFault> {
    match instruction {
        BytecodeInstruction::Motor(m) => match m.duration_ms {
            Some(duration_ms) if duration_ms > constraints.max_continuous_motor_ms => {
                Err(InstructionFault::DurationTooLong {
                    duration_ms,
                    max_ms: constraints.max_continuous_motor_ms,
                })
            }
            _ => Ok(()),
        },
        BytecodeInstruction::Timing(t) if t.duration_ms > constraints.max_wait_ms => {
            Err(InstructionFault::WaitTooLong {
                duration_ms: t.duration_ms,
                max_ms: constraints.max_wait_ms,
            })
        }
        BytecodeInstruction::Composite(c) => {
            check_composite(c, |sub| check_against_constraints(sub, constraints))
        }
        _ => Ok(()),
    }
}

/// Clamp motor speeds to `max_motor_speed`, recursing into composites.
pub fn clamp_instruction(
    instruction: &BytecodeInstruction,
    constraints: &SafetyConstraints,
) -> BytecodeInstruction {
    match instruction {
        BytecodeInstruction::Motor(m) if m.speed > constraints.max_motor_speed => {
            debug!(
                requested = m.speed,
                max = constraints.max_motor_speed,
                "clamping motor speed"
            );
            BytecodeInstruction::Motor(MotorInstruction {
                speed: constraints.max_motor_speed,
                ..m.clone()
            })
        }
        BytecodeInstruction::Composite(c) => BytecodeInstruction::Composite(CompositeInstruction {
            instructions: c
                .instructions
                .iter()
                .map(|sub| clamp_instruction(sub, constraints))
                .collect(),
            atomic: c.atomic,
        }),
        other => other.clone(),
    }
}
