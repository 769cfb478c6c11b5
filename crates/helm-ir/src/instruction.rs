use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::frame::ExecutionMode;
use crate::value::Primitive;

/// A single robot action as authored upstream.
///
/// Serialized as a JSON object tagged by `"type"`. Instructions are immutable
/// values: nothing downstream of the parser mutates them in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BytecodeInstruction {
    Motor(MotorInstruction),
    Led(LedInstruction),
    Sensor(SensorInstruction),
    Timing(TimingInstruction),
    StateTransition(StateTransition),
    Composite(CompositeInstruction),
}

// ── Motor ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotorInstruction {
    pub target: MotorTarget,
    pub action: MotorAction,
    pub speed: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

/// Which wheel(s) a motor instruction drives.
///
/// Unknown names survive parsing as `Unrecognized` so that validation, not
/// deserialization, is what rejects them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MotorTarget {
    LeftWheel,
    RightWheel,
    Both,
    Unrecognized(String),
}

impl MotorTarget {
    pub fn as_str(&self) -> &str {
        match self {
            MotorTarget::LeftWheel => "left_wheel",
            MotorTarget::RightWheel => "right_wheel",
            MotorTarget::Both => "both",
            MotorTarget::Unrecognized(name) => name,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, MotorTarget::Unrecognized(_))
    }
}

impl From<String> for MotorTarget {
    fn from(name: String) -> Self {
        match name.as_str() {
            "left_wheel" => MotorTarget::LeftWheel,
            "right_wheel" => MotorTarget::RightWheel,
            "both" => MotorTarget::Both,
            _ => MotorTarget::Unrecognized(name),
        }
    }
}

impl From<MotorTarget> for String {
    fn from(target: MotorTarget) -> Self {
        target.as_str().to_string()
    }
}

impl fmt::Display for MotorTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MotorAction {
    Forward,
    Backward,
    Stop,
    Unrecognized(String),
}

impl MotorAction {
    pub fn as_str(&self) -> &str {
        match self {
            MotorAction::Forward => "forward",
            MotorAction::Backward => "backward",
            MotorAction::Stop => "stop",
            MotorAction::Unrecognized(name) => name,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, MotorAction::Unrecognized(_))
    }
}

impl From<String> for MotorAction {
    fn from(name: String) -> Self {
        match name.as_str() {
            "forward" => MotorAction::Forward,
            "backward" => MotorAction::Backward,
            "stop" => MotorAction::Stop,
            _ => MotorAction::Unrecognized(name),
        }
    }
}

impl From<MotorAction> for String {
    fn from(action: MotorAction) -> Self {
        action.as_str().to_string()
    }
}

impl fmt::Display for MotorAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── LED / sensor / timing ────────────────────────────────────────────

/// RGB channels are kept wide so out-of-range values reach the validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedInstruction {
    pub r: i32,
    pub g: i32,
    pub b: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorInstruction {
    pub target: SensorTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorTarget {
    Camera,
    Distance,
    Imu,
    Battery,
    All,
}

impl SensorTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorTarget::Camera => "camera",
            SensorTarget::Distance => "distance",
            SensorTarget::Imu => "imu",
            SensorTarget::Battery => "battery",
            SensorTarget::All => "all",
        }
    }
}

impl fmt::Display for SensorTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingInstruction {
    pub duration_ms: u64,
}

// ── State transition / composite ─────────────────────────────────────

/// Session-state update. Absent fields leave the session untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StateTransition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ExecutionMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, Primitive>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeInstruction {
    pub instructions: Vec<BytecodeInstruction>,
    #[serde(default)]
    pub atomic: bool,
}

impl BytecodeInstruction {
    pub fn motor(target: MotorTarget, action: MotorAction, speed: f64) -> Self {
        BytecodeInstruction::Motor(MotorInstruction {
            target,
            action,
            speed,
            duration_ms: None,
        })
    }

    pub fn motor_for(
        target: MotorTarget,
        action: MotorAction,
        speed: f64,
        duration_ms: u64,
    ) -> Self {
        BytecodeInstruction::Motor(MotorInstruction {
            target,
            action,
            speed,
            duration_ms: Some(duration_ms),
        })
    }

    pub fn stop() -> Self {
        Self::motor(MotorTarget::Both, MotorAction::Stop, 0.0)
    }

    pub fn led(r: i32, g: i32, b: i32) -> Self {
        BytecodeInstruction::Led(LedInstruction {
            r,
            g,
            b,
            duration_ms: None,
        })
    }

    pub fn sensor(target: SensorTarget) -> Self {
        BytecodeInstruction::Sensor(SensorInstruction { target })
    }

    pub fn wait(duration_ms: u64) -> Self {
        BytecodeInstruction::Timing(TimingInstruction { duration_ms })
    }

    pub fn composite(instructions: Vec<BytecodeInstruction>, atomic: bool) -> Self {
        BytecodeInstruction::Composite(CompositeInstruction {
            instructions,
            atomic,
        })
    }

    /// The `"type"` tag this instruction serializes with.
    pub fn kind(&self) -> &'static str {
        match self {
            BytecodeInstruction::Motor(_) => "motor",
            BytecodeInstruction::Led(_) => "led",
            BytecodeInstruction::Sensor(_) => "sensor",
            BytecodeInstruction::Timing(_) => "timing",
            BytecodeInstruction::StateTransition(_) => "state_transition",
            BytecodeInstruction::Composite(_) => "composite",
        }
    }

    /// Whether this instruction (or any nested sub-instruction) drives forward.
    pub fn drives_forward(&self) -> bool {
        match self {
            BytecodeInstruction::Motor(m) => m.action == MotorAction::Forward,
            BytecodeInstruction::Composite(c) => c.instructions.iter().any(|i| i.drives_forward()),
            _ => false,
        }
    }

    /// Whether this instruction (or any nested sub-instruction) powers a motor.
    pub fn activates_motors(&self) -> bool {
        match self {
            BytecodeInstruction::Motor(m) => m.action != MotorAction::Stop,
            BytecodeInstruction::Composite(c) => {
                c.instructions.iter().any(|i| i.activates_motors())
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_motor_target_survives_parsing() {
        let inst: BytecodeInstruction = serde_json::from_str(
            r#"{"type":"motor","target":"invalid_wheel","action":"forward","speed":100}"#,
        )
        .unwrap();
        match inst {
            BytecodeInstruction::Motor(m) => {
                assert_eq!(m.target, MotorTarget::Unrecognized("invalid_wheel".into()));
                assert!(!m.target.is_recognized());
                assert_eq!(m.action, MotorAction::Forward);
            }
            other => panic!("expected motor, got {other:?}"),
        }
    }

    #[test]
    fn test_motor_target_serializes_as_plain_string() {
        let inst =
            BytecodeInstruction::motor_for(MotorTarget::Both, MotorAction::Backward, 80.0, 250);
        let json = serde_json::to_value(&inst).unwrap();
        assert_eq!(json["type"], "motor");
        assert_eq!(json["target"], "both");
        assert_eq!(json["action"], "backward");
        assert_eq!(json["duration_ms"], 250);
    }

    #[test]
    fn test_drives_forward_looks_into_composites() {
        let nested = BytecodeInstruction::composite(
            vec![
                BytecodeInstruction::led(0, 255, 0),
                BytecodeInstruction::motor(MotorTarget::LeftWheel, MotorAction::Forward, 50.0),
            ],
            true,
        );
        assert!(nested.drives_forward());
        assert!(nested.activates_motors());
        assert!(!BytecodeInstruction::stop().activates_motors());
    }
}
