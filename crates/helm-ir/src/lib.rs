pub mod clock;
pub mod frame;
pub mod instruction;
pub mod parse;
pub mod pose;
pub mod safety;
pub mod sensors;
pub mod value;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use frame::{ExecutionMode, OutputFrame, StatePredictions};
pub use instruction::{
    BytecodeInstruction, CompositeInstruction, LedInstruction, MotorAction, MotorInstruction,
    MotorTarget, SensorInstruction, SensorTarget, StateTransition, TimingInstruction,
};
pub use parse::{parse_frame, parse_instruction, ParseError};
pub use pose::{Pose, Velocity};
pub use safety::SafetyConstraints;
pub use sensors::{normalize_angle, SensorId};
pub use value::Primitive;
