pub mod config;
pub mod error;
pub mod governor;
pub mod interpreter;
pub mod recording;
pub mod session;
pub mod sim;
pub mod target;
pub mod world;

pub use config::InterpreterConfig;
pub use error::{InstructionError, InterpreterError};
pub use governor::{GovernorError, MotorGovernor};
pub use interpreter::{BytecodeInterpreter, ExecutionTickResult};
pub use recording::{RecordingTarget, TargetCall, TargetOp};
pub use session::{SessionState, StateChanges};
pub use sim::{SimConfig, SimulatedTarget};
pub use target::{ExecutionTarget, SensorReadings, TargetError, TargetKind};
pub use world::{Arena, Obstacle};
