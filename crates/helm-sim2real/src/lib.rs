pub mod compare;
pub mod config;
pub mod runner;
pub mod trace;

pub use compare::{compare_results, ComparisonResult, Divergence};
pub use config::{RunnerConfig, RunnerMode};
pub use runner::{EquivalenceReport, FrameDivergence, FrameOutcome, RunnerError, Sim2RealRunner};
pub use trace::{BytecodeTrace, BytecodeTraceEntry, TraceError};
