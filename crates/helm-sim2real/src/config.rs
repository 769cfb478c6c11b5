use std::fmt;

use helm_interp::InterpreterConfig;
use serde::{Deserialize, Serialize};

/// Which target(s) a frame runs through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunnerMode {
    #[default]
    Simulation,
    Physical,
    Both,
}

impl fmt::Display for RunnerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunnerMode::Simulation => write!(f, "simulation"),
            RunnerMode::Physical => write!(f, "physical"),
            RunnerMode::Both => write!(f, "both"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub mode: RunnerMode,
    /// Largest motor-runtime difference (ms) still treated as equivalent.
    pub comparison_tolerance_ms: u64,
    /// Oldest trace entries are evicted past this count.
    pub max_trace_entries: usize,
    /// Shared by both interpreters.
    pub interpreter: InterpreterConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            mode: RunnerMode::default(),
            comparison_tolerance_ms: 100,
            max_trace_entries: 1000,
            interpreter: InterpreterConfig::default(),
        }
    }
}

impl RunnerConfig {
    pub fn with_mode(mut self, mode: RunnerMode) -> Self {
        self.mode = mode;
        self
    }
}
