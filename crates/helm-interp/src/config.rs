use helm_ir::SafetyConstraints;
use serde::{Deserialize, Serialize};

/// Interpreter configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    /// Limits handed to the frame validator on every tick.
    pub safety: SafetyConstraints,
    /// Cumulative motor-on budget for the session (default: 60 s).
    pub max_motor_runtime_ms: u64,
    /// Validate and account, but never call the target.
    pub dry_run: bool,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            safety: SafetyConstraints::default(),
            max_motor_runtime_ms: 60_000,
            dry_run: false,
        }
    }
}

impl InterpreterConfig {
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            ..Default::default()
        }
    }

    pub fn with_max_motor_runtime(mut self, max_ms: u64) -> Self {
        self.max_motor_runtime_ms = max_ms;
        self
    }
}
