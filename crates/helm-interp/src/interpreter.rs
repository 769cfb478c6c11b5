//! Bytecode interpreter.
//!
//! One tick = validate the frame, then run the surviving instructions in
//! array order against the execution target. Instruction failures are
//! recorded and the tick keeps going; only a broken validator or a broken
//! target ends it early.

use std::sync::Arc;

use helm_ir::{
    BytecodeInstruction, CompositeInstruction, ExecutionMode, LedInstruction, MotorAction,
    MotorInstruction, MotorTarget, OutputFrame, SharedClock, SystemClock,
};
use helm_validate::{FrameValidator, SafetyValidator};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::InterpreterConfig;
use crate::error::{InstructionError, InterpreterError};
use crate::governor::MotorGovernor;
use crate::session::{SessionState, StateChanges};
use crate::target::ExecutionTarget;

/// Outcome of one tick.
///
/// `executed` and `blocked` are disjoint, ascending, and together cover
/// every index of the submitted frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionTickResult {
    pub executed: Vec<usize>,
    pub blocked: Vec<usize>,
    pub errors: Vec<String>,
    pub state_changes: StateChanges,
    pub motor_runtime: u64,
    pub timestamp: u64,
}

impl ExecutionTickResult {
    pub fn instruction_count(&self) -> usize {
        self.executed.len() + self.blocked.len()
    }
}

pub struct BytecodeInterpreter<T> {
    target: T,
    config: InterpreterConfig,
    validator: Arc<dyn FrameValidator>,
    clock: SharedClock,
    governor: MotorGovernor,
    session: SessionState,
}

impl<T: ExecutionTarget> BytecodeInterpreter<T> {
    pub fn new(target: T, config: InterpreterConfig) -> Self {
        Self {
            target,
            config,
            validator: Arc::new(SafetyValidator),
            clock: Arc::new(SystemClock),
            governor: MotorGovernor::default(),
            session: SessionState::default(),
        }
    }

    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_validator(mut self, validator: Arc<dyn FrameValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn current_mode(&self) -> ExecutionMode {
        self.session.mode
    }

    pub fn motor_runtime(&self) -> u64 {
        self.governor.cumulative_ms()
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    pub fn into_target(self) -> T {
        self.target
    }

    /// Back to a fresh session: no motor runtime, no open timer, idle, no
    /// goal, no variables.
    pub fn reset(&mut self) {
        self.governor.reset();
        self.session = SessionState::default();
        info!("interpreter session reset");
    }

    pub async fn execute_tick(
        &mut self,
        frame: &OutputFrame,
    ) -> Result<ExecutionTickResult, InterpreterError> {
        let outcome = self
            .validator
            .validate_output_frame(frame, &self.config.safety)?;

        let mut blocked = outcome.blocked_instructions.clone();
        let mut errors = outcome.reasons.clone();
        let mut executed = Vec::with_capacity(outcome.validated_indices.len());
        let mut changes = StateChanges::default();

        for (instruction, &index) in outcome
            .validated_frame
            .instructions
            .iter()
            .zip(&outcome.validated_indices)
        {
            debug!(index, kind = instruction.kind(), "dispatching instruction");
            match self.execute_instruction(instruction, &mut changes).await {
                Ok(()) => executed.push(index),
                Err(err) => {
                    if let Some(fatal) = err.fatal() {
                        warn!(index, reason = %fatal, "execution target broken; aborting tick");
                        return Err(InterpreterError::TargetBroken {
                            index,
                            error: fatal.clone(),
                        });
                    }
                    warn!(index, reason = %err, "instruction failed");
                    blocked.push(index);
                    errors.push(format!("Instruction {index}: {err}"));
                }
            }
        }

        blocked.sort_unstable();

        Ok(ExecutionTickResult {
            executed,
            blocked,
            errors,
            state_changes: changes,
            motor_runtime: self.governor.cumulative_ms(),
            timestamp: self.clock.now_ms(),
        })
    }

    async fn execute_instruction(
        &mut self,
        instruction: &BytecodeInstruction,
        changes: &mut StateChanges,
    ) -> Result<(), InstructionError> {
        match instruction {
            BytecodeInstruction::Motor(m) => self.execute_motor(m).await,
            BytecodeInstruction::Led(led) => self.execute_led(led).await,
            BytecodeInstruction::Sensor(s) => {
                if !self.config.dry_run {
                    let readings = self.target.read_sensors(s.target).await?;
                    changes.record_readings(readings);
                }
                Ok(())
            }
            BytecodeInstruction::Timing(t) => {
                if !self.config.dry_run {
                    self.target.wait(t.duration_ms).await?;
                }
                Ok(())
            }
            BytecodeInstruction::StateTransition(transition) => {
                self.session.apply(transition);
                changes.record_transition(transition);
                Ok(())
            }
            BytecodeInstruction::Composite(c) => self.execute_composite(c, changes).await,
        }
    }

    async fn execute_motor(&mut self, m: &MotorInstruction) -> Result<(), InstructionError> {
        if m.action == MotorAction::Stop {
            if !self.config.dry_run {
                if m.target == MotorTarget::Both {
                    self.target.stop_motors().await?;
                } else {
                    self.target
                        .set_motors(m.target.clone(), MotorAction::Stop, 0.0, None)
                        .await?;
                }
            }
            let folded = self.governor.finalize(self.clock.now_ms());
            debug!(runtime_ms = self.governor.cumulative_ms(), folded, "motor stop");
            return Ok(());
        }

        self.governor
            .check(m.duration_ms, self.config.max_motor_runtime_ms)?;

        // Stamp before the call: a timed command may advance simulated time.
        let issued_at = self.clock.now_ms();
        if !self.config.dry_run {
            self.target
                .set_motors(m.target.clone(), m.action.clone(), m.speed, m.duration_ms)
                .await?;
        }
        self.governor.commit(m.duration_ms, issued_at);
        debug!(
            runtime_ms = self.governor.cumulative_ms(),
            timer_open = self.governor.timer_open(),
            "motor activation accepted"
        );
        Ok(())
    }

    async fn execute_led(&mut self, led: &LedInstruction) -> Result<(), InstructionError> {
        let channel = |v: i32| u8::try_from(v).map_err(|_| InstructionError::LedOperand(v));
        let (r, g, b) = (channel(led.r)?, channel(led.g)?, channel(led.b)?);
        if !self.config.dry_run {
            self.target.set_led(r, g, b, led.duration_ms).await?;
        }
        Ok(())
    }

    /// Atomic composites stop at the first failure. Sub-instructions that
    /// already ran keep their effects. Non-atomic composites run everything
    /// and report every failure together.
    async fn execute_composite(
        &mut self,
        composite: &CompositeInstruction,
        changes: &mut StateChanges,
    ) -> Result<(), InstructionError> {
        let mut failures = Vec::new();

        for (index, sub) in composite.instructions.iter().enumerate() {
            let result = Box::pin(self.execute_instruction(sub, changes)).await;
            let Err(err) = result else { continue };

            if err.fatal().is_some() {
                return Err(err);
            }
            if composite.atomic {
                return Err(InstructionError::AtomicAborted {
                    index,
                    error: Box::new(err),
                });
            }
            failures.push(format!("Sub-instruction {index}: {err}"));
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(InstructionError::CompositeFailed {
                total: composite.instructions.len(),
                failures,
            })
        }
    }
}
