//! Sim2Real equivalence runner.
//!
//! Drives one interpreter bound to a simulation target and, optionally, one
//! bound to a physical target. The two share no state. In `both` mode the
//! simulation leg always finishes before the physical leg starts, so any
//! disagreement points at a fixed place in an already-completed simulation.

use std::sync::Arc;

use helm_interp::{
    BytecodeInterpreter, ExecutionTarget, ExecutionTickResult, InterpreterError, TargetKind,
};
use helm_ir::{OutputFrame, SharedClock, SystemClock};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::compare::{compare_results, ComparisonResult};
use crate::config::{RunnerConfig, RunnerMode};
use crate::trace::{BytecodeTrace, BytecodeTraceEntry, TraceError};

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("Runner mode '{0}' needs a physical target, but none is attached")]
    PhysicalTargetMissing(RunnerMode),

    #[error("Simulation leg failed: {0}")]
    Simulation(#[source] InterpreterError),

    #[error("Physical leg failed: {0}")]
    Physical(#[source] InterpreterError),

    #[error(transparent)]
    Trace(#[from] TraceError),
}

/// Per-frame outcome. Legs that did not run are `None`; `comparison` is set
/// only in `both` mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameOutcome {
    pub simulation: Option<ExecutionTickResult>,
    pub physical: Option<ExecutionTickResult>,
    pub comparison: Option<ComparisonResult>,
}

impl FrameOutcome {
    pub fn is_divergent(&self) -> bool {
        self.comparison.as_ref().is_some_and(|c| !c.equivalent)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameDivergence {
    pub frame_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_id: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquivalenceReport {
    pub frames_run: usize,
    pub divergences: Vec<FrameDivergence>,
    /// True iff no frame diverged.
    pub certified: bool,
}

pub struct Sim2RealRunner<S, P> {
    config: RunnerConfig,
    clock: SharedClock,
    simulation: BytecodeInterpreter<S>,
    physical: Option<BytecodeInterpreter<P>>,
    trace: Option<BytecodeTrace>,
    trace_counter: u64,
}

impl<S: ExecutionTarget, P: ExecutionTarget> Sim2RealRunner<S, P> {
    pub fn new(simulation: S, physical: Option<P>, config: RunnerConfig) -> Self {
        let sim = BytecodeInterpreter::new(simulation, config.interpreter.clone());
        let phys = physical.map(|p| BytecodeInterpreter::new(p, config.interpreter.clone()));
        Self::from_interpreters(sim, phys, config)
    }

    /// Use interpreters the caller has already configured (clocks,
    /// validators).
    pub fn from_interpreters(
        simulation: BytecodeInterpreter<S>,
        physical: Option<BytecodeInterpreter<P>>,
        config: RunnerConfig,
    ) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock),
            simulation,
            physical,
            trace: None,
            trace_counter: 0,
        }
    }

    /// Clock used for trace timestamps and by the simulation interpreter.
    /// The physical interpreter keeps its own clock, wall time by default,
    /// so its runtime limit is measured in real milliseconds.
    pub fn with_clock(self, clock: SharedClock) -> Self {
        Self {
            simulation: self.simulation.with_clock(clock.clone()),
            clock,
            ..self
        }
    }

    /// Clock for the physical interpreter only.
    pub fn with_physical_clock(self, clock: SharedClock) -> Self {
        Self {
            physical: self.physical.map(|p| p.with_clock(clock)),
            ..self
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn mode(&self) -> RunnerMode {
        self.config.mode
    }

    pub fn set_mode(&mut self, mode: RunnerMode) {
        self.config.mode = mode;
    }

    pub fn simulation(&self) -> &BytecodeInterpreter<S> {
        &self.simulation
    }

    pub fn simulation_mut(&mut self) -> &mut BytecodeInterpreter<S> {
        &mut self.simulation
    }

    pub fn physical(&self) -> Option<&BytecodeInterpreter<P>> {
        self.physical.as_ref()
    }

    pub fn has_physical(&self) -> bool {
        self.physical.is_some()
    }

    pub fn is_tracing(&self) -> bool {
        self.trace.is_some()
    }

    /// Reset both interpreters' sessions.
    pub fn reset(&mut self) {
        self.simulation.reset();
        if let Some(p) = self.physical.as_mut() {
            p.reset();
        }
    }

    pub async fn execute_frame(
        &mut self,
        frame: &OutputFrame,
    ) -> Result<FrameOutcome, RunnerError> {
        let mode = self.config.mode;
        if mode != RunnerMode::Simulation && !self.has_physical() {
            return Err(RunnerError::PhysicalTargetMissing(mode));
        }

        let simulation = match mode {
            RunnerMode::Simulation | RunnerMode::Both => Some(self.run_simulation(frame).await?),
            RunnerMode::Physical => None,
        };
        let physical = match mode {
            RunnerMode::Physical | RunnerMode::Both => Some(self.run_physical(frame).await?),
            RunnerMode::Simulation => None,
        };

        let comparison = match (&simulation, &physical) {
            (Some(sim), Some(phys)) if mode == RunnerMode::Both => {
                let comparison = compare_results(sim, phys, self.config.comparison_tolerance_ms);
                if let Some(reason) = &comparison.divergence_reason {
                    warn!(frame = ?frame.id, %reason, "sim2real divergence");
                }
                Some(comparison)
            }
            _ => None,
        };

        Ok(FrameOutcome {
            simulation,
            physical,
            comparison,
        })
    }

    async fn run_simulation(
        &mut self,
        frame: &OutputFrame,
    ) -> Result<ExecutionTickResult, RunnerError> {
        let start = self.clock.now_ms();
        let result = self
            .simulation
            .execute_tick(frame)
            .await
            .map_err(RunnerError::Simulation)?;
        let kind = self.simulation.target().kind();
        self.record(frame, &result, kind, start);
        Ok(result)
    }

    async fn run_physical(
        &mut self,
        frame: &OutputFrame,
    ) -> Result<ExecutionTickResult, RunnerError> {
        let mode = self.config.mode;
        let interpreter = self
            .physical
            .as_mut()
            .ok_or(RunnerError::PhysicalTargetMissing(mode))?;
        let start = self.clock.now_ms();
        let result = interpreter
            .execute_tick(frame)
            .await
            .map_err(RunnerError::Physical)?;
        let kind = interpreter.target().kind();
        self.record(frame, &result, kind, start);
        Ok(result)
    }

    fn record(
        &mut self,
        frame: &OutputFrame,
        result: &ExecutionTickResult,
        target: TargetKind,
        start_time: u64,
    ) {
        let Some(trace) = self.trace.as_mut() else {
            return;
        };
        let end_time = self.clock.now_ms();
        trace.push(BytecodeTraceEntry {
            frame: frame.clone(),
            result: result.clone(),
            target,
            start_time,
            end_time,
            duration_ms: end_time.saturating_sub(start_time),
        });
    }

    /// Open a trace. Returns its id.
    pub fn start_trace(&mut self) -> Result<String, RunnerError> {
        if let Some(active) = &self.trace {
            return Err(TraceError::AlreadyActive(active.id().to_string()).into());
        }
        self.trace_counter += 1;
        let id = format!("trace-{:04}", self.trace_counter);
        let trace = BytecodeTrace::open(
            id.clone(),
            self.config.mode,
            self.clock.now_ms(),
            self.config.max_trace_entries,
        );
        info!(trace = %id, mode = %self.config.mode, "trace started");
        self.trace = Some(trace);
        Ok(id)
    }

    /// Close the active trace and hand it over.
    pub fn end_trace(&mut self) -> Result<BytecodeTrace, RunnerError> {
        let trace = self.trace.take().ok_or(TraceError::NotActive)?;
        let trace = trace.close(self.clock.now_ms());
        info!(
            trace = %trace.id(),
            entries = trace.len(),
            evicted = trace.evicted(),
            "trace ended"
        );
        Ok(trace)
    }

    /// Run `frames` through both legs regardless of the configured mode and
    /// report every divergent frame.
    pub async fn certify(
        &mut self,
        frames: &[OutputFrame],
    ) -> Result<EquivalenceReport, RunnerError> {
        if !self.has_physical() {
            return Err(RunnerError::PhysicalTargetMissing(RunnerMode::Both));
        }
        let previous = self.config.mode;
        self.config.mode = RunnerMode::Both;

        let mut divergences = Vec::new();
        let mut frames_run = 0;
        for (frame_index, frame) in frames.iter().enumerate() {
            let outcome = match self.execute_frame(frame).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    self.config.mode = previous;
                    return Err(err);
                }
            };
            frames_run += 1;
            if let Some(reason) = outcome.comparison.and_then(|c| c.divergence_reason) {
                divergences.push(FrameDivergence {
                    frame_index,
                    frame_id: frame.id.clone(),
                    reason,
                });
            }
        }

        self.config.mode = previous;
        let certified = divergences.is_empty();
        info!(frames_run, divergences = divergences.len(), certified, "certification finished");
        Ok(EquivalenceReport {
            frames_run,
            divergences,
            certified,
        })
    }
}
