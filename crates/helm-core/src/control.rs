//! Sense → plan → act loop.
//!
//! Each step runs navigation on the latest observation, encodes the
//! recommended steering as a frame, executes it through the runner and
//! folds the outcome into [`RunAnalytics`].

use helm_interp::{ExecutionTarget, SimulatedTarget};
use helm_ir::{ExecutionMode, OutputFrame, Pose, SharedClock, Velocity};
use helm_nav::{NavigationResult, RayNavigator, SensorDistances};
use helm_sim2real::{FrameOutcome, RunnerError, RunnerMode, Sim2RealRunner};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analytics::RunAnalytics;
use crate::config::{ConfigError, HelmConfig};
use crate::encode::encode_navigation;

/// What the robot sees at the start of a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub distances: SensorDistances,
    pub pose: Pose,
    pub velocity: Velocity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    pub frame: OutputFrame,
    pub navigation: NavigationResult,
    pub outcome: FrameOutcome,
}

pub struct ControlLoop<S, P> {
    navigator: RayNavigator,
    runner: Sim2RealRunner<S, P>,
    analytics: RunAnalytics,
    cycle_ms: u64,
    mode: ExecutionMode,
    frame_counter: u64,
}

impl<S: ExecutionTarget, P: ExecutionTarget> ControlLoop<S, P> {
    pub fn new(navigator: RayNavigator, runner: Sim2RealRunner<S, P>, cycle_ms: u64) -> Self {
        Self {
            navigator,
            runner,
            analytics: RunAnalytics::new(),
            cycle_ms,
            mode: ExecutionMode::Exploring,
            frame_counter: 0,
        }
    }

    /// Build navigator and runner from `config`. `sim_clock` drives the
    /// traces and the simulation leg. `physical_clock` times the physical
    /// leg's motor runtime and should track real time. The navigator's
    /// memory follows the physical clock in `physical` mode, otherwise the
    /// simulated one.
    pub fn from_config(
        config: &HelmConfig,
        simulation: S,
        physical: Option<P>,
        sim_clock: SharedClock,
        physical_clock: SharedClock,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let nav_clock = match config.runner.mode {
            RunnerMode::Physical => physical_clock.clone(),
            RunnerMode::Simulation | RunnerMode::Both => sim_clock.clone(),
        };
        let navigator = RayNavigator::new(config.navigation.clone())?.with_clock(nav_clock);
        let runner = Sim2RealRunner::new(simulation, physical, config.runner.clone())
            .with_clock(sim_clock)
            .with_physical_clock(physical_clock);
        Ok(Self::new(navigator, runner, config.control.cycle_ms))
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn analytics(&self) -> &RunAnalytics {
        &self.analytics
    }

    pub fn runner(&self) -> &Sim2RealRunner<S, P> {
        &self.runner
    }

    pub fn runner_mut(&mut self) -> &mut Sim2RealRunner<S, P> {
        &mut self.runner
    }

    pub fn navigator(&self) -> &RayNavigator {
        &self.navigator
    }

    pub fn frames_sent(&self) -> u64 {
        self.frame_counter
    }

    pub async fn step(
        &mut self,
        distances: &SensorDistances,
        pose: Pose,
        velocity: Velocity,
    ) -> Result<CycleReport, RunnerError> {
        let navigation = self.navigator.compute_navigation(distances, pose, velocity);
        let frame = encode_navigation(&navigation, self.cycle_ms, self.mode)
            .with_id(format!("frame-{:04}", self.frame_counter));
        let sequence = self.frame_counter;
        self.frame_counter += 1;

        debug!(
            frame = ?frame.id,
            urgency = %navigation.prediction.urgency,
            left = navigation.recommended_steering.left_speed,
            right = navigation.recommended_steering.right_speed,
            "control cycle"
        );

        let outcome = self.runner.execute_frame(&frame).await?;
        self.analytics.record_navigation(&navigation);
        self.analytics.record_outcome(sequence, &outcome);

        Ok(CycleReport {
            frame,
            navigation,
            outcome,
        })
    }
}

impl<P: ExecutionTarget> ControlLoop<SimulatedTarget, P> {
    /// Read the simulated robot's sensors and state.
    pub fn sense(&mut self) -> Observation {
        let sim = self.runner.simulation_mut().target_mut();
        Observation {
            distances: SensorDistances::new(sim.sample_distances()),
            pose: sim.pose(),
            velocity: sim.recent_velocity(),
        }
    }

    /// Close the loop on the simulator for `cycles` steps.
    pub async fn run_simulated(
        &mut self,
        cycles: usize,
    ) -> Result<Vec<CycleReport>, RunnerError> {
        let mut reports = Vec::with_capacity(cycles);
        for _ in 0..cycles {
            let observation = self.sense();
            let report = self
                .step(
                    &observation.distances,
                    observation.pose,
                    observation.velocity,
                )
                .await?;
            reports.push(report);
        }
        Ok(reports)
    }
}
