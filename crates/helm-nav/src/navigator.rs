use std::sync::Arc;

use helm_ir::{Pose, SharedClock, SystemClock, Velocity};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::NavigationConfig;
use crate::error::NavigationError;
use crate::memory::ExplorationMemory;
use crate::predict::{predict_trajectory, TrajectoryPrediction};
use crate::ray::{build_ray_fan, RayFan};
use crate::sensors::SensorDistances;
use crate::steering::{compute_steering, SteeringCommand};
use crate::ultrasound::{synthesize_ultrasound, UltrasoundReading};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationResult {
    pub ray_fan: RayFan,
    pub prediction: TrajectoryPrediction,
    pub ultrasound: UltrasoundReading,
    pub recommended_steering: SteeringCommand,
    /// Fraction of heading buckets visited within the memory window.
    pub exploration_score: f64,
}

/// Ray-based navigator.
///
/// Everything except the exploration memory is recomputed from the
/// arguments on each call.
#[derive(Debug)]
pub struct RayNavigator {
    config: NavigationConfig,
    clock: SharedClock,
    memory: ExplorationMemory,
}

impl RayNavigator {
    pub fn new(config: NavigationConfig) -> Result<Self, NavigationError> {
        config.validate()?;
        Ok(Self {
            memory: ExplorationMemory::new(config.memory_window_ms, config.memory_capacity),
            clock: Arc::new(SystemClock),
            config,
        })
    }

    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &NavigationConfig {
        &self.config
    }

    pub fn memory(&self) -> &ExplorationMemory {
        &self.memory
    }

    pub fn reset_memory(&mut self) {
        self.memory.clear();
    }

    pub fn compute_navigation(
        &mut self,
        distances: &SensorDistances,
        pose: Pose,
        velocity: Velocity,
    ) -> NavigationResult {
        let now = self.clock.now_ms();
        self.memory.forget(now);

        let ray_fan = build_ray_fan(distances, &pose, &self.memory, &self.config, now);
        let prediction = predict_trajectory(distances, &pose, &velocity, &self.config);
        let ultrasound = synthesize_ultrasound(distances, self.config.max_ray_distance, now);
        let recommended_steering = compute_steering(&ray_fan, &prediction, &self.config);

        self.memory.record(pose.rotation, now);
        let exploration_score = self.memory.exploration_score();

        trace!(
            clear_rays = ray_fan.clear_count(),
            urgency = %prediction.urgency,
            left = recommended_steering.left_speed,
            right = recommended_steering.right_speed,
            exploration_score,
            "navigation computed"
        );

        NavigationResult {
            ray_fan,
            prediction,
            ultrasound,
            recommended_steering,
            exploration_score,
        }
    }
}
