use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::NavigationError;

/// Path scoring weights. Each term is normalized to `[0, 1]` before weighting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub clearance: f64,
    pub width: f64,
    pub forward_bias: f64,
    pub exploration: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            clearance: 0.4,
            width: 0.25,
            forward_bias: 0.2,
            exploration: 0.15,
        }
    }
}

/// Navigation tuning. Distances in cm, angles in radians, speeds in PWM
/// units unless noted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    pub ray_count: usize,
    /// Total fan width centered on the heading (default: π, i.e. ±90°).
    pub ray_spread_angle: f64,
    /// A ray is clear when its distance exceeds this.
    pub clearance_threshold: f64,
    /// Ray distances are capped here and clearance is normalized by it.
    pub max_ray_distance: f64,
    /// How far ahead trajectory prediction looks, in seconds.
    pub prediction_horizon: f64,
    /// Integration step for prediction, in seconds.
    pub prediction_step: f64,
    /// Added to distance traveled when testing for collision.
    pub safety_margin: f64,
    pub min_speed: f64,
    pub max_speed: f64,
    /// Linear speed (cm/s) at which urgency thresholds are unscaled.
    pub nominal_speed_cm_s: f64,
    /// Wheel PWM used by critical-urgency maneuvers.
    pub emergency_speed: f64,
    /// Left/right clearance difference that counts as "materially more room".
    pub side_preference_margin: f64,
    /// Visited headings older than this are forgotten.
    pub memory_window_ms: u64,
    pub memory_capacity: usize,
    pub weights: ScoreWeights,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            ray_count: 15,
            ray_spread_angle: PI,
            clearance_threshold: 30.0,
            max_ray_distance: 200.0,
            prediction_horizon: 3.0,
            prediction_step: 0.1,
            safety_margin: 10.0,
            min_speed: 40.0,
            max_speed: 150.0,
            nominal_speed_cm_s: 20.0,
            emergency_speed: 80.0,
            side_preference_margin: 10.0,
            memory_window_ms: 60_000,
            memory_capacity: 512,
            weights: ScoreWeights::default(),
        }
    }
}

impl NavigationConfig {
    /// Reject configurations the navigator cannot work with.
    pub fn validate(&self) -> Result<(), NavigationError> {
        let invalid = |msg: &str| Err(NavigationError::InvalidConfig(msg.to_string()));

        if self.ray_count == 0 {
            return invalid("ray_count must be at least 1");
        }
        if !(self.ray_spread_angle > 0.0 && self.ray_spread_angle <= 2.0 * PI) {
            return invalid("ray_spread_angle must be in (0, 2π]");
        }
        if !(self.max_ray_distance > 0.0) {
            return invalid("max_ray_distance must be positive");
        }
        if !(self.prediction_step > 0.0) || self.prediction_horizon < 0.0 {
            return invalid("prediction_step must be positive and prediction_horizon non-negative");
        }
        if self.min_speed < 0.0 || self.max_speed < self.min_speed {
            return invalid("speed range must satisfy 0 <= min_speed <= max_speed");
        }
        if !(self.nominal_speed_cm_s > 0.0) {
            return invalid("nominal_speed_cm_s must be positive");
        }
        Ok(())
    }

    /// Angle between adjacent rays.
    pub fn ray_step(&self) -> f64 {
        if self.ray_count > 1 {
            self.ray_spread_angle / (self.ray_count - 1) as f64
        } else {
            self.ray_spread_angle
        }
    }
}
