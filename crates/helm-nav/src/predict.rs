//! Forward simulation of the current motion to estimate time to collision.

use std::f64::consts::PI;
use std::fmt;

use helm_ir::{normalize_angle, Pose, SensorId, Velocity};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::NavigationConfig;
use crate::sensors::SensorDistances;

/// Below this linear speed (cm/s) the robot is treated as stationary.
const STATIONARY_SPEED: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::None => "none",
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
            Urgency::Critical => "critical",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedAction {
    Continue,
    TurnLeft,
    TurnRight,
    Stop,
    Reverse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPrediction {
    pub collision_predicted: bool,
    /// Seconds until the predicted collision.
    pub time_to_collision: Option<f64>,
    pub collision_point: Option<Pose>,
    /// Direction of travel at the collision, relative to the starting heading.
    pub collision_angle: Option<f64>,
    pub recommended_action: RecommendedAction,
    pub urgency: Urgency,
}

impl TrajectoryPrediction {
    fn clear() -> Self {
        Self {
            collision_predicted: false,
            time_to_collision: None,
            collision_point: None,
            collision_angle: None,
            recommended_action: RecommendedAction::Continue,
            urgency: Urgency::None,
        }
    }
}

/// Speed relative to nominal, bounded to `[0.5, 2.0]`. Faster motion widens
/// every urgency band.
pub fn speed_factor(linear_speed: f64, config: &NavigationConfig) -> f64 {
    (linear_speed.abs() / config.nominal_speed_cm_s).clamp(0.5, 2.0)
}

pub fn classify_urgency(time_to_collision: f64, speed_factor: f64) -> Urgency {
    if time_to_collision < 0.5 * speed_factor {
        Urgency::Critical
    } else if time_to_collision < 1.0 * speed_factor {
        Urgency::High
    } else if time_to_collision < 1.5 * speed_factor {
        Urgency::Medium
    } else {
        Urgency::Low
    }
}

/// Turn toward the side with materially more room. When neither side is
/// clear, back out if the rear is open, otherwise stop.
pub fn recommend_action(
    distances: &SensorDistances,
    velocity: &Velocity,
    config: &NavigationConfig,
) -> RecommendedAction {
    let left = distances.left_clearance();
    let right = distances.right_clearance();

    if left.max(right) <= config.clearance_threshold {
        return if distances.get(SensorId::Back) > config.clearance_threshold {
            RecommendedAction::Reverse
        } else {
            RecommendedAction::Stop
        };
    }
    if (left - right).abs() > config.side_preference_margin {
        return if left > right {
            RecommendedAction::TurnLeft
        } else {
            RecommendedAction::TurnRight
        };
    }
    if velocity.angular > 0.0 {
        RecommendedAction::TurnRight
    } else if velocity.angular < 0.0 {
        RecommendedAction::TurnLeft
    } else if left >= right {
        RecommendedAction::TurnLeft
    } else {
        RecommendedAction::TurnRight
    }
}

pub fn predict_trajectory(
    distances: &SensorDistances,
    pose: &Pose,
    velocity: &Velocity,
    config: &NavigationConfig,
) -> TrajectoryPrediction {
    if velocity.linear.abs() < STATIONARY_SPEED {
        return TrajectoryPrediction::clear();
    }

    let dt = config.prediction_step;
    let steps = (config.prediction_horizon / dt).round() as usize;
    // Reversing travels along the rear sensors.
    let travel_offset = if velocity.linear < 0.0 { PI } else { 0.0 };

    let mut current = *pose;
    for step in 1..=steps {
        current.x += velocity.linear * current.rotation.sin() * dt;
        current.y += velocity.linear * current.rotation.cos() * dt;
        current.rotation += velocity.angular * dt;

        let traveled = pose.distance_to(&current);
        let direction = normalize_angle(current.rotation - pose.rotation + travel_offset);
        let sensed = distances.at_angle(direction);

        if traveled + config.safety_margin >= sensed {
            let time = step as f64 * dt;
            let urgency = classify_urgency(time, speed_factor(velocity.linear, config));
            trace!(time, traveled, sensed, %urgency, "collision predicted");
            return TrajectoryPrediction {
                collision_predicted: true,
                time_to_collision: Some(time),
                collision_point: Some(Pose {
                    rotation: normalize_angle(current.rotation),
                    ..current
                }),
                collision_angle: Some(direction),
                recommended_action: recommend_action(distances, velocity, config),
                urgency,
            };
        }
    }

    TrajectoryPrediction::clear()
}
