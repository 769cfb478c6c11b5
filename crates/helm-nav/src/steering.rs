//! Differential-drive command synthesis.

use serde::{Deserialize, Serialize};

use crate::config::NavigationConfig;
use crate::predict::{RecommendedAction, TrajectoryPrediction, Urgency};
use crate::ray::RayFan;

/// Signed wheel speeds in PWM units. Positive drives forward.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SteeringCommand {
    pub left_speed: f64,
    pub right_speed: f64,
}

impl SteeringCommand {
    pub fn new(left_speed: f64, right_speed: f64) -> Self {
        Self {
            left_speed,
            right_speed,
        }
    }

    pub fn stop() -> Self {
        Self::default()
    }

    pub fn is_stop(&self) -> bool {
        self.left_speed == 0.0 && self.right_speed == 0.0
    }

    pub fn scaled(self, factor: f64) -> Self {
        Self::new(self.left_speed * factor, self.right_speed * factor)
    }
}

/// Fixed maneuver for critical urgency.
pub fn emergency_maneuver(action: RecommendedAction, speed: f64) -> SteeringCommand {
    match action {
        RecommendedAction::TurnLeft => SteeringCommand::new(-speed, speed),
        RecommendedAction::TurnRight => SteeringCommand::new(speed, -speed),
        RecommendedAction::Stop => SteeringCommand::stop(),
        RecommendedAction::Reverse | RecommendedAction::Continue => {
            SteeringCommand::new(-speed, -speed)
        }
    }
}

pub fn compute_steering(
    fan: &RayFan,
    prediction: &TrajectoryPrediction,
    config: &NavigationConfig,
) -> SteeringCommand {
    if prediction.urgency == Urgency::Critical {
        return emergency_maneuver(prediction.recommended_action, config.emergency_speed);
    }

    let best = &fan.best_path;
    let base = if best.emergency {
        config.min_speed
    } else {
        let ratio = (best.min_clearance / config.max_ray_distance).clamp(0.0, 1.0);
        config.min_speed + (config.max_speed - config.min_speed) * ratio
    };

    let half_spread = config.ray_spread_angle / 2.0;
    let offset = (best.center_angle / half_spread).clamp(-1.0, 1.0);
    let turn = base * offset;

    let command = SteeringCommand::new(
        (base + turn).clamp(-config.max_speed, config.max_speed),
        (base - turn).clamp(-config.max_speed, config.max_speed),
    );

    match prediction.urgency {
        Urgency::High => command.scaled(0.5),
        Urgency::Medium => command.scaled(0.75),
        _ => command,
    }
}
