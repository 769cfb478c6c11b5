use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};
use std::fmt;

use serde::{Deserialize, Serialize};

/// The eight fixed distance sensors around the chassis.
///
/// Angles are relative to the robot heading in radians, positive clockwise
/// (to the right), matching the drive convention `x += v·sin(θ)`,
/// `y += v·cos(θ)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorId {
    Front,
    FrontLeft,
    FrontRight,
    Left,
    Right,
    Back,
    BackLeft,
    BackRight,
}

impl SensorId {
    /// Hardware order (index into the robot's distance register block).
    pub const ALL: [SensorId; 8] = [
        SensorId::Front,
        SensorId::FrontLeft,
        SensorId::FrontRight,
        SensorId::Left,
        SensorId::Right,
        SensorId::Back,
        SensorId::BackLeft,
        SensorId::BackRight,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            SensorId::Front => "front",
            SensorId::FrontLeft => "front_left",
            SensorId::FrontRight => "front_right",
            SensorId::Left => "left",
            SensorId::Right => "right",
            SensorId::Back => "back",
            SensorId::BackLeft => "back_left",
            SensorId::BackRight => "back_right",
        }
    }

    pub fn angle(self) -> f64 {
        match self {
            SensorId::Front => 0.0,
            SensorId::FrontRight => FRAC_PI_4,
            SensorId::Right => FRAC_PI_2,
            SensorId::BackRight => 3.0 * FRAC_PI_4,
            SensorId::Back => PI,
            SensorId::BackLeft => -3.0 * FRAC_PI_4,
            SensorId::Left => -FRAC_PI_2,
            SensorId::FrontLeft => -FRAC_PI_4,
        }
    }

    pub fn from_name(name: &str) -> Option<SensorId> {
        SensorId::ALL.into_iter().find(|s| s.name() == name)
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Wrap an angle into `(-π, π]`.
pub fn normalize_angle(angle: f64) -> f64 {
    let mut a = angle % (2.0 * PI);
    if a <= -PI {
        a += 2.0 * PI;
    } else if a > PI {
        a -= 2.0 * PI;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hardware_order_matches_index() {
        for (i, s) in SensorId::ALL.iter().enumerate() {
            assert_eq!(s.index(), i);
        }
    }

    #[test]
    fn test_name_roundtrip() {
        for s in SensorId::ALL {
            assert_eq!(SensorId::from_name(s.name()), Some(s));
        }
        assert_eq!(SensorId::from_name("top"), None);
    }

    #[test]
    fn test_normalize_angle_range() {
        assert!((normalize_angle(3.0 * PI) - PI).abs() < 1e-9);
        assert!((normalize_angle(-PI) - PI).abs() < 1e-9);
        assert!((normalize_angle(-FRAC_PI_2) + FRAC_PI_2).abs() < 1e-9);
        assert!((normalize_angle(2.0 * PI)).abs() < 1e-9);
    }
}
