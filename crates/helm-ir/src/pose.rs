use serde::{Deserialize, Serialize};

/// Planar pose in centimetres and radians.
///
/// Heading 0 points along +y and grows clockwise, so forward motion is
/// `x += v·sin(θ)`, `y += v·cos(θ)`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
}

impl Pose {
    pub fn new(x: f64, y: f64, rotation: f64) -> Self {
        Self { x, y, rotation }
    }

    pub fn distance_to(&self, other: &Pose) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Body velocity: `linear` in cm/s (negative when reversing), `angular` in
/// rad/s (positive turns right).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Velocity {
    pub linear: f64,
    pub angular: f64,
}

impl Velocity {
    pub fn new(linear: f64, angular: f64) -> Self {
        Self { linear, angular }
    }
}
