//! Flat rectangular arena with circular obstacles.
//!
//! Coordinates are centimetres with the origin at the lower-left corner.
//! Headings follow [`helm_ir::Pose`].

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Arena {
    pub width_cm: f64,
    pub height_cm: f64,
    pub obstacles: Vec<Obstacle>,
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            width_cm: 300.0,
            height_cm: 300.0,
            obstacles: Vec::new(),
        }
    }
}

impl Arena {
    pub fn with_obstacle(mut self, x: f64, y: f64, radius: f64) -> Self {
        self.obstacles.push(Obstacle { x, y, radius });
        self
    }

    /// Distance from `(x, y)` along `heading` to the first wall or obstacle,
    /// capped at `max_range`.
    pub fn cast_ray(&self, x: f64, y: f64, heading: f64, max_range: f64) -> f64 {
        let (dx, dy) = (heading.sin(), heading.cos());
        let mut nearest = max_range;

        let walls = [
            (dx > 0.0).then(|| (self.width_cm - x) / dx),
            (dx < 0.0).then(|| -x / dx),
            (dy > 0.0).then(|| (self.height_cm - y) / dy),
            (dy < 0.0).then(|| -y / dy),
        ];
        for t in walls.into_iter().flatten() {
            if t >= 0.0 {
                nearest = nearest.min(t);
            }
        }

        for obstacle in &self.obstacles {
            let (fx, fy) = (x - obstacle.x, y - obstacle.y);
            let b = fx * dx + fy * dy;
            let c = fx * fx + fy * fy - obstacle.radius * obstacle.radius;
            let disc = b * b - c;
            if disc < 0.0 {
                continue;
            }
            let root = disc.sqrt();
            let t = if -b - root >= 0.0 { -b - root } else { -b + root };
            if t >= 0.0 {
                nearest = nearest.min(t);
            }
        }

        nearest.max(0.0)
    }

    /// True if a disc of `radius` at `(x, y)` overlaps nothing.
    pub fn is_free(&self, x: f64, y: f64, radius: f64) -> bool {
        if x < radius || y < radius || x > self.width_cm - radius || y > self.height_cm - radius {
            return false;
        }
        self.obstacles.iter().all(|o| {
            let (dx, dy) = (x - o.x, y - o.y);
            (dx * dx + dy * dy).sqrt() >= o.radius + radius
        })
    }
}
