//! Synthetic wide-beam ultrasound reading built from the three forward
//! distance sensors.

use helm_ir::SensorId;
use serde::{Deserialize, Serialize};

use crate::sensors::SensorDistances;

const FRONT_WEIGHT: f64 = 0.6;
const SIDE_WEIGHT: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UltrasoundReading {
    pub distance: f64,
    /// `[0, 1]`; high for close, consistent echoes.
    pub confidence: f64,
    /// `[0, 1]`; falls off with the square of relative range.
    pub echo_strength: f64,
    pub timestamp: u64,
}

pub fn synthesize_ultrasound(
    distances: &SensorDistances,
    max_range: f64,
    now_ms: u64,
) -> UltrasoundReading {
    let beams = [
        distances.get(SensorId::Front),
        distances.get(SensorId::FrontLeft),
        distances.get(SensorId::FrontRight),
    ];
    let distance = FRONT_WEIGHT * beams[0] + SIDE_WEIGHT * beams[1] + SIDE_WEIGHT * beams[2];

    let mean = beams.iter().sum::<f64>() / 3.0;
    let variance = beams.iter().map(|b| (b - mean).powi(2)).sum::<f64>() / 3.0;
    let spread = variance.sqrt();

    let relative = if max_range > 0.0 {
        (distance / max_range).clamp(0.0, 1.0)
    } else {
        1.0
    };
    let range_confidence = 1.0 - 0.5 * relative;
    let agreement = 1.0 / (1.0 + spread / 10.0);

    UltrasoundReading {
        distance,
        confidence: (range_confidence * agreement).clamp(0.0, 1.0),
        echo_strength: (1.0 - relative).powi(2),
        timestamp: now_ms,
    }
}
