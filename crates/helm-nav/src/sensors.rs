//! Distance readings from the eight fixed sensors, and interpolation between
//! them.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use helm_ir::{normalize_angle, SensorId};
use serde::{Deserialize, Serialize};

use crate::error::NavigationError;

/// Sensor distances in cm, indexed in [`SensorId::ALL`] order.
///
/// Negative or non-finite readings are stored as 0, i.e. "blocked".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorDistances([f64; 8]);

impl SensorDistances {
    pub fn new(values: [f64; 8]) -> Self {
        Self(values.map(|d| if d.is_finite() && d > 0.0 { d } else { 0.0 }))
    }

    pub fn uniform(distance: f64) -> Self {
        Self::new([distance; 8])
    }

    /// Build from `name -> distance` pairs. Every sensor must be present.
    pub fn from_named(readings: &BTreeMap<String, f64>) -> Result<Self, NavigationError> {
        if let Some(unknown) = readings.keys().find(|k| SensorId::from_name(k).is_none()) {
            return Err(NavigationError::UnknownSensor(unknown.clone()));
        }
        let mut values = [0.0; 8];
        for id in SensorId::ALL {
            values[id.index()] = *readings
                .get(id.name())
                .ok_or(NavigationError::MissingSensor(id.name()))?;
        }
        Ok(Self::new(values))
    }

    pub fn with(mut self, id: SensorId, distance: f64) -> Self {
        self.0[id.index()] = if distance.is_finite() && distance > 0.0 {
            distance
        } else {
            0.0
        };
        self
    }

    pub fn get(&self, id: SensorId) -> f64 {
        self.0[id.index()]
    }

    pub fn as_array(&self) -> &[f64; 8] {
        &self.0
    }

    /// Estimated distance at `angle` relative to the heading, linearly
    /// interpolated between the two angularly nearest sensors.
    pub fn at_angle(&self, angle: f64) -> f64 {
        let mut ring: Vec<(f64, f64)> = SensorId::ALL
            .iter()
            .map(|id| (id.angle(), self.get(*id)))
            .collect();
        ring.sort_by(|a, b| a.0.total_cmp(&b.0));
        // Close the ring across the ±π seam.
        let (first_angle, first_distance) = ring[0];
        ring.push((first_angle + 2.0 * PI, first_distance));

        let mut a = normalize_angle(angle);
        if a < ring[0].0 {
            a += 2.0 * PI;
        }

        for pair in ring.windows(2) {
            let (a0, d0) = pair[0];
            let (a1, d1) = pair[1];
            if a >= a0 && a <= a1 {
                let t = (a - a0) / (a1 - a0);
                return d0 + t * (d1 - d0);
            }
        }
        // Unreachable for finite angles.
        self.get(SensorId::Front)
    }

    /// Mean of the left and front-left readings.
    pub fn left_clearance(&self) -> f64 {
        (self.get(SensorId::Left) + self.get(SensorId::FrontLeft)) / 2.0
    }

    /// Mean of the right and front-right readings.
    pub fn right_clearance(&self) -> f64 {
        (self.get(SensorId::Right) + self.get(SensorId::FrontRight)) / 2.0
    }
}

impl From<[f64; 8]> for SensorDistances {
    fn from(values: [f64; 8]) -> Self {
        Self::new(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_8;

    fn ramp() -> SensorDistances {
        SensorDistances::uniform(100.0)
            .with(SensorId::Front, 40.0)
            .with(SensorId::FrontRight, 80.0)
            .with(SensorId::Back, 20.0)
            .with(SensorId::BackLeft, 60.0)
    }

    #[test]
    fn test_exact_sensor_angles() {
        let d = ramp();
        for id in SensorId::ALL {
            assert!((d.at_angle(id.angle()) - d.get(id)).abs() < 1e-9, "{id}");
        }
    }

    #[test]
    fn test_midpoint_interpolation() {
        let d = ramp();
        assert!((d.at_angle(FRAC_PI_8) - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_interpolation_across_seam() {
        let d = ramp();
        // Halfway between back (π) and back_left (-3π/4).
        let angle = -PI + FRAC_PI_8;
        assert!((d.at_angle(angle) - 40.0).abs() < 1e-9);
        assert!((d.at_angle(PI + FRAC_PI_8) - 40.0).abs() < 1e-9);
        assert!((d.at_angle(-PI) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_bad_readings_become_blocked() {
        let d = SensorDistances::new([f64::NAN, -3.0, 10.0, 10.0, 10.0, 10.0, 10.0, f64::INFINITY]);
        assert_eq!(d.get(SensorId::Front), 0.0);
        assert_eq!(d.get(SensorId::FrontLeft), 0.0);
        assert_eq!(d.get(SensorId::BackRight), 0.0);
    }

    #[test]
    fn test_from_named_requires_every_sensor() {
        let mut named: BTreeMap<String, f64> = SensorId::ALL
            .iter()
            .map(|id| (id.name().to_string(), 50.0))
            .collect();
        assert!(SensorDistances::from_named(&named).is_ok());

        named.remove("back");
        assert_eq!(
            SensorDistances::from_named(&named),
            Err(NavigationError::MissingSensor("back"))
        );

        named.insert("top".into(), 1.0);
        assert!(matches!(
            SensorDistances::from_named(&named),
            Err(NavigationError::UnknownSensor(_))
        ));
    }
}
