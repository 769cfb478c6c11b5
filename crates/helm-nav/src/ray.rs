//! Ray fan construction and path scoring.

use std::f64::consts::PI;

use helm_ir::{normalize_angle, Pose};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::NavigationConfig;
use crate::memory::ExplorationMemory;
use crate::sensors::SensorDistances;

/// Score multiplier for the fallback path synthesized when nothing is clear.
pub const EMERGENCY_SCORE_FACTOR: f64 = 0.5;

pub const MAX_ALTERNATIVES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    /// Relative to the heading, positive to the right.
    pub angle: f64,
    pub distance: f64,
    pub clear: bool,
    /// `pose.rotation + angle`, wrapped.
    pub world_angle: f64,
}

/// A contiguous run of clear rays (or the emergency fallback).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RayPath {
    pub first_ray: usize,
    pub last_ray: usize,
    /// Relative center angle of the run.
    pub center_angle: f64,
    pub world_angle: f64,
    /// Angular width covered by the run.
    pub width: f64,
    pub min_clearance: f64,
    pub score: f64,
    pub emergency: bool,
}

impl RayPath {
    pub fn ray_count(&self) -> usize {
        self.last_ray - self.first_ray + 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RayFan {
    pub rays: Vec<Ray>,
    pub best_path: RayPath,
    /// Next-best paths, best first, at most [`MAX_ALTERNATIVES`].
    pub alternatives: Vec<RayPath>,
    pub timestamp: u64,
}

impl RayFan {
    pub fn clear_count(&self) -> usize {
        self.rays.iter().filter(|r| r.clear).count()
    }

    pub fn is_blocked(&self) -> bool {
        self.best_path.emergency
    }
}

pub fn cast_rays(
    distances: &SensorDistances,
    pose: &Pose,
    config: &NavigationConfig,
) -> Vec<Ray> {
    let count = config.ray_count.max(1);
    let step = config.ray_step();
    (0..count)
        .map(|i| {
            let angle = if count == 1 {
                0.0
            } else {
                -config.ray_spread_angle / 2.0 + i as f64 * step
            };
            let distance = distances.at_angle(angle).min(config.max_ray_distance);
            Ray {
                angle,
                distance,
                clear: distance > config.clearance_threshold,
                world_angle: normalize_angle(pose.rotation + angle),
            }
        })
        .collect()
}

/// Weighted score of a candidate heading. Every term lies in `[0, 1]`.
pub fn score_path(
    min_clearance: f64,
    width: f64,
    center_angle: f64,
    novelty: f64,
    config: &NavigationConfig,
) -> f64 {
    let w = &config.weights;
    let clearance = (min_clearance / config.max_ray_distance).clamp(0.0, 1.0);
    let width = (width / config.ray_spread_angle).clamp(0.0, 1.0);
    let forward = 1.0 - (center_angle.abs() / PI).min(1.0);
    w.clearance * clearance + w.width * width + w.forward_bias * forward + w.exploration * novelty
}

fn path_from_run(
    rays: &[Ray],
    first: usize,
    last: usize,
    pose: &Pose,
    memory: &ExplorationMemory,
    config: &NavigationConfig,
) -> RayPath {
    let run = &rays[first..=last];
    let center_angle = (run[0].angle + run[run.len() - 1].angle) / 2.0;
    let world_angle = normalize_angle(pose.rotation + center_angle);
    let width = run.len() as f64 * config.ray_step();
    let min_clearance = run
        .iter()
        .map(|r| r.distance)
        .fold(f64::INFINITY, f64::min);
    let score = score_path(
        min_clearance,
        width,
        center_angle,
        memory.novelty(world_angle),
        config,
    );
    RayPath {
        first_ray: first,
        last_ray: last,
        center_angle,
        world_angle,
        width,
        min_clearance,
        score,
        emergency: false,
    }
}

/// Split the fan into maximal runs of clear rays.
pub fn find_paths(
    rays: &[Ray],
    pose: &Pose,
    memory: &ExplorationMemory,
    config: &NavigationConfig,
) -> Vec<RayPath> {
    let mut paths = Vec::new();
    let mut start = None;
    for (i, ray) in rays.iter().enumerate() {
        match (ray.clear, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                paths.push(path_from_run(rays, s, i - 1, pose, memory, config));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        paths.push(path_from_run(rays, s, rays.len() - 1, pose, memory, config));
    }
    paths
}

/// Single-ray fallback toward the longest raw distance.
pub fn emergency_path(
    rays: &[Ray],
    pose: &Pose,
    memory: &ExplorationMemory,
    config: &NavigationConfig,
) -> RayPath {
    let (index, _) = rays
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(bi, bd), (i, r)| {
            if r.distance > bd {
                (i, r.distance)
            } else {
                (bi, bd)
            }
        });
    let mut path = path_from_run(rays, index, index, pose, memory, config);
    path.score *= EMERGENCY_SCORE_FACTOR;
    path.emergency = true;
    path
}

pub fn build_ray_fan(
    distances: &SensorDistances,
    pose: &Pose,
    memory: &ExplorationMemory,
    config: &NavigationConfig,
    now_ms: u64,
) -> RayFan {
    let rays = cast_rays(distances, pose, config);
    let mut paths = find_paths(&rays, pose, memory, config);

    if paths.is_empty() {
        let path = emergency_path(&rays, pose, memory, config);
        trace!(
            center = path.center_angle,
            distance = path.min_clearance,
            "no clear ray; using emergency path"
        );
        return RayFan {
            rays,
            best_path: path,
            alternatives: Vec::new(),
            timestamp: now_ms,
        };
    }

    paths.sort_by(|a, b| b.score.total_cmp(&a.score));
    let best_path = paths.remove(0);
    paths.truncate(MAX_ALTERNATIVES);
    trace!(
        center = best_path.center_angle,
        score = best_path.score,
        alternatives = paths.len(),
        "ray fan scored"
    );

    RayFan {
        rays,
        best_path,
        alternatives: paths,
        timestamp: now_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helm_ir::SensorId;

    fn fan(distances: SensorDistances) -> RayFan {
        let config = NavigationConfig::default();
        let memory = ExplorationMemory::new(60_000, 64);
        build_ray_fan(&distances, &Pose::default(), &memory, &config, 0)
    }

    #[test]
    fn test_fan_spans_spread_symmetrically() {
        let rays = fan(SensorDistances::uniform(100.0)).rays;
        assert_eq!(rays.len(), 15);
        assert!((rays[0].angle + PI / 2.0).abs() < 1e-12);
        assert!((rays[14].angle - PI / 2.0).abs() < 1e-12);
        assert!(rays[7].angle.abs() < 1e-12);
    }

    #[test]
    fn test_open_field_is_one_forward_path() {
        let f = fan(SensorDistances::uniform(150.0));
        assert_eq!(f.best_path.ray_count(), 15);
        assert!(f.best_path.center_angle.abs() < 1e-12);
        assert!(f.alternatives.is_empty());
        assert!(!f.is_blocked());
    }

    #[test]
    fn test_blocked_front_splits_paths() {
        let d = SensorDistances::uniform(150.0)
            .with(SensorId::Front, 5.0)
            .with(SensorId::FrontLeft, 5.0)
            .with(SensorId::FrontRight, 5.0);
        let f = fan(d);
        assert_eq!(f.alternatives.len(), 1);
        assert!(f.best_path.center_angle.abs() > 1.0);
        for path in std::iter::once(&f.best_path).chain(&f.alternatives) {
            assert!(f.rays[path.first_ray..=path.last_ray].iter().all(|r| r.clear));
        }
    }

    #[test]
    fn test_alternatives_capped_and_ordered() {
        // Alternate clear/blocked sensors to carve many short runs.
        let config = NavigationConfig {
            ray_count: 31,
            ray_spread_angle: 2.0 * PI * 0.9,
            ..Default::default()
        };
        let d = SensorDistances::new([150.0, 5.0, 5.0, 150.0, 150.0, 150.0, 5.0, 5.0]);
        let memory = ExplorationMemory::new(60_000, 64);
        let f = build_ray_fan(&d, &Pose::default(), &memory, &config, 0);
        assert!(f.alternatives.len() <= MAX_ALTERNATIVES);
        for alt in &f.alternatives {
            assert!(alt.score <= f.best_path.score);
        }
    }

    #[test]
    fn test_world_angle_follows_pose() {
        let config = NavigationConfig::default();
        let memory = ExplorationMemory::new(60_000, 64);
        let pose = Pose::new(0.0, 0.0, 1.0);
        let f = build_ray_fan(&SensorDistances::uniform(100.0), &pose, &memory, &config, 7);
        assert!((f.rays[7].world_angle - 1.0).abs() < 1e-12);
        assert_eq!(f.timestamp, 7);
    }

    #[test]
    fn test_visited_heading_scores_lower() {
        let config = NavigationConfig::default();
        let mut memory = ExplorationMemory::new(60_000, 64);
        let fresh = build_ray_fan(
            &SensorDistances::uniform(100.0),
            &Pose::default(),
            &memory,
            &config,
            0,
        );
        memory.record(0.0, 0);
        let visited = build_ray_fan(
            &SensorDistances::uniform(100.0),
            &Pose::default(),
            &memory,
            &config,
            0,
        );
        assert!(visited.best_path.score < fresh.best_path.score);
    }
}
