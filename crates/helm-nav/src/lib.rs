//! Ray-based reactive navigation for a two-wheeled robot with eight fixed
//! distance sensors.

pub mod config;
pub mod error;
pub mod memory;
pub mod navigator;
pub mod predict;
pub mod ray;
pub mod sensors;
pub mod steering;
pub mod ultrasound;

pub use config::{NavigationConfig, ScoreWeights};
pub use error::NavigationError;
pub use memory::ExplorationMemory;
pub use navigator::{NavigationResult, RayNavigator};
pub use predict::{RecommendedAction, TrajectoryPrediction, Urgency};
pub use ray::{Ray, RayFan, RayPath};
pub use sensors::SensorDistances;
pub use steering::SteeringCommand;
pub use ultrasound::UltrasoundReading;
