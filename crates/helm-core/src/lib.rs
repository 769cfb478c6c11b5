//! Control-loop glue: steering encoding, the sense → plan → act loop,
//! run analytics and the aggregate configuration.

pub mod analytics;
pub mod config;
pub mod control;
pub mod encode;

pub use analytics::{AnalyticsSummary, DivergencePoint, RunAnalytics};
pub use config::{ConfigError, ControlConfig, HelmConfig};
pub use control::{ControlLoop, CycleReport, Observation};
pub use encode::{encode_navigation, encode_steering};
