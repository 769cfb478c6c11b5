use helm_interp::SimConfig;
use helm_nav::{NavigationConfig, NavigationError};
use helm_sim2real::RunnerConfig;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Navigation(#[from] NavigationError),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Everything needed to stand up a control loop. Every section falls back
/// to its defaults when omitted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HelmConfig {
    pub navigation: NavigationConfig,
    /// Runner mode, tolerances and the interpreter/safety settings both legs
    /// share.
    pub runner: RunnerConfig,
    pub simulation: SimConfig,
    pub control: ControlConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Length of one sense → plan → act cycle.
    pub cycle_ms: u64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self { cycle_ms: 100 }
    }
}

impl HelmConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: HelmConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.navigation.validate()?;

        let safety = &self.runner.interpreter.safety;
        if self.control.cycle_ms == 0 {
            return Err(ConfigError::Invalid("control.cycle_ms must be positive".into()));
        }
        if self.control.cycle_ms > safety.max_wait_ms {
            return Err(ConfigError::Invalid(format!(
                "control.cycle_ms {} exceeds safety max_wait_ms {}",
                self.control.cycle_ms, safety.max_wait_ms
            )));
        }
        if self.runner.max_trace_entries == 0 {
            return Err(ConfigError::Invalid(
                "runner.max_trace_entries must be positive".into(),
            ));
        }
        if self.navigation.max_speed > safety.max_motor_speed {
            warn!(
                nav_max = self.navigation.max_speed,
                safety_max = safety.max_motor_speed,
                "navigation max_speed above safety limit; commands will be clamped"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helm_sim2real::RunnerMode;

    #[test]
    fn test_empty_object_is_default() {
        let config = HelmConfig::from_json_str("{}").unwrap();
        assert_eq!(config, HelmConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = HelmConfig::from_json_str(
            r#"{
                "navigation": { "ray_count": 21 },
                "runner": { "mode": "both", "interpreter": { "dry_run": true } },
                "control": { "cycle_ms": 50 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.navigation.ray_count, 21);
        assert_eq!(config.navigation.clearance_threshold, 30.0);
        assert_eq!(config.runner.mode, RunnerMode::Both);
        assert!(config.runner.interpreter.dry_run);
        assert_eq!(config.runner.interpreter.safety.max_motor_speed, 200.0);
        assert_eq!(config.control.cycle_ms, 50);
    }

    #[test]
    fn test_bad_navigation_section() {
        let err = HelmConfig::from_json_str(r#"{"navigation": {"ray_count": 0}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Navigation(_)));
    }

    #[test]
    fn test_cycle_longer_than_wait_limit() {
        let err = HelmConfig::from_json_str(r#"{"control": {"cycle_ms": 20000}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_malformed_json() {
        let err = HelmConfig::from_json_str("{").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
