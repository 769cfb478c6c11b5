//! The hardware seam.
//!
//! The interpreter never talks to motors or sensors directly; it issues
//! commands through an [`ExecutionTarget`]. A physical robot link, the
//! kinematic simulator and the recording double all implement it.

use std::collections::BTreeMap;

use async_trait::async_trait;
use helm_ir::{MotorAction, MotorTarget, SensorTarget};
use serde::{Deserialize, Serialize};

/// Sensor readings keyed by category (`"distance"`, `"imu"`, ...).
pub type SensorReadings = BTreeMap<String, serde_json::Value>;

/// Which side of a sim2real pair a target stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Simulation,
    Physical,
}

/// Failure reported by a target for a single command.
///
/// Every variant except [`TargetError::Broken`] is local to the instruction
/// that issued the command. `Broken` means the target itself is gone and
/// aborts the whole tick.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TargetError {
    #[error("Target I/O failure: {0}")]
    Io(String),

    #[error("Target rejected command: {0}")]
    Rejected(String),

    #[error("Target timed out after {0}ms")]
    Timeout(u64),

    #[error("Target broken: {0}")]
    Broken(String),
}

impl TargetError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, TargetError::Broken(_))
    }
}

#[async_trait]
pub trait ExecutionTarget: Send {
    /// Drive one or both wheels. `duration_ms` of `None` means "until told
    /// otherwise".
    async fn set_motors(
        &mut self,
        target: MotorTarget,
        action: MotorAction,
        speed: f64,
        duration_ms: Option<u64>,
    ) -> Result<(), TargetError>;

    async fn stop_motors(&mut self) -> Result<(), TargetError>;

    async fn set_led(
        &mut self,
        r: u8,
        g: u8,
        b: u8,
        duration_ms: Option<u64>,
    ) -> Result<(), TargetError>;

    async fn read_sensors(&mut self, target: SensorTarget) -> Result<SensorReadings, TargetError>;

    async fn wait(&mut self, duration_ms: u64) -> Result<(), TargetError>;

    fn kind(&self) -> TargetKind {
        TargetKind::Physical
    }
}

#[async_trait]
impl<T: ExecutionTarget + ?Sized> ExecutionTarget for Box<T> {
    async fn set_motors(
        &mut self,
        target: MotorTarget,
        action: MotorAction,
        speed: f64,
        duration_ms: Option<u64>,
    ) -> Result<(), TargetError> {
        (**self).set_motors(target, action, speed, duration_ms).await
    }

    async fn stop_motors(&mut self) -> Result<(), TargetError> {
        (**self).stop_motors().await
    }

    async fn set_led(
        &mut self,
        r: u8,
        g: u8,
        b: u8,
        duration_ms: Option<u64>,
    ) -> Result<(), TargetError> {
        (**self).set_led(r, g, b, duration_ms).await
    }

    async fn read_sensors(&mut self, target: SensorTarget) -> Result<SensorReadings, TargetError> {
        (**self).read_sensors(target).await
    }

    async fn wait(&mut self, duration_ms: u64) -> Result<(), TargetError> {
        (**self).wait(duration_ms).await
    }

    fn kind(&self) -> TargetKind {
        (**self).kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_broken_is_fatal() {
        assert!(TargetError::Broken("link down".into()).is_fatal());
        assert!(!TargetError::Io("crc".into()).is_fatal());
        assert!(!TargetError::Rejected("busy".into()).is_fatal());
        assert!(!TargetError::Timeout(50).is_fatal());
    }

    #[test]
    fn test_target_kind_serde() {
        let json = serde_json::to_string(&TargetKind::Simulation).unwrap();
        assert_eq!(json, "\"simulation\"");
    }
}
