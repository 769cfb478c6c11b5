//! Recording execution target.
//!
//! Logs every call it receives and can be told to fail chosen operations.
//! Clones share the log and the failure rules, so a test can keep a handle
//! after moving the target into an interpreter.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use helm_ir::{MotorAction, MotorTarget, SensorTarget};
use serde_json::json;

use crate::target::{ExecutionTarget, SensorReadings, TargetError, TargetKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetOp {
    SetMotors,
    StopMotors,
    SetLed,
    ReadSensors,
    Wait,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TargetCall {
    SetMotors {
        target: MotorTarget,
        action: MotorAction,
        speed: f64,
        duration_ms: Option<u64>,
    },
    StopMotors,
    SetLed {
        r: u8,
        g: u8,
        b: u8,
        duration_ms: Option<u64>,
    },
    ReadSensors(SensorTarget),
    Wait(u64),
}

impl TargetCall {
    pub fn op(&self) -> TargetOp {
        match self {
            TargetCall::SetMotors { .. } => TargetOp::SetMotors,
            TargetCall::StopMotors => TargetOp::StopMotors,
            TargetCall::SetLed { .. } => TargetOp::SetLed,
            TargetCall::ReadSensors(_) => TargetOp::ReadSensors,
            TargetCall::Wait(_) => TargetOp::Wait,
        }
    }
}

#[derive(Debug, Clone)]
struct FailureRule {
    op: TargetOp,
    error: TargetError,
    /// `None` fails forever.
    remaining: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct RecordingTarget {
    kind: TargetKind,
    calls: Arc<Mutex<Vec<TargetCall>>>,
    failures: Arc<Mutex<Vec<FailureRule>>>,
    readings: SensorReadings,
}

impl Default for RecordingTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingTarget {
    pub fn new() -> Self {
        let mut readings = SensorReadings::new();
        readings.insert("battery".into(), json!({ "voltage": 4.1 }));
        Self {
            kind: TargetKind::Physical,
            calls: Arc::new(Mutex::new(Vec::new())),
            failures: Arc::new(Mutex::new(Vec::new())),
            readings,
        }
    }

    pub fn with_kind(mut self, kind: TargetKind) -> Self {
        self.kind = kind;
        self
    }

    /// Canned readings returned by every sensor read.
    pub fn with_readings(mut self, readings: SensorReadings) -> Self {
        self.readings = readings;
        self
    }

    /// Fail every call of `op` with `error`.
    pub fn fail_on(&self, op: TargetOp, error: TargetError) {
        self.failures.lock().unwrap().push(FailureRule {
            op,
            error,
            remaining: None,
        });
    }

    /// Fail only the next call of `op`.
    pub fn fail_once(&self, op: TargetOp, error: TargetError) {
        self.failures.lock().unwrap().push(FailureRule {
            op,
            error,
            remaining: Some(1),
        });
    }

    pub fn clear_failures(&self) {
        self.failures.lock().unwrap().clear();
    }

    pub fn calls(&self) -> Vec<TargetCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, op: TargetOp) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.op() == op)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Log the attempt, then apply the first matching failure rule.
    fn record(&self, call: TargetCall) -> Result<(), TargetError> {
        let op = call.op();
        self.calls.lock().unwrap().push(call);

        let mut failures = self.failures.lock().unwrap();
        let Some(pos) = failures.iter().position(|r| r.op == op) else {
            return Ok(());
        };
        let error = failures[pos].error.clone();
        if let Some(remaining) = failures[pos].remaining.as_mut() {
            *remaining -= 1;
            if *remaining == 0 {
                failures.remove(pos);
            }
        }
        Err(error)
    }
}

#[async_trait]
impl ExecutionTarget for RecordingTarget {
    async fn set_motors(
        &mut self,
        target: MotorTarget,
        action: MotorAction,
        speed: f64,
        duration_ms: Option<u64>,
    ) -> Result<(), TargetError> {
        self.record(TargetCall::SetMotors {
            target,
            action,
            speed,
            duration_ms,
        })
    }

    async fn stop_motors(&mut self) -> Result<(), TargetError> {
        self.record(TargetCall::StopMotors)
    }

    async fn set_led(
        &mut self,
        r: u8,
        g: u8,
        b: u8,
        duration_ms: Option<u64>,
    ) -> Result<(), TargetError> {
        self.record(TargetCall::SetLed {
            r,
            g,
            b,
            duration_ms,
        })
    }

    async fn read_sensors(&mut self, target: SensorTarget) -> Result<SensorReadings, TargetError> {
        self.record(TargetCall::ReadSensors(target))?;
        Ok(self.readings.clone())
    }

    async fn wait(&mut self, duration_ms: u64) -> Result<(), TargetError> {
        self.record(TargetCall::Wait(duration_ms))
    }

    fn kind(&self) -> TargetKind {
        self.kind
    }
}
