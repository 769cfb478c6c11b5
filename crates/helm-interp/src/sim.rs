//! Kinematic differential-drive simulator.
//!
//! Wheel commands are PWM values in -255..=255 (sign from the motor action).
//! A timed command integrates motion for its duration and then releases the
//! wheels it drove; an untimed command latches the wheel speed until the next
//! command, and `wait` integrates whatever is latched. Every integrated
//! millisecond advances the shared [`ManualClock`].

use async_trait::async_trait;
use helm_ir::{
    normalize_angle, Clock, ManualClock, MotorAction, MotorTarget, Pose, SensorId, SensorTarget,
    Velocity,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::trace;

use crate::target::{ExecutionTarget, SensorReadings, TargetError, TargetKind};
use crate::world::Arena;

const MAX_PWM: f64 = 255.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub arena: Arena,
    pub start_pose: Pose,
    pub wheel_base_cm: f64,
    pub robot_radius_cm: f64,
    /// Linear wheel speed at full PWM (cm/s).
    pub full_speed_cm_s: f64,
    /// Peak amplitude of distance noise (cm). Zero disables noise.
    pub sensor_noise_cm: f64,
    pub max_sensor_range_cm: f64,
    pub start_battery_voltage: f64,
    /// Voltage lost per second of full-power driving on both wheels.
    pub battery_drain_v_per_s: f64,
    pub step_ms: u64,
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            arena: Arena::default(),
            start_pose: Pose::new(150.0, 150.0, 0.0),
            wheel_base_cm: 10.0,
            robot_radius_cm: 8.0,
            full_speed_cm_s: 40.0,
            sensor_noise_cm: 0.5,
            max_sensor_range_cm: 255.0,
            start_battery_voltage: 4.2,
            battery_drain_v_per_s: 0.002,
            step_ms: 10,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimulatedTarget {
    config: SimConfig,
    clock: ManualClock,
    rng: ChaCha8Rng,
    pose: Pose,
    left_pwm: f64,
    right_pwm: f64,
    led: (u8, u8, u8),
    battery_voltage: f64,
    collisions: u32,
    recent_velocity: Velocity,
}

impl SimulatedTarget {
    pub fn new(config: SimConfig, clock: ManualClock) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            pose: config.start_pose,
            battery_voltage: config.start_battery_voltage,
            left_pwm: 0.0,
            right_pwm: 0.0,
            led: (0, 0, 0),
            collisions: 0,
            recent_velocity: Velocity::default(),
            clock,
            config,
        }
    }

    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn wheel_pwm(&self) -> (f64, f64) {
        (self.left_pwm, self.right_pwm)
    }

    pub fn led(&self) -> (u8, u8, u8) {
        self.led
    }

    pub fn battery_voltage(&self) -> f64 {
        self.battery_voltage
    }

    pub fn collisions(&self) -> u32 {
        self.collisions
    }

    /// Body velocity for the latched wheel speeds.
    pub fn velocity(&self) -> Velocity {
        let scale = self.config.full_speed_cm_s / MAX_PWM;
        let left = self.left_pwm * scale;
        let right = self.right_pwm * scale;
        Velocity::new((left + right) / 2.0, (left - right) / self.config.wheel_base_cm)
    }

    /// Body velocity over the last integrated step. Unlike [`velocity`],
    /// this survives a stop command, the way wheel odometry reports the
    /// motion that just ended.
    ///
    /// [`velocity`]: SimulatedTarget::velocity
    pub fn recent_velocity(&self) -> Velocity {
        self.recent_velocity
    }

    /// Noise-free distances in [`SensorId::ALL`] order.
    pub fn true_distances(&self) -> [f64; 8] {
        SensorId::ALL.map(|id| {
            self.config.arena.cast_ray(
                self.pose.x,
                self.pose.y,
                self.pose.rotation + id.angle(),
                self.config.max_sensor_range_cm,
            )
        })
    }

    /// Noisy distances in [`SensorId::ALL`] order, rounded to 0.1 cm.
    pub fn sample_distances(&mut self) -> [f64; 8] {
        let max = self.config.max_sensor_range_cm;
        let noise = self.config.sensor_noise_cm;
        let mut out = self.true_distances();
        for d in out.iter_mut() {
            if noise > 0.0 {
                // Triangular noise: sum of two uniforms.
                let n = (self.rng.gen::<f64>() + self.rng.gen::<f64>() - 1.0) * noise;
                *d += n;
            }
            *d = (d.clamp(0.0, max) * 10.0).round() / 10.0;
        }
        out
    }

    fn integrate(&mut self, duration_ms: u64) {
        let step = self.config.step_ms.max(1);
        let mut remaining = duration_ms;
        while remaining > 0 {
            let dt_ms = remaining.min(step);
            remaining -= dt_ms;
            self.step(dt_ms as f64 / 1000.0);
            self.clock.advance(dt_ms);
        }
    }

    fn step(&mut self, dt: f64) {
        self.recent_velocity = self.velocity();
        if self.left_pwm == 0.0 && self.right_pwm == 0.0 {
            return;
        }
        let Velocity {
            linear: v,
            angular: omega,
        } = self.recent_velocity;
        let heading = self.pose.rotation + omega * dt;
        let x = self.pose.x + v * heading.sin() * dt;
        let y = self.pose.y + v * heading.cos() * dt;

        self.pose.rotation = normalize_angle(heading);
        if self.config.arena.is_free(x, y, self.config.robot_radius_cm) {
            self.pose.x = x;
            self.pose.y = y;
        } else {
            self.collisions += 1;
            trace!(x, y, collisions = self.collisions, "simulated bump");
        }

        let load = (self.left_pwm.abs() + self.right_pwm.abs()) / (2.0 * MAX_PWM);
        self.battery_voltage =
            (self.battery_voltage - self.config.battery_drain_v_per_s * load * dt).max(0.0);
    }

    fn signed_pwm(action: &MotorAction, speed: f64) -> Result<f64, TargetError> {
        let magnitude = speed.clamp(0.0, MAX_PWM);
        match action {
            MotorAction::Forward => Ok(magnitude),
            MotorAction::Backward => Ok(-magnitude),
            MotorAction::Stop => Ok(0.0),
            MotorAction::Unrecognized(name) => {
                Err(TargetError::Rejected(format!("unknown motor action '{name}'")))
            }
        }
    }

    fn latch(&mut self, target: &MotorTarget, pwm: f64) -> Result<(), TargetError> {
        match target {
            MotorTarget::LeftWheel => self.left_pwm = pwm,
            MotorTarget::RightWheel => self.right_pwm = pwm,
            MotorTarget::Both => {
                self.left_pwm = pwm;
                self.right_pwm = pwm;
            }
            MotorTarget::Unrecognized(name) => {
                return Err(TargetError::Rejected(format!("unknown motor target '{name}'")))
            }
        }
        Ok(())
    }

    fn distance_json(&mut self) -> Value {
        let distances = self.sample_distances();
        let map: Map<String, Value> = SensorId::ALL
            .iter()
            .map(|id| (id.name().to_string(), json!(distances[id.index()])))
            .collect();
        Value::Object(map)
    }

    fn imu_json(&self) -> Value {
        let velocity = self.velocity();
        json!({
            "heading": self.pose.rotation,
            "linear_velocity": velocity.linear,
            "angular_velocity": velocity.angular,
        })
    }

    fn battery_json(&self) -> Value {
        let span = self.config.start_battery_voltage - 3.0;
        let percent = if span > 0.0 {
            ((self.battery_voltage - 3.0) / span * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };
        json!({ "voltage": self.battery_voltage, "percent": percent })
    }
}

#[async_trait]
impl ExecutionTarget for SimulatedTarget {
    async fn set_motors(
        &mut self,
        target: MotorTarget,
        action: MotorAction,
        speed: f64,
        duration_ms: Option<u64>,
    ) -> Result<(), TargetError> {
        let pwm = Self::signed_pwm(&action, speed)?;
        self.latch(&target, pwm)?;
        trace!(%target, %action, pwm, ?duration_ms, "simulated motor command");

        if let Some(ms) = duration_ms {
            self.integrate(ms);
            self.latch(&target, 0.0)?;
        }
        Ok(())
    }

    async fn stop_motors(&mut self) -> Result<(), TargetError> {
        self.left_pwm = 0.0;
        self.right_pwm = 0.0;
        Ok(())
    }

    async fn set_led(
        &mut self,
        r: u8,
        g: u8,
        b: u8,
        duration_ms: Option<u64>,
    ) -> Result<(), TargetError> {
        self.led = (r, g, b);
        if let Some(ms) = duration_ms {
            self.integrate(ms);
            self.led = (0, 0, 0);
        }
        Ok(())
    }

    async fn read_sensors(&mut self, target: SensorTarget) -> Result<SensorReadings, TargetError> {
        let mut readings = SensorReadings::new();
        let all = target == SensorTarget::All;
        if all || target == SensorTarget::Distance {
            readings.insert("distance".into(), self.distance_json());
        }
        if all || target == SensorTarget::Imu {
            readings.insert("imu".into(), self.imu_json());
        }
        if all || target == SensorTarget::Battery {
            readings.insert("battery".into(), self.battery_json());
        }
        if all || target == SensorTarget::Camera {
            readings.insert("camera".into(), json!({ "available": false }));
        }
        readings.insert("timestamp".into(), json!(self.clock.now_ms()));
        Ok(readings)
    }

    async fn wait(&mut self, duration_ms: u64) -> Result<(), TargetError> {
        self.integrate(duration_ms);
        Ok(())
    }

    fn kind(&self) -> TargetKind {
        TargetKind::Simulation
    }
}
