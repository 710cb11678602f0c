//! Velocity PID with deadband-gated integration.
//!
//! The integral only accumulates while `|e| < deadband`, so startup and stall
//! transients do not wind it up; it is clamped to `±integral_clamp` after
//! every update regardless. The derivative is a plain backward difference.
use crate::config::{Limits, PidGains};

/// Per-term breakdown of the last update, for telemetry.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PidOutput {
    pub error: f32,
    pub integral: f32,
    pub derivative: f32,
    /// Control effort `kp*e + ki*I + kd*D`.
    pub effort: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct Pid {
    gains: PidGains,
    deadband: f32,
    integral_clamp: f32,
    integral: f32,
    prev_error: f32,
}

impl Pid {
    pub fn new(gains: PidGains, limits: &Limits) -> Self {
        Self {
            gains,
            deadband: limits.loop_deadband_rpm,
            integral_clamp: limits.integral_clamp,
            integral: 0.0,
            prev_error: 0.0,
        }
    }

    pub fn update(&mut self, error: f32, dt_s: f32) -> PidOutput {
        if error.abs() < self.deadband {
            self.integral += error * dt_s;
        }
        self.integral = self
            .integral
            .clamp(-self.integral_clamp, self.integral_clamp);

        let derivative = (error - self.prev_error) / dt_s;
        let effort =
            self.gains.kp * error + self.gains.ki * self.integral + self.gains.kd * derivative;
        self.prev_error = error;

        PidOutput {
            error,
            integral: self.integral,
            derivative,
            effort,
        }
    }

    /// Zero the integral and derivative memory.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = 0.0;
    }

    pub fn integral(&self) -> f32 {
        self.integral
    }

    pub fn prev_error(&self) -> f32 {
        self.prev_error
    }
}
