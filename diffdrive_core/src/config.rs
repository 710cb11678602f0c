//! Immutable control parameters handed to the controller at construction.
//!
//! These mirror the TOML sections in `diffdrive_config`; see `conversions`
//! for the `From` bridges.

/// PID gains shared by both motors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidGains {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
}

impl Default for PidGains {
    fn default() -> Self {
        Self {
            kp: 2.0,
            ki: 1.7,
            kd: 0.1,
        }
    }
}

/// Low-pass filter coefficients (`y = a*y + b*x + b*x_prev`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterCoeffs {
    pub a: f32,
    pub b: f32,
}

impl Default for FilterCoeffs {
    fn default() -> Self {
        Self { a: 0.854, b: 0.0728 }
    }
}

/// Fixed thresholds and clamps of the control loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limits {
    /// Integrate only while |error| < this (RPM).
    pub loop_deadband_rpm: f32,
    /// Integral accumulator is kept in [-integral_clamp, integral_clamp].
    pub integral_clamp: f32,
    /// Highest PWM duty ever written.
    pub output_clamp: u8,
    /// A target jump larger than this (RPM) resets PID state.
    pub direction_reset_threshold_rpm: u32,
    /// Floor on every elapsed-time divisor, seconds.
    pub min_dt_s: f32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            loop_deadband_rpm: 100.0,
            integral_clamp: 100.0,
            output_clamp: 254,
            direction_reset_threshold_rpm: 50,
            min_dt_s: 1e-6,
        }
    }
}

/// Everything the per-motor loop needs, fixed for the controller lifetime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriveParams {
    pub gains: PidGains,
    /// RPM per second.
    pub ramp_rate_rpm_s: f32,
    pub pulses_per_rev: u32,
    pub filter: FilterCoeffs,
    pub limits: Limits,
}

impl Default for DriveParams {
    fn default() -> Self {
        Self {
            gains: PidGains::default(),
            ramp_rate_rpm_s: 40.0,
            pulses_per_rev: 250,
            filter: FilterCoeffs::default(),
            limits: Limits::default(),
        }
    }
}

/// Command-link parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkParams {
    pub timeout_ms: u64,
    pub max_frame_len: usize,
    pub max_rpm: u32,
}

impl Default for LinkParams {
    fn default() -> Self {
        Self {
            timeout_ms: 1000,
            max_frame_len: 25,
            max_rpm: 500,
        }
    }
}
