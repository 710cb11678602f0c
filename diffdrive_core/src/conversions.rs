//! `From` implementations bridging `diffdrive_config` types to core types.

use crate::config::{DriveParams, FilterCoeffs, Limits, LinkParams, PidGains};

// ── PidGains ─────────────────────────────────────────────────────────────────

impl From<&diffdrive_config::ControlCfg> for PidGains {
    fn from(c: &diffdrive_config::ControlCfg) -> Self {
        Self {
            kp: c.kp,
            ki: c.ki,
            kd: c.kd,
        }
    }
}

// ── FilterCoeffs ─────────────────────────────────────────────────────────────

impl From<&diffdrive_config::FilterCfg> for FilterCoeffs {
    fn from(c: &diffdrive_config::FilterCfg) -> Self {
        Self { a: c.a, b: c.b }
    }
}

// ── Limits ───────────────────────────────────────────────────────────────────

impl From<&diffdrive_config::LimitsCfg> for Limits {
    fn from(c: &diffdrive_config::LimitsCfg) -> Self {
        Self {
            loop_deadband_rpm: c.loop_deadband_rpm,
            integral_clamp: c.integral_clamp,
            output_clamp: c.output_clamp,
            direction_reset_threshold_rpm: c.direction_reset_threshold_rpm,
            min_dt_s: c.min_dt_s,
        }
    }
}

// ── DriveParams ──────────────────────────────────────────────────────────────

impl From<&diffdrive_config::Config> for DriveParams {
    fn from(c: &diffdrive_config::Config) -> Self {
        Self {
            gains: (&c.control).into(),
            ramp_rate_rpm_s: c.control.ramp_rate_rpm_s,
            pulses_per_rev: c.encoder.pulses_per_rev,
            filter: (&c.filter).into(),
            limits: (&c.limits).into(),
        }
    }
}

// ── LinkParams ───────────────────────────────────────────────────────────────

impl From<&diffdrive_config::LinkCfg> for LinkParams {
    fn from(c: &diffdrive_config::LinkCfg) -> Self {
        Self {
            timeout_ms: c.timeout_ms,
            max_frame_len: c.max_frame_len,
            max_rpm: c.max_rpm,
        }
    }
}
