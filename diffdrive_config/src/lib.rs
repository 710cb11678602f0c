#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the differential-drive controller.
//!
//! `Config` and its sections are deserialized from TOML and validated. Every
//! section except `[pins]` falls back to the firmware defaults when absent.
use serde::Deserialize;

/// BCM pin numbers; only the hardware backend reads these.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct Pins {
    pub m1_pwm: u8,
    pub m1_en1: u8,
    pub m1_en2: u8,
    pub m2_pwm: u8,
    pub m2_en1: u8,
    pub m2_en2: u8,
    /// Encoder input for motor 1 (left)
    pub enc_a: u8,
    /// Encoder input for motor 2 (right)
    pub enc_b: u8,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ControlCfg {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
    /// Soft-start slew limit on the commanded target, RPM per second.
    pub ramp_rate_rpm_s: f32,
    /// Control loop frequency.
    pub loop_hz: u32,
}

impl Default for ControlCfg {
    fn default() -> Self {
        Self {
            kp: 2.0,
            ki: 1.7,
            kd: 0.1,
            ramp_rate_rpm_s: 40.0,
            loop_hz: 50,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EncoderCfg {
    /// Rising edges per output-shaft revolution.
    pub pulses_per_rev: u32,
}

impl Default for EncoderCfg {
    fn default() -> Self {
        Self {
            pulses_per_rev: 250,
        }
    }
}

/// One-pole low-pass coefficients: `y = a*y + b*x + b*x_prev`.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FilterCfg {
    pub a: f32,
    pub b: f32,
}

impl Default for FilterCfg {
    fn default() -> Self {
        // ~25 Hz cutoff at the nominal loop rate
        Self { a: 0.854, b: 0.0728 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LimitsCfg {
    /// Integrate only while |error| is below this (RPM).
    pub loop_deadband_rpm: f32,
    /// Symmetric bound on the integral accumulator.
    pub integral_clamp: f32,
    /// Maximum PWM duty written to the driver.
    pub output_clamp: u8,
    /// Target jump (RPM) under a held direction that resets PID state.
    pub direction_reset_threshold_rpm: u32,
    /// Floor applied to every elapsed-time divisor (seconds).
    pub min_dt_s: f32,
}

impl Default for LimitsCfg {
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

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LinkCfg {
    /// Serial device carrying command frames.
    pub port: String,
    pub baud: u32,
    /// Staleness watchdog window (ms) since the last valid frame.
    pub timeout_ms: u64,
    /// Partial frames longer than this are discarded.
    pub max_frame_len: usize,
    /// Upper clamp for decoded RPM fields.
    pub max_rpm: u32,
}

impl Default for LinkCfg {
    fn default() -> Self {
        Self {
            port: "/dev/ttyAMA0".to_string(),
            baud: 9600,
            timeout_ms: 1000,
            max_frame_len: 25,
            max_rpm: 500,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub pins: Pins,
    #[serde(default)]
    pub control: ControlCfg,
    #[serde(default)]
    pub encoder: EncoderCfg,
    #[serde(default)]
    pub filter: FilterCfg,
    #[serde(default)]
    pub limits: LimitsCfg,
    #[serde(default)]
    pub link: LinkCfg,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_path(path: &std::path::Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {:?}: {}", path, e))?;
    let cfg = load_toml(&text).map_err(|e| eyre::eyre!("parse config {:?}: {}", path, e))?;
    cfg.validate()?;
    Ok(cfg)
}

fn finite_non_negative(v: f32) -> bool {
    v.is_finite() && v >= 0.0
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Control
        if !finite_non_negative(self.control.kp) {
            eyre::bail!("control.kp must be finite and >= 0");
        }
        if !finite_non_negative(self.control.ki) {
            eyre::bail!("control.ki must be finite and >= 0");
        }
        if !finite_non_negative(self.control.kd) {
            eyre::bail!("control.kd must be finite and >= 0");
        }
        if !(self.control.ramp_rate_rpm_s.is_finite() && self.control.ramp_rate_rpm_s > 0.0) {
            eyre::bail!("control.ramp_rate_rpm_s must be > 0");
        }
        if self.control.loop_hz == 0 {
            eyre::bail!("control.loop_hz must be > 0");
        }
        if self.control.loop_hz > 10_000 {
            eyre::bail!("control.loop_hz must be <= 10000");
        }

        // Encoder
        if self.encoder.pulses_per_rev == 0 {
            eyre::bail!("encoder.pulses_per_rev must be > 0");
        }

        // Filter
        let (a, b) = (self.filter.a, self.filter.b);
        if !(a.is_finite() && (0.0..1.0).contains(&a)) {
            eyre::bail!("filter.a must be in [0.0, 1.0)");
        }
        if !(b.is_finite() && (0.0..1.0).contains(&b)) {
            eyre::bail!("filter.b must be in [0.0, 1.0)");
        }
        if (a + 2.0 * b - 1.0).abs() > 0.01 {
            eyre::bail!("filter coefficients must satisfy a + 2b = 1 (got {})", a + 2.0 * b);
        }

        // Limits
        if !(self.limits.loop_deadband_rpm.is_finite() && self.limits.loop_deadband_rpm > 0.0) {
            eyre::bail!("limits.loop_deadband_rpm must be > 0");
        }
        if !(self.limits.integral_clamp.is_finite() && self.limits.integral_clamp > 0.0) {
            eyre::bail!("limits.integral_clamp must be > 0");
        }
        if self.limits.output_clamp == 0 {
            eyre::bail!("limits.output_clamp must be >= 1");
        }
        if !(self.limits.min_dt_s.is_finite() && self.limits.min_dt_s > 0.0) {
            eyre::bail!("limits.min_dt_s must be > 0");
        }

        // Link
        if self.link.baud == 0 {
            eyre::bail!("link.baud must be > 0");
        }
        if self.link.timeout_ms == 0 {
            eyre::bail!("link.timeout_ms must be >= 1");
        }
        if self.link.max_frame_len == 0 {
            eyre::bail!("link.max_frame_len must be >= 1");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got {rot:?}");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PINS_ONLY: &str = r#"
[pins]
m1_pwm = 12
m1_en1 = 5
m1_en2 = 6
m2_pwm = 13
m2_en1 = 20
m2_en2 = 21
enc_a = 17
enc_b = 27
"#;

    #[test]
    fn defaults_match_firmware_tuning() {
        let cfg = load_toml(PINS_ONLY).expect("parse");
        assert_eq!(cfg.control.kp, 2.0);
        assert_eq!(cfg.control.ki, 1.7);
        assert_eq!(cfg.control.kd, 0.1);
        assert_eq!(cfg.control.ramp_rate_rpm_s, 40.0);
        assert_eq!(cfg.encoder.pulses_per_rev, 250);
        assert_eq!(cfg.limits.output_clamp, 254);
        assert_eq!(cfg.limits.direction_reset_threshold_rpm, 50);
        assert_eq!(cfg.link.timeout_ms, 1000);
        assert_eq!(cfg.link.max_frame_len, 25);
        cfg.validate().expect("defaults are valid");
    }

    #[test]
    fn missing_pins_is_a_parse_error() {
        assert!(load_toml("[control]\nkp = 1.0\n").is_err());
    }
}
