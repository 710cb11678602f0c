//! Loop-side velocity estimation and low-pass filtering.
//!
//! Two estimates per tick:
//! - method 1: position delta over the loop period (feeds the PID),
//! - method 2: the encoder's inter-edge `1/Δt` (telemetry only).
//!
//! Both are converted to RPM and smoothed by independent [`LowPass`] states.
use crate::config::FilterCoeffs;
use crate::encoder::EncoderSnapshot;
use crate::util::{elapsed_s, pps_to_rpm};

/// One-pole low-pass: `y = a*y + b*x + b*x_prev`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LowPass {
    filtered: f32,
    prev_raw: f32,
}

impl LowPass {
    #[inline]
    pub fn update(&mut self, coeffs: FilterCoeffs, raw: f32) -> f32 {
        self.filtered = coeffs.a * self.filtered + coeffs.b * raw + coeffs.b * self.prev_raw;
        self.prev_raw = raw;
        self.filtered
    }

    pub fn value(&self) -> f32 {
        self.filtered
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Result of one estimator update.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VelocityEstimate {
    /// Loop period used as the timing base, seconds (already floored).
    pub dt_s: f32,
    /// Unfiltered method-1 RPM.
    pub raw_rpm: f32,
    /// Filtered method-1 RPM, the PID feedback signal.
    pub filtered_rpm: f32,
    /// Filtered method-2 (inter-edge) RPM.
    pub edge_rpm: f32,
}

#[derive(Debug, Clone)]
pub struct VelocityEstimator {
    coeffs: FilterCoeffs,
    pulses_per_rev: u32,
    min_dt_s: f32,
    prev_position: u32,
    last_loop_us: u64,
    loop_filter: LowPass,
    edge_filter: LowPass,
}

impl VelocityEstimator {
    pub fn new(coeffs: FilterCoeffs, pulses_per_rev: u32, min_dt_s: f32) -> Self {
        Self {
            coeffs,
            pulses_per_rev,
            min_dt_s,
            prev_position: 0,
            last_loop_us: 0,
            loop_filter: LowPass::default(),
            edge_filter: LowPass::default(),
        }
    }

    pub fn update(&mut self, snap: EncoderSnapshot, now_us: u64) -> VelocityEstimate {
        let dt_s = elapsed_s(now_us, self.last_loop_us, self.min_dt_s);
        let delta = snap.position.wrapping_sub(self.prev_position);
        let pps = delta as f32 / dt_s;
        self.prev_position = snap.position;
        self.last_loop_us = now_us;

        let raw_rpm = pps_to_rpm(pps, self.pulses_per_rev);
        let raw_edge_rpm = pps_to_rpm(snap.velocity_pps, self.pulses_per_rev);
        let filtered_rpm = self.loop_filter.update(self.coeffs, raw_rpm);
        let edge_rpm = self.edge_filter.update(self.coeffs, raw_edge_rpm);
        VelocityEstimate {
            dt_s,
            raw_rpm,
            filtered_rpm,
            edge_rpm,
        }
    }

    /// Re-base the timing reference on `snap`/`now_us` and clear both
    /// filters, as if the loop had just started at this instant.
    pub fn resync(&mut self, snap: EncoderSnapshot, now_us: u64) {
        self.prev_position = snap.position;
        self.last_loop_us = now_us;
        self.loop_filter.reset();
        self.edge_filter.reset();
    }

    pub fn filtered_rpm(&self) -> f32 {
        self.loop_filter.value()
    }

    pub fn edge_rpm(&self) -> f32 {
        self.edge_filter.value()
    }
}
