//! Common time/period helpers for diffdrive_core.

/// Number of microseconds in one second.
pub const MICROS_PER_SEC: u64 = 1_000_000;
/// Number of milliseconds in one second.
pub const MILLIS_PER_SEC: u64 = 1_000;

/// Compute the period in microseconds for a given loop rate in Hz.
/// - Clamps `hz` to at least 1 to avoid division by zero.
/// - Ensures result is at least 1 microsecond.
#[inline]
pub fn period_us(hz: u32) -> u64 {
    debug_assert!(hz > 0, "loop_hz must be > 0");
    (MICROS_PER_SEC / u64::from(hz.max(1))).max(1)
}

/// Compute the period in milliseconds for a given loop rate in Hz.
/// - Clamps `hz` to at least 1 to avoid division by zero.
/// - Ensures result is at least 1 millisecond.
#[inline]
pub fn period_ms(hz: u32) -> u64 {
    debug_assert!(hz > 0, "loop_hz must be > 0");
    (MILLIS_PER_SEC / u64::from(hz.max(1))).max(1)
}

/// Convert a microsecond delta to seconds, floored at `min_dt_s`.
#[inline]
pub fn elapsed_s(now_us: u64, then_us: u64, min_dt_s: f32) -> f32 {
    let dt = now_us.saturating_sub(then_us) as f64 / MICROS_PER_SEC as f64;
    (dt as f32).max(min_dt_s)
}

/// Pulses per second to output-shaft RPM.
#[inline]
pub fn pps_to_rpm(pps: f32, pulses_per_rev: u32) -> f32 {
    pps / pulses_per_rev.max(1) as f32 * 60.0
}
