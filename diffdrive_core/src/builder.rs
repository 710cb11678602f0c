//! Builder for `DriveController`.
//!
//! Motors are required; encoders, params and clock default. `build()`
//! validates the parameter set before any channel is constructed.

use std::sync::Arc;

use diffdrive_traits::MotorDriver;
use diffdrive_traits::clock::{Clock, MonotonicClock};

use crate::channel::MotorChannel;
use crate::config::DriveParams;
use crate::encoder::EncoderCounter;
use crate::error::BuildError;
use crate::supervisor::DriveController;
use crate::types::Side;

impl<M: MotorDriver> DriveController<M> {
    /// Start building a controller.
    pub fn builder() -> DriveControllerBuilder<M> {
        DriveControllerBuilder::default()
    }
}

pub struct DriveControllerBuilder<M> {
    motors: [Option<M>; 2],
    encoders: [Option<Arc<EncoderCounter>>; 2],
    params: Option<DriveParams>,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
}

impl<M> Default for DriveControllerBuilder<M> {
    fn default() -> Self {
        Self {
            motors: [None, None],
            encoders: [None, None],
            params: None,
            clock: None,
        }
    }
}

impl<M: MotorDriver> DriveControllerBuilder<M> {
    pub fn with_motor(mut self, side: Side, motor: M) -> Self {
        self.motors[side.index()] = Some(motor);
        self
    }

    pub fn with_left_motor(self, motor: M) -> Self {
        self.with_motor(Side::Left, motor)
    }

    pub fn with_right_motor(self, motor: M) -> Self {
        self.with_motor(Side::Right, motor)
    }

    /// Share an existing counter (e.g. one already attached to an edge source).
    pub fn with_encoder(mut self, side: Side, encoder: Arc<EncoderCounter>) -> Self {
        self.encoders[side.index()] = Some(encoder);
        self
    }

    pub fn with_params(mut self, params: DriveParams) -> Self {
        self.params = Some(params);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + Send + Sync + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    pub fn build(self) -> Result<DriveController<M>, BuildError> {
        let params = self.params.unwrap_or_default();
        validate(&params)?;

        let [left, right] = self.motors;
        let left = left.ok_or(BuildError::MissingLeftMotor)?;
        let right = right.ok_or(BuildError::MissingRightMotor)?;
        let [enc_l, enc_r] = self.encoders;
        let min_dt = params.limits.min_dt_s;
        let enc_l = enc_l.unwrap_or_else(|| Arc::new(EncoderCounter::new(min_dt)));
        let enc_r = enc_r.unwrap_or_else(|| Arc::new(EncoderCounter::new(min_dt)));

        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(MonotonicClock::new()));
        let epoch = clock.now();

        tracing::info!(
            kp = params.gains.kp,
            ki = params.gains.ki,
            kd = params.gains.kd,
            ramp_rate = params.ramp_rate_rpm_s,
            ppr = params.pulses_per_rev,
            "drive controller ready"
        );

        Ok(DriveController {
            channels: [
                MotorChannel::new(Side::Left, left, enc_l, &params),
                MotorChannel::new(Side::Right, right, enc_r, &params),
            ],
            params,
            clock,
            epoch,
        })
    }
}

fn validate(p: &DriveParams) -> Result<(), BuildError> {
    let g = &p.gains;
    if ![g.kp, g.ki, g.kd].iter().all(|v| v.is_finite()) {
        return Err(BuildError::InvalidConfig("gains must be finite"));
    }
    if !(p.ramp_rate_rpm_s.is_finite() && p.ramp_rate_rpm_s > 0.0) {
        return Err(BuildError::InvalidConfig("ramp_rate_rpm_s must be > 0"));
    }
    if p.pulses_per_rev == 0 {
        return Err(BuildError::InvalidConfig("pulses_per_rev must be > 0"));
    }
    if !(p.limits.min_dt_s.is_finite() && p.limits.min_dt_s > 0.0) {
        return Err(BuildError::InvalidConfig("min_dt_s must be > 0"));
    }
    if !(p.limits.integral_clamp.is_finite() && p.limits.integral_clamp > 0.0) {
        return Err(BuildError::InvalidConfig("integral_clamp must be > 0"));
    }
    Ok(())
}
