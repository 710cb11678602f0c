//! Per-motor control loop: snapshot → estimate → ramp → PID → duty.
//!
//! `MotorChannel` owns all loop-side state for one wheel plus the
//! supervisor's bookkeeping (last applied direction/target). The decision of
//! whether to run, reset or stop lives in `supervisor`.
use std::sync::Arc;

use diffdrive_traits::MotorDriver;
use eyre::WrapErr;

use crate::config::DriveParams;
use crate::encoder::EncoderCounter;
use crate::error::Result;
use crate::estimator::VelocityEstimator;
use crate::hw_error::map_hw_error_dyn;
use crate::output::{Direction, duty_from_effort};
use crate::pid::Pid;
use crate::ramp::Ramp;
use crate::types::{ChannelReport, Side};

pub struct MotorChannel<M: MotorDriver> {
    side: Side,
    motor: M,
    encoder: Arc<EncoderCounter>,
    estimator: VelocityEstimator,
    ramp: Ramp,
    pid: Pid,
    output_clamp: u8,
    prev_target: u32,
    prev_direction: Direction,
}

impl<M: MotorDriver> core::fmt::Debug for MotorChannel<M> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MotorChannel")
            .field("side", &self.side)
            .field("smoothed_target", &self.ramp.value())
            .field("integral", &self.pid.integral())
            .field("prev_direction", &self.prev_direction)
            .field("prev_target", &self.prev_target)
            .finish()
    }
}

impl<M: MotorDriver> MotorChannel<M> {
    pub fn new(side: Side, motor: M, encoder: Arc<EncoderCounter>, params: &DriveParams) -> Self {
        Self {
            side,
            motor,
            encoder,
            estimator: VelocityEstimator::new(
                params.filter,
                params.pulses_per_rev,
                params.limits.min_dt_s,
            ),
            ramp: Ramp::new(params.ramp_rate_rpm_s),
            pid: Pid::new(params.gains, &params.limits),
            output_clamp: params.limits.output_clamp,
            prev_target: 0,
            prev_direction: Direction::Stop,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn encoder(&self) -> &Arc<EncoderCounter> {
        &self.encoder
    }

    pub fn prev_target(&self) -> u32 {
        self.prev_target
    }

    pub fn prev_direction(&self) -> Direction {
        self.prev_direction
    }

    pub fn integral(&self) -> f32 {
        self.pid.integral()
    }

    pub fn prev_error(&self) -> f32 {
        self.pid.prev_error()
    }

    pub fn smoothed_target(&self) -> f32 {
        self.ramp.value()
    }

    /// Zero the PID accumulators ahead of a discontinuous command.
    pub fn reset_pid(&mut self) {
        self.pid.reset();
    }

    /// Drive at `target` rpm in `direction`: set the enable pins, run one
    /// control iteration, and record the command as last applied.
    pub fn drive(
        &mut self,
        now_us: u64,
        direction: Direction,
        target: u32,
        pid_reset: bool,
    ) -> Result<ChannelReport> {
        let (en1, en2) = direction.pins();
        self.motor
            .set_direction(en1, en2)
            .map_err(|e| eyre::Report::new(map_hw_error_dyn(&*e)))
            .wrap_err_with(|| format!("{} set_direction", self.side.name()))?;

        let snap = self.encoder.read_snapshot();
        let est = self.estimator.update(snap, now_us);
        let effective = self.ramp.step(target as f32, est.dt_s);
        let out = self.pid.update(effective - est.filtered_rpm, est.dt_s);
        let duty = duty_from_effort(out.effort, self.output_clamp);
        self.motor
            .set_duty(duty)
            .map_err(|e| eyre::Report::new(map_hw_error_dyn(&*e)))
            .wrap_err_with(|| format!("{} set_duty", self.side.name()))?;

        self.prev_target = target;
        self.prev_direction = direction;

        tracing::trace!(
            side = self.side.name(),
            target = effective,
            rpm = est.filtered_rpm,
            edge_rpm = est.edge_rpm,
            effort = out.effort,
            duty,
            "control tick"
        );

        Ok(ChannelReport {
            direction,
            commanded_rpm: target,
            effective_target_rpm: effective,
            filtered_rpm: est.filtered_rpm,
            edge_rpm: est.edge_rpm,
            duty,
            pid_reset,
            integral: out.integral,
            position: snap.position,
        })
    }

    /// Pins low, duty 0, and all loop state zeroed. The estimator timing base
    /// is re-anchored at `now_us` so a later restart begins from a clean slate.
    pub fn stop(&mut self, now_us: u64) -> Result<ChannelReport> {
        self.pid.reset();
        self.ramp.reset();
        self.prev_target = 0;
        self.prev_direction = Direction::Stop;
        let snap = self.encoder.read_snapshot();
        self.estimator.resync(snap, now_us);

        let (en1, en2) = Direction::Stop.pins();
        self.motor
            .set_direction(en1, en2)
            .map_err(|e| eyre::Report::new(map_hw_error_dyn(&*e)))
            .wrap_err_with(|| format!("{} stop pins", self.side.name()))?;
        self.motor
            .set_duty(0)
            .map_err(|e| eyre::Report::new(map_hw_error_dyn(&*e)))
            .wrap_err_with(|| format!("{} stop duty", self.side.name()))?;

        Ok(ChannelReport {
            direction: Direction::Stop,
            pid_reset: true,
            position: snap.position,
            ..ChannelReport::default()
        })
    }
}
