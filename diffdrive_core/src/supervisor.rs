//! Direction/reset supervisor: the `control` entry point.
//!
//! Per tick and per wheel it decides between stopping, driving, or driving
//! after a PID reset. It is purely reactive: the only memory is each
//! channel's last applied `(direction, target)`.
use std::sync::Arc;
use std::time::Instant;

use diffdrive_traits::{Clock, MotorDriver};

use crate::channel::MotorChannel;
use crate::config::DriveParams;
use crate::encoder::EncoderCounter;
use crate::error::Result;
use crate::output::Direction;
use crate::types::{ChannelReport, DriveCommand, Side, TickReport, WheelCommand};

/// What the supervisor does with one wheel this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Pins low, duty 0, all bookkeeping zeroed; PID not run.
    Stop,
    /// Run the loop; `reset` zeroes integral/derivative memory first.
    Drive { reset: bool },
}

/// Reset policy: a drive tick resets PID state when the direction differs
/// from the last applied one or the target jumps by more than `threshold`.
#[inline]
pub fn decide(
    prev_direction: Direction,
    prev_target: u32,
    cmd: WheelCommand,
    threshold: u32,
) -> Action {
    if !cmd.direction.is_driving() {
        return Action::Stop;
    }
    let reset = prev_direction != cmd.direction || cmd.rpm.abs_diff(prev_target) > threshold;
    Action::Drive { reset }
}

/// Two independent wheel loops behind one supervisor.
pub struct DriveController<M: MotorDriver> {
    pub(crate) channels: [MotorChannel<M>; 2],
    pub(crate) params: DriveParams,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) epoch: Instant,
}

impl<M: MotorDriver> core::fmt::Debug for DriveController<M> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DriveController")
            .field("left", &self.channels[0])
            .field("right", &self.channels[1])
            .finish()
    }
}

impl<M: MotorDriver> DriveController<M> {
    pub fn params(&self) -> &DriveParams {
        &self.params
    }

    pub fn channel(&self, side: Side) -> &MotorChannel<M> {
        &self.channels[side.index()]
    }

    /// Shared counter for `side`, to hand to an edge source.
    pub fn encoder(&self, side: Side) -> Arc<EncoderCounter> {
        self.channels[side.index()].encoder().clone()
    }

    /// Time base for `now_us` and for encoder edge timestamps.
    pub fn epoch(&self) -> Instant {
        self.epoch
    }

    /// Microseconds since the controller was built, from its clock.
    pub fn now_us(&self) -> u64 {
        self.clock.us_since(self.epoch)
    }

    /// Apply `cmd` at the current clock time.
    pub fn control(&mut self, cmd: DriveCommand) -> Result<TickReport> {
        let now_us = self.now_us();
        self.control_at(now_us, cmd)
    }

    /// Apply `cmd` at an explicit timestamp (microseconds on the same base as
    /// the encoder edges).
    pub fn control_at(&mut self, now_us: u64, cmd: DriveCommand) -> Result<TickReport> {
        let left = self.apply(Side::Left, now_us, cmd.left)?;
        let right = self.apply(Side::Right, now_us, cmd.right)?;
        Ok(TickReport {
            now_us,
            left,
            right,
        })
    }

    /// Force both wheels to STOP.
    pub fn stop_all(&mut self) -> Result<TickReport> {
        let now_us = self.now_us();
        self.control_at(now_us, DriveCommand::STOP)
    }

    fn apply(&mut self, side: Side, now_us: u64, cmd: WheelCommand) -> Result<ChannelReport> {
        let threshold = self.params.limits.direction_reset_threshold_rpm;
        let ch = &mut self.channels[side.index()];
        match decide(ch.prev_direction(), ch.prev_target(), cmd, threshold) {
            Action::Stop => {
                if ch.prev_direction().is_driving() {
                    tracing::debug!(side = side.name(), "stop");
                }
                ch.stop(now_us)
            }
            Action::Drive { reset } => {
                if reset {
                    tracing::debug!(
                        side = side.name(),
                        from = %ch.prev_direction(),
                        to = %cmd.direction,
                        prev_rpm = ch.prev_target(),
                        rpm = cmd.rpm,
                        "pid reset"
                    );
                    ch.reset_pid();
                }
                ch.drive(now_us, cmd.direction, cmd.rpm, reset)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Direction::Stop, 0, Direction::Forward, 100, Action::Drive { reset: true })]
    #[case(Direction::Forward, 100, Direction::Forward, 150, Action::Drive { reset: false })]
    #[case(Direction::Forward, 100, Direction::Forward, 151, Action::Drive { reset: true })]
    #[case(Direction::Forward, 100, Direction::Forward, 49, Action::Drive { reset: true })]
    #[case(Direction::Forward, 100, Direction::Forward, 50, Action::Drive { reset: false })]
    #[case(Direction::Forward, 100, Direction::Reverse, 100, Action::Drive { reset: true })]
    #[case(Direction::Reverse, 80, Direction::Reverse, 80, Action::Drive { reset: false })]
    #[case(Direction::Reverse, 80, Direction::Stop, 80, Action::Stop)]
    #[case(Direction::Stop, 0, Direction::Stop, 0, Action::Stop)]
    fn reset_policy(
        #[case] prev_dir: Direction,
        #[case] prev_rpm: u32,
        #[case] dir: Direction,
        #[case] rpm: u32,
        #[case] expected: Action,
    ) {
        assert_eq!(
            decide(prev_dir, prev_rpm, WheelCommand::new(dir, rpm), 50),
            expected
        );
    }
}
