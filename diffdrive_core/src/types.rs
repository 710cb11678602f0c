//! Command and telemetry value types shared by the link, supervisor and runner.

use crate::output::Direction;

/// Which wheel of the differential drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Left, Side::Right];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

/// Direction and speed magnitude for one wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WheelCommand {
    pub direction: Direction,
    /// Target magnitude, RPM.
    pub rpm: u32,
}

impl WheelCommand {
    pub const STOP: WheelCommand = WheelCommand {
        direction: Direction::Stop,
        rpm: 0,
    };

    pub fn new(direction: Direction, rpm: u32) -> Self {
        Self { direction, rpm }
    }
}

/// One decoded frame: a command per wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DriveCommand {
    pub left: WheelCommand,
    pub right: WheelCommand,
}

impl DriveCommand {
    pub const STOP: DriveCommand = DriveCommand {
        left: WheelCommand::STOP,
        right: WheelCommand::STOP,
    };

    pub fn new(left: WheelCommand, right: WheelCommand) -> Self {
        Self { left, right }
    }

    pub fn wheel(&self, side: Side) -> WheelCommand {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }
}

/// What one channel did on one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChannelReport {
    pub direction: Direction,
    pub commanded_rpm: u32,
    /// Ramped target fed to the PID (0 on a stop tick).
    pub effective_target_rpm: f32,
    /// Filtered loop-period velocity (PID feedback).
    pub filtered_rpm: f32,
    /// Filtered inter-edge velocity, telemetry only.
    pub edge_rpm: f32,
    pub duty: u8,
    /// PID state was zeroed this tick before the loop ran.
    pub pid_reset: bool,
    pub integral: f32,
    pub position: u32,
}

/// Result of one supervisor invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickReport {
    pub now_us: u64,
    pub left: ChannelReport,
    pub right: ChannelReport,
}

impl TickReport {
    pub fn channel(&self, side: Side) -> &ChannelReport {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }
}
