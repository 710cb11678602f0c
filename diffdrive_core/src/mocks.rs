//! Test and helper mocks for diffdrive_core.
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use diffdrive_traits::{HwResult, MotorDriver, SerialRx};

/// Last values written to a motor, plus a write count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MotorState {
    pub duty: u8,
    pub en1: bool,
    pub en2: bool,
    pub duty_writes: u64,
}

/// A motor driver that records what the controller wrote. Clones share state,
/// so a test can keep one handle while the controller owns the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingMotor {
    state: Arc<Mutex<MotorState>>,
}

impl RecordingMotor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MotorState {
        self.state.lock().map(|g| *g).unwrap_or_default()
    }
}

impl MotorDriver for RecordingMotor {
    fn set_duty(&mut self, duty: u8) -> HwResult<()> {
        if let Ok(mut s) = self.state.lock() {
            s.duty = duty;
            s.duty_writes += 1;
        }
        Ok(())
    }

    fn set_direction(&mut self, en1: bool, en2: bool) -> HwResult<()> {
        if let Ok(mut s) = self.state.lock() {
            s.en1 = en1;
            s.en2 = en2;
        }
        Ok(())
    }
}

/// A motor whose every write fails; exercises error mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct FaultyMotor;

impl MotorDriver for FaultyMotor {
    fn set_duty(&mut self, _duty: u8) -> HwResult<()> {
        Err("pwm write failed".into())
    }

    fn set_direction(&mut self, _en1: bool, _en2: bool) -> HwResult<()> {
        Err("gpio write timeout".into())
    }
}

/// Serial receiver fed from an in-memory queue. Clones share the queue.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSerial {
    queue: Arc<Mutex<VecDeque<u8>>>,
}

impl ScriptedSerial {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_str(&self, s: &str) {
        if let Ok(mut q) = self.queue.lock() {
            q.extend(s.bytes());
        }
    }

    pub fn remaining(&self) -> usize {
        self.queue.lock().map(|q| q.len()).unwrap_or(0)
    }
}

impl SerialRx for ScriptedSerial {
    fn read_byte(&mut self) -> HwResult<Option<u8>> {
        Ok(self.queue.lock().ok().and_then(|mut q| q.pop_front()))
    }
}
