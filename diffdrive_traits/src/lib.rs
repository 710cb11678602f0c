//! Collaborator traits for the differential-drive controller.
//!
//! The control engine never touches pins, timers or UARTs directly; it talks
//! to these traits and the hardware/simulation backends implement them.
pub mod clock;

pub use clock::{Clock, MonotonicClock};

pub type HwResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// One H-bridge channel: a PWM duty output plus the two enable lines.
pub trait MotorDriver {
    /// Write the PWM duty (0..=254 in practice; 255 is reserved headroom).
    fn set_duty(&mut self, duty: u8) -> HwResult<()>;
    /// Drive the two direction/enable pins.
    fn set_direction(&mut self, en1: bool, en2: bool) -> HwResult<()>;
}

/// Non-blocking serial receiver: yields one queued byte, or `None` when the
/// receive queue is empty.
pub trait SerialRx {
    fn read_byte(&mut self) -> HwResult<Option<u8>>;
}

/// Receiver of encoder rising edges. Called from interrupt context, so
/// implementations must be short and must not block.
pub trait EdgeSink: Send + Sync {
    fn on_rising_edge(&self, now_us: u64);
}

impl<M: MotorDriver + ?Sized> MotorDriver for Box<M> {
    fn set_duty(&mut self, duty: u8) -> HwResult<()> {
        (**self).set_duty(duty)
    }
    fn set_direction(&mut self, en1: bool, en2: bool) -> HwResult<()> {
        (**self).set_direction(en1, en2)
    }
}

impl<R: SerialRx + ?Sized> SerialRx for Box<R> {
    fn read_byte(&mut self) -> HwResult<Option<u8>> {
        (**self).read_byte()
    }
}
