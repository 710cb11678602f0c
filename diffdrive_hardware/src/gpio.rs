//! Raspberry Pi backends: H-bridge motor outputs, encoder interrupts and the
//! command serial port.
use std::sync::Arc;
use std::time::{Duration, Instant};

use diffdrive_traits::{EdgeSink, HwResult, MotorDriver};
use rppal::gpio::{InputPin, Level, OutputPin, Trigger};
use tracing::{debug, info};

use crate::error::{HwError, Result};

pub use rppal::gpio::Gpio;

/// Open the GPIO peripheral.
pub fn open_gpio() -> Result<Gpio> {
    Ok(Gpio::new()?)
}

/// Software PWM carrier on the enable pin.
pub const PWM_FREQUENCY_HZ: f64 = 490.0;

/// One H-bridge channel: a PWM pin plus two direction pins.
pub struct PwmMotor {
    pwm: OutputPin,
    en1: OutputPin,
    en2: OutputPin,
    duty: u8,
}

impl PwmMotor {
    pub fn new(gpio: &Gpio, pwm_pin: u8, en1_pin: u8, en2_pin: u8) -> Result<Self> {
        let mut pwm = gpio.get(pwm_pin)?.into_output_low();
        let en1 = gpio.get(en1_pin)?.into_output_low();
        let en2 = gpio.get(en2_pin)?.into_output_low();
        // Leave the outputs low when dropped.
        pwm.set_reset_on_drop(true);
        info!(pwm_pin, en1_pin, en2_pin, "motor outputs configured");
        Ok(Self {
            pwm,
            en1,
            en2,
            duty: 0,
        })
    }
}

impl MotorDriver for PwmMotor {
    fn set_duty(&mut self, duty: u8) -> HwResult<()> {
        if duty == self.duty {
            return Ok(());
        }
        if duty == 0 {
            self.pwm.clear_pwm().map_err(HwError::from)?;
            self.pwm.set_low();
        } else {
            let cycle = f64::from(duty) / 255.0;
            self.pwm
                .set_pwm_frequency(PWM_FREQUENCY_HZ, cycle)
                .map_err(HwError::from)?;
        }
        self.duty = duty;
        Ok(())
    }

    fn set_direction(&mut self, en1: bool, en2: bool) -> HwResult<()> {
        self.en1.write(Level::from(en1));
        self.en2.write(Level::from(en2));
        Ok(())
    }
}

/// Deliver rising edges on `pin` to `sink`, timestamped in microseconds since
/// `epoch`. Keep the returned pin alive for as long as edges are wanted.
pub fn attach_encoder(
    gpio: &Gpio,
    pin: u8,
    sink: Arc<dyn EdgeSink>,
    epoch: Instant,
) -> Result<InputPin> {
    let mut input = gpio.get(pin)?.into_input_pullup();
    input.set_async_interrupt(Trigger::RisingEdge, move |_level: Level| {
        let now_us = epoch.elapsed().as_micros() as u64;
        sink.on_rising_edge(now_us);
    })?;
    debug!(pin, "encoder interrupt attached");
    Ok(input)
}

/// Open the command serial port with a short read timeout so the reader
/// thread can notice shutdown.
pub fn open_serial(port: &str, baud: u32) -> Result<Box<dyn serialport::SerialPort>> {
    let sp = serialport::new(port, baud)
        .timeout(Duration::from_millis(100))
        .open()?;
    info!(port, baud, "serial port opened");
    Ok(sp)
}
