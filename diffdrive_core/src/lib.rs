#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core closed-loop wheel control (hardware-agnostic).
//!
//! This crate runs two independent wheel-speed loops for a differential-drive
//! base. All hardware interaction goes through `diffdrive_traits::MotorDriver`,
//! `diffdrive_traits::SerialRx` and `diffdrive_traits::EdgeSink`.
//!
//! ## Architecture
//!
//! - **Encoder**: lock-free `(position, velocity)` snapshot written from the
//!   edge handler (`encoder` module)
//! - **Estimation**: loop-period RPM through a first-order low-pass, plus an
//!   inter-edge RPM for telemetry (`estimator` module)
//! - **Control**: setpoint ramp, PID with conditional integration, duty
//!   mapping (`ramp`, `pid`, `output` modules)
//! - **Supervision**: per-wheel stop / drive / drive-after-reset decision
//!   (`supervisor` module, entry point `DriveController::control`)
//! - **Link**: `#`-terminated ASCII command frames with a staleness watchdog
//!   (`link` module), fed by a background reader (`serial_pump` module)
//! - **Runner**: the periodic loop tying link and controller together
//!
//! Typical wiring:
//!
//! ```ignore
//! let mut ctl = DriveController::builder()
//!     .with_left_motor(left)
//!     .with_right_motor(right)
//!     .with_params(DriveParams::from(&cfg))
//!     .build()?;
//! let mut link = CommandLink::new(rx, &LinkParams::from(&cfg.link), ctl.now_ms());
//! runner::run(&mut ctl, &mut link, RunParams::default(), &shutdown, |_, _| Ok(()))?;
//! ```

pub mod builder;
pub mod channel;
pub mod config;
mod conversions;
pub mod encoder;
pub mod error;
pub mod estimator;
pub mod hw_error;
pub mod link;
pub mod mocks;
pub mod output;
pub mod pid;
pub mod ramp;
pub mod runner;
pub mod serial_pump;
pub mod supervisor;
pub mod types;
pub mod util;

pub use builder::DriveControllerBuilder;
pub use channel::MotorChannel;
pub use config::{DriveParams, FilterCoeffs, Limits, LinkParams, PidGains};
pub use encoder::{EncoderCounter, EncoderSnapshot};
pub use error::{BuildError, DriveError, Report, Result};
pub use estimator::{LowPass, VelocityEstimate, VelocityEstimator};
pub use link::{CommandLink, Frame, FrameDecoder, LinkStats, decode_frame};
pub use output::{Direction, duty_from_effort};
pub use pid::{Pid, PidOutput};
pub use ramp::Ramp;
pub use runner::{RunParams, RunStats, run};
pub use serial_pump::{PumpRx, SerialPump};
pub use supervisor::{Action, DriveController, decide};
pub use types::{ChannelReport, DriveCommand, Side, TickReport, WheelCommand};
