use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use diffdrive_traits::{Clock, MotorDriver, SerialRx};
use eyre::WrapErr;

use crate::error::Result;
use crate::link::CommandLink;
use crate::supervisor::DriveController;
use crate::types::{DriveCommand, TickReport};

/// Loop pacing and termination.
#[derive(Debug, Clone, Copy)]
pub struct RunParams {
    pub loop_hz: u32,
    /// Stop after this many ticks; `None` runs until shutdown.
    pub max_ticks: Option<u64>,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            loop_hz: 50,
            max_ticks: None,
        }
    }
}

/// Loop timing and link counters collected over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub ticks: u64,
    /// Fresh → stale transitions of the link watchdog.
    pub link_timeouts: u64,
    /// Ticks whose work exceeded the loop period.
    pub missed_deadlines: u64,
    pub max_tick_us: u64,
    pub frames_ok: u64,
    pub frames_dropped: u64,
}

impl<M: MotorDriver> DriveController<M> {
    /// Milliseconds since the controller was built.
    pub fn now_ms(&self) -> u64 {
        self.clock.ms_since(self.epoch)
    }

    pub fn clock(&self) -> &dyn Clock {
        &*self.clock
    }
}

/// Run the control loop until `shutdown` is raised or `max_ticks` elapse.
///
/// Each tick drains the link, applies the STOP failsafe while the link is
/// stale, runs the supervisor, hands the report to `on_tick`, then sleeps
/// out the remainder of the period. Both motors are stopped on exit.
pub fn run<M, R, F>(
    controller: &mut DriveController<M>,
    link: &mut CommandLink<R>,
    params: RunParams,
    shutdown: &AtomicBool,
    mut on_tick: F,
) -> Result<RunStats>
where
    M: MotorDriver,
    R: SerialRx,
    F: FnMut(u64, &TickReport) -> Result<()>,
{
    let period = Duration::from_micros(crate::util::period_us(params.loop_hz));
    let mut stats = RunStats::default();
    let mut stale = false;

    tracing::info!(
        loop_hz = params.loop_hz,
        max_ticks = ?params.max_ticks,
        "control loop started"
    );

    let result = (|| -> Result<()> {
        loop {
            if shutdown.load(Ordering::Relaxed) {
                tracing::info!("shutdown requested");
                return Ok(());
            }
            if params.max_ticks.is_some_and(|max| stats.ticks >= max) {
                return Ok(());
            }

            let started = controller.clock().now();
            let now_ms = controller.now_ms();
            while link.poll(now_ms)?.is_some() {}

            let timed_out = link.is_timed_out(now_ms);
            if timed_out != stale {
                if timed_out {
                    stats.link_timeouts += 1;
                    tracing::warn!(
                        silent_ms = now_ms.saturating_sub(link.last_valid_ms()),
                        "command link stale, stopping motors"
                    );
                } else {
                    tracing::info!("command link recovered");
                }
                stale = timed_out;
            }
            let cmd = if timed_out {
                DriveCommand::STOP
            } else {
                link.latest()
            };

            let report = controller
                .control(cmd)
                .wrap_err_with(|| format!("control tick {}", stats.ticks))?;
            on_tick(stats.ticks, &report)?;
            stats.ticks += 1;

            let elapsed = controller
                .clock()
                .now()
                .saturating_duration_since(started);
            stats.max_tick_us = stats.max_tick_us.max(elapsed.as_micros() as u64);
            if elapsed >= period {
                stats.missed_deadlines += 1;
            } else {
                controller.clock().sleep(period - elapsed);
            }
        }
    })();

    let link_stats = link.stats();
    stats.frames_ok = link_stats.frames_ok;
    stats.frames_dropped = link_stats.frames_dropped;

    if let Err(e) = controller.stop_all() {
        tracing::warn!(error = %e, "stop_all failed on loop exit");
    }
    tracing::info!(
        ticks = stats.ticks,
        link_timeouts = stats.link_timeouts,
        missed_deadlines = stats.missed_deadlines,
        "control loop finished"
    );
    result.map(|()| stats)
}
