//! Backend assembly and the `run` / `self-check` commands.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use diffdrive_config::Config;
use diffdrive_core::{
    CommandLink, DriveController, DriveParams, EncoderCounter, LinkParams, RunParams, RunStats,
    SerialPump, Side, TickReport, runner,
};
use diffdrive_hardware::{PlantParams, sim_wheel};
use diffdrive_traits::{MotorDriver, SerialRx};

use crate::cli::RtArgs;
use crate::rt::setup_rt_once;
use crate::telemetry::TelemetryCsv;

/// Receive queue depth between the serial reader thread and the loop.
const RX_QUEUE: usize = 1024;

#[derive(Debug)]
pub struct RunOpts {
    pub sim: bool,
    pub port: Option<String>,
    pub max_ticks: Option<u64>,
    pub telemetry_csv: Option<PathBuf>,
    pub rt: RtArgs,
}

/// Which backend `run` will use for these options in this build.
pub fn backend_name(sim: bool) -> &'static str {
    if sim || !cfg!(feature = "hardware") {
        "sim"
    } else {
        "rppal"
    }
}

pub fn run(cfg: &Config, opts: &RunOpts, shutdown: &AtomicBool) -> eyre::Result<RunStats> {
    setup_rt_once(&opts.rt);
    let run_params = RunParams {
        loop_hz: cfg.control.loop_hz,
        max_ticks: opts.max_ticks,
    };
    let telemetry = opts
        .telemetry_csv
        .as_deref()
        .map(TelemetryCsv::create)
        .transpose()?;

    #[cfg(feature = "hardware")]
    {
        if !opts.sim {
            return run_hardware(cfg, opts, run_params, shutdown, telemetry);
        }
    }
    #[cfg(not(feature = "hardware"))]
    {
        if !opts.sim {
            tracing::info!("built without the hardware feature; using simulated wheels");
        }
    }
    run_sim(cfg, opts, run_params, shutdown, telemetry)
}

fn run_sim(
    cfg: &Config,
    opts: &RunOpts,
    run_params: RunParams,
    shutdown: &AtomicBool,
    telemetry: Option<TelemetryCsv>,
) -> eyre::Result<RunStats> {
    let params = DriveParams::from(cfg);
    let plant = PlantParams {
        pulses_per_rev: params.pulses_per_rev,
        ..PlantParams::default()
    };
    let enc_l = Arc::new(EncoderCounter::new(params.limits.min_dt_s));
    let enc_r = Arc::new(EncoderCounter::new(params.limits.min_dt_s));
    let (motor_l, mut plant_l) = sim_wheel(enc_l.clone(), plant);
    let (motor_r, mut plant_r) = sim_wheel(enc_r.clone(), plant);

    let mut ctl = DriveController::builder()
        .with_left_motor(motor_l)
        .with_right_motor(motor_r)
        .with_encoder(Side::Left, enc_l)
        .with_encoder(Side::Right, enc_r)
        .with_params(params)
        .build()?;

    if opts.port.is_some() {
        tracing::warn!("--port is ignored in simulation; reading frames from stdin");
    }
    let pump = SerialPump::spawn(std::io::stdin(), RX_QUEUE);
    let link = CommandLink::new(pump.receiver(), &LinkParams::from(&cfg.link), ctl.now_ms());
    tracing::info!(loop_hz = run_params.loop_hz, "simulated wheels ready; reading frames from stdin");

    let stats = drive_loop(&mut ctl, link, run_params, shutdown, telemetry, |rep| {
        plant_l.advance(rep.now_us);
        plant_r.advance(rep.now_us);
    })?;
    report_overruns(&pump);
    Ok(stats)
}

#[cfg(feature = "hardware")]
fn run_hardware(
    cfg: &Config,
    opts: &RunOpts,
    run_params: RunParams,
    shutdown: &AtomicBool,
    telemetry: Option<TelemetryCsv>,
) -> eyre::Result<RunStats> {
    use diffdrive_core::hw_error::map_hw_error;
    use diffdrive_hardware::error::HwError;
    use diffdrive_hardware::gpio::{PwmMotor, attach_encoder, open_gpio, open_serial};
    use eyre::WrapErr;

    fn typed(e: HwError) -> eyre::Report {
        eyre::Report::new(map_hw_error(&e))
    }

    let p = &cfg.pins;
    let gpio = open_gpio().map_err(typed).wrap_err("open gpio")?;
    let left = PwmMotor::new(&gpio, p.m1_pwm, p.m1_en1, p.m1_en2)
        .map_err(typed)
        .wrap_err("open motor pins (m1)")?;
    let right = PwmMotor::new(&gpio, p.m2_pwm, p.m2_en1, p.m2_en2)
        .map_err(typed)
        .wrap_err("open motor pins (m2)")?;

    let mut ctl = DriveController::builder()
        .with_left_motor(left)
        .with_right_motor(right)
        .with_params(DriveParams::from(cfg))
        .build()?;

    // Interrupts stay registered while these pins are alive.
    let _enc_a = attach_encoder(&gpio, p.enc_a, ctl.encoder(Side::Left), ctl.epoch())
        .map_err(typed)
        .wrap_err("attach encoder (enc_a)")?;
    let _enc_b = attach_encoder(&gpio, p.enc_b, ctl.encoder(Side::Right), ctl.epoch())
        .map_err(typed)
        .wrap_err("attach encoder (enc_b)")?;

    let port = opts.port.as_deref().unwrap_or(&cfg.link.port);
    let serial = open_serial(port, cfg.link.baud)
        .map_err(typed)
        .wrap_err_with(|| format!("open serial port {port}"))?;
    let pump = SerialPump::spawn(serial, RX_QUEUE);
    let link = CommandLink::new(pump.receiver(), &LinkParams::from(&cfg.link), ctl.now_ms());

    let stats = drive_loop(&mut ctl, link, run_params, shutdown, telemetry, |_| {})?;
    report_overruns(&pump);
    Ok(stats)
}

fn drive_loop<M: MotorDriver, R: SerialRx>(
    ctl: &mut DriveController<M>,
    mut link: CommandLink<R>,
    run_params: RunParams,
    shutdown: &AtomicBool,
    mut telemetry: Option<TelemetryCsv>,
    mut after_tick: impl FnMut(&TickReport),
) -> eyre::Result<RunStats> {
    let stats = runner::run(ctl, &mut link, run_params, shutdown, |tick, rep| {
        after_tick(rep);
        if let Some(t) = telemetry.as_mut() {
            t.write(tick, rep)?;
        }
        Ok(())
    })?;
    if let Some(t) = telemetry {
        t.finish()?;
    }
    Ok(stats)
}

fn report_overruns(pump: &SerialPump) {
    let overruns = pump.overruns();
    if overruns > 0 {
        tracing::warn!(overruns, "serial receive queue overflowed; bytes were dropped");
    }
}

/// Check what `run` would need without starting the loop.
pub fn self_check(cfg: &Config) -> eyre::Result<&'static str> {
    DriveController::<diffdrive_hardware::SimMotor>::builder()
        .with_left_motor(sim_wheel(Arc::new(EncoderCounter::default()), PlantParams::default()).0)
        .with_right_motor(sim_wheel(Arc::new(EncoderCounter::default()), PlantParams::default()).0)
        .with_params(DriveParams::from(cfg))
        .build()?;

    #[cfg(feature = "hardware")]
    {
        use eyre::WrapErr;
        diffdrive_hardware::gpio::open_gpio()
            .map_err(|e| eyre::Report::new(diffdrive_core::hw_error::map_hw_error(&e)))
            .wrap_err("open gpio")?;
    }
    Ok(backend_name(false))
}
