#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! `diffdrive`: closed-loop wheel speed control for a differential-drive base.

mod cli;
mod decode;
mod drive;
mod error_fmt;
mod logging;
mod rt;
mod telemetry;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use diffdrive_config::Config;
use diffdrive_core::{LinkParams, RunStats};
use eyre::WrapErr;

use crate::cli::{Cli, Commands, JSON_MODE};
use crate::drive::RunOpts;
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(err) = real_main(cli) {
        tracing::error!(error = %format!("{err:#}"), "command failed");
        if JSON_MODE.get().copied().unwrap_or(false) {
            println!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        std::process::exit(exit_code_for_error(&err));
    }
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    let cfg = cli
        .config
        .as_deref()
        .map(diffdrive_config::load_path)
        .transpose()?;
    logging::init(
        cli.json,
        cli.log_level.as_deref(),
        cfg.as_ref().map(|c| &c.logging),
    )?;

    match cli.cmd {
        Commands::Run {
            sim,
            port,
            max_ticks,
            telemetry_csv,
            stats,
            rt,
        } => {
            let cfg = require_config(cfg)?;
            let shutdown = Arc::new(AtomicBool::new(false));
            let flag = shutdown.clone();
            ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
                .wrap_err("install Ctrl-C handler")?;

            let opts = RunOpts {
                sim,
                port,
                max_ticks,
                telemetry_csv,
                rt,
            };
            let run_stats = drive::run(&cfg, &opts, &shutdown)?;
            print_summary(&run_stats, cli.json, stats);
        }
        Commands::Decode { frame } => {
            let params = cfg
                .as_ref()
                .map_or_else(LinkParams::default, |c| LinkParams::from(&c.link));
            let cmd = decode::decode(&frame, &params)?;
            println!("{}", decode::render(&cmd, cli.json));
        }
        Commands::SelfCheck => {
            let cfg = require_config(cfg)?;
            let backend = drive::self_check(&cfg)?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "status": "ok",
                        "backend": backend,
                        "loop_hz": cfg.control.loop_hz,
                        "pulses_per_rev": cfg.encoder.pulses_per_rev,
                        "port": cfg.link.port,
                    })
                );
            } else {
                println!(
                    "OK (backend: {backend}, loop {} Hz, {} ppr, port {})",
                    cfg.control.loop_hz, cfg.encoder.pulses_per_rev, cfg.link.port
                );
            }
        }
    }
    Ok(())
}

fn require_config(cfg: Option<Config>) -> eyre::Result<Config> {
    cfg.ok_or_else(|| eyre::eyre!("no config file given; pass --config FILE"))
}

fn print_summary(s: &RunStats, json: bool, timing: bool) {
    if json {
        println!(
            "{}",
            serde_json::json!({
                "ticks": s.ticks,
                "frames_ok": s.frames_ok,
                "frames_dropped": s.frames_dropped,
                "link_timeouts": s.link_timeouts,
                "missed_deadlines": s.missed_deadlines,
                "max_tick_us": s.max_tick_us,
            })
        );
        return;
    }
    println!(
        "Run complete: {} ticks, {} frames ({} dropped), {} link timeouts",
        s.ticks, s.frames_ok, s.frames_dropped, s.link_timeouts
    );
    if timing {
        println!(
            "Loop timing: max tick {} us, {} missed deadlines",
            s.max_tick_us, s.missed_deadlines
        );
    }
}
