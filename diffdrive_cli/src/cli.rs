//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "diffdrive", version, about = "Differential-drive wheel speed controller")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log and print results as JSON instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); RUST_LOG takes precedence
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Memory locking mode for real-time operation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum RtLock {
    /// Do not lock memory
    None,
    /// Lock currently resident pages
    Current,
    /// Lock current and future pages
    All,
}

impl RtLock {
    #[inline]
    pub fn os_default() -> Self {
        if cfg!(target_os = "linux") {
            RtLock::Current
        } else {
            RtLock::None
        }
    }
}

/// Real-time knobs for `run`.
#[derive(clap::Args, Debug, Clone, Copy)]
pub struct RtArgs {
    /// Enable real-time mode (SCHED_FIFO, affinity, mlockall)
    #[arg(
        long,
        action = ArgAction::SetTrue,
        long_help = "Enable real-time mode on supported OSes.\n\nLinux: Attempts SCHED_FIFO priority, pins to one CPU, and calls mlockall to keep the control loop out of page faults. May require CAP_SYS_NICE / CAP_IPC_LOCK or root.\n\nOther OSes: only mlockall is attempted."
    )]
    pub rt: bool,
    /// Real-time priority for SCHED_FIFO on Linux (1..=max)
    #[arg(long, value_name = "PRIO")]
    pub rt_prio: Option<i32>,
    /// Memory locking mode for --rt: none, current, or all
    #[arg(long, value_enum, value_name = "MODE")]
    pub rt_lock: Option<RtLock>,
    /// CPU index to pin the process to when --rt is enabled (Linux only, default 0)
    #[arg(long, value_name = "CPU")]
    pub rt_cpu: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the wheel control loop until Ctrl-C or --max-ticks
    Run {
        /// Use the simulated wheels and read command frames from stdin
        #[arg(long, action = ArgAction::SetTrue)]
        sim: bool,
        /// Serial device for command frames (overrides link.port)
        #[arg(long, value_name = "PATH")]
        port: Option<String>,
        /// Stop after this many control ticks
        #[arg(long, value_name = "N")]
        max_ticks: Option<u64>,
        /// Write one CSV row per tick (tick,target_l,rpm_l,duty_l,target_r,rpm_r,duty_r)
        #[arg(long, value_name = "FILE")]
        telemetry_csv: Option<PathBuf>,
        /// Print control loop timing stats on exit
        #[arg(long, action = ArgAction::SetTrue)]
        stats: bool,
        #[command(flatten)]
        rt: RtArgs,
    },
    /// Decode one command frame, e.g. "1,120,2,80#"
    Decode {
        /// Frame text; the trailing '#' is optional
        frame: String,
    },
    /// Validate the config and report the selected backend
    SelfCheck,
}
