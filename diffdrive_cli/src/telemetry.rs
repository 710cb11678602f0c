//! Per-tick telemetry rows for plotting.

use std::fs::File;
use std::path::Path;

use diffdrive_core::TickReport;
use eyre::WrapErr;
use serde::Serialize;

/// One CSV row: ramped target, filtered speed and duty per wheel.
#[derive(Debug, Serialize)]
pub struct TelemetryRow {
    pub tick: u64,
    pub target_l: f32,
    pub rpm_l: f32,
    pub duty_l: u8,
    pub target_r: f32,
    pub rpm_r: f32,
    pub duty_r: u8,
}

impl TelemetryRow {
    pub fn new(tick: u64, rep: &TickReport) -> Self {
        Self {
            tick,
            target_l: rep.left.effective_target_rpm,
            rpm_l: rep.left.filtered_rpm,
            duty_l: rep.left.duty,
            target_r: rep.right.effective_target_rpm,
            rpm_r: rep.right.filtered_rpm,
            duty_r: rep.right.duty,
        }
    }
}

pub struct TelemetryCsv {
    wtr: csv::Writer<File>,
}

impl TelemetryCsv {
    pub fn create(path: &Path) -> eyre::Result<Self> {
        let wtr = csv::Writer::from_path(path)
            .wrap_err_with(|| format!("create telemetry csv {}", path.display()))?;
        Ok(Self { wtr })
    }

    pub fn write(&mut self, tick: u64, rep: &TickReport) -> eyre::Result<()> {
        self.wtr
            .serialize(TelemetryRow::new(tick, rep))
            .wrap_err("write telemetry row")
    }

    pub fn finish(mut self) -> eyre::Result<()> {
        self.wtr.flush().wrap_err("flush telemetry csv")
    }
}
