//! Simulated wheel: motor driver + first-order plant + encoder edges.
//!
//! `SimMotor` records what the controller writes; `WheelPlant` integrates a
//! DC-motor speed response from those writes and emits one rising edge per
//! encoder pulse into an [`EdgeSink`], timestamped on the controller's time
//! base. The plant is stepped explicitly, so runs are deterministic.
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use diffdrive_traits::{EdgeSink, HwResult, MotorDriver};

const EN1: u8 = 0b01;
const EN2: u8 = 0b10;

#[derive(Debug, Default)]
struct Drive {
    duty: AtomicU8,
    pins: AtomicU8,
}

/// Motor driver half of a simulated wheel.
#[derive(Debug, Clone)]
pub struct SimMotor {
    drive: Arc<Drive>,
}

impl MotorDriver for SimMotor {
    fn set_duty(&mut self, duty: u8) -> HwResult<()> {
        self.drive.duty.store(duty, Ordering::Relaxed);
        Ok(())
    }

    fn set_direction(&mut self, en1: bool, en2: bool) -> HwResult<()> {
        let bits = if en1 { EN1 } else { 0 } | if en2 { EN2 } else { 0 };
        self.drive.pins.store(bits, Ordering::Relaxed);
        Ok(())
    }
}

/// Plant parameters.
#[derive(Debug, Clone, Copy)]
pub struct PlantParams {
    /// Steady-state speed at full duty (255), RPM.
    pub no_load_rpm: f32,
    /// First-order time constant, seconds.
    pub tau_s: f32,
    pub pulses_per_rev: u32,
}

impl Default for PlantParams {
    fn default() -> Self {
        Self {
            no_load_rpm: 300.0,
            tau_s: 0.15,
            pulses_per_rev: 250,
        }
    }
}

/// Speed response of one wheel, driven by a paired [`SimMotor`].
pub struct WheelPlant {
    drive: Arc<Drive>,
    sink: Arc<dyn EdgeSink>,
    params: PlantParams,
    /// Signed speed, RPM (positive = forward).
    rpm: f32,
    /// Fraction of a pulse carried into the next step.
    phase: f32,
    last_us: Option<u64>,
    edges: u64,
}

impl core::fmt::Debug for WheelPlant {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WheelPlant")
            .field("rpm", &self.rpm)
            .field("edges", &self.edges)
            .finish()
    }
}

/// Build a connected motor/plant pair feeding `sink`.
pub fn sim_wheel(sink: Arc<dyn EdgeSink>, params: PlantParams) -> (SimMotor, WheelPlant) {
    let drive = Arc::new(Drive::default());
    let motor = SimMotor {
        drive: drive.clone(),
    };
    let plant = WheelPlant {
        drive,
        sink,
        params,
        rpm: 0.0,
        phase: 0.0,
        last_us: None,
        edges: 0,
    };
    (motor, plant)
}

impl WheelPlant {
    /// Speed the plant settles at for the current driver outputs.
    fn drive_target(&self) -> f32 {
        let duty = f32::from(self.drive.duty.load(Ordering::Relaxed));
        let speed = duty / 255.0 * self.params.no_load_rpm;
        match self.drive.pins.load(Ordering::Relaxed) {
            EN2 => speed,
            EN1 => -speed,
            // both low (coast) or both high (brake)
            _ => 0.0,
        }
    }

    /// Integrate up to `now_us` and emit the edges that fall in between.
    /// The first call only anchors the time base.
    pub fn advance(&mut self, now_us: u64) {
        let Some(last) = self.last_us.replace(now_us) else {
            return;
        };
        let span_us = now_us.saturating_sub(last);
        if span_us == 0 {
            return;
        }
        // 1 ms integration steps keep the exponential response stable
        let mut t = last;
        while t < now_us {
            let step_us = (now_us - t).min(1_000);
            let dt = step_us as f32 / 1e6;
            let target = self.drive_target();
            let alpha = (dt / self.params.tau_s.max(1e-4)).min(1.0);
            self.rpm += (target - self.rpm) * alpha;

            let pulses_per_s = self.rpm.abs() / 60.0 * self.params.pulses_per_rev as f32;
            let before = self.phase;
            self.phase += pulses_per_s * dt;
            let whole = self.phase.floor();
            if whole >= 1.0 {
                let per_pulse = (dt / (self.phase - before)) * 1e6;
                for k in 0..whole as u64 {
                    let offset = (1.0 - before + k as f32) * per_pulse;
                    let ts = t + (offset as u64).min(step_us);
                    self.sink.on_rising_edge(ts);
                    self.edges += 1;
                }
                self.phase -= whole;
            }
            t += step_us;
        }
    }

    /// Current signed wheel speed, RPM.
    pub fn rpm(&self) -> f32 {
        self.rpm
    }

    /// Edges emitted so far.
    pub fn edges(&self) -> u64 {
        self.edges
    }
}
