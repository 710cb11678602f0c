//! Simulated wheel driving the real encoder counter.
use std::sync::Arc;

use diffdrive_hardware::error::HwError;
use diffdrive_hardware::{PlantParams, sim_wheel};
use diffdrive_traits::{EdgeSink, MotorDriver};
use rstest::rstest;
use std::sync::atomic::{AtomicU64, Ordering};

/// Minimal counter standing in for the controller's encoder.
#[derive(Default)]
struct Counter {
    edges: AtomicU64,
    last_us: AtomicU64,
}

impl EdgeSink for Counter {
    fn on_rising_edge(&self, now_us: u64) {
        self.edges.fetch_add(1, Ordering::Relaxed);
        self.last_us.store(now_us, Ordering::Relaxed);
    }
}

#[rstest]
#[case(255, 300.0)]
#[case(128, 150.6)]
#[case(51, 60.0)]
fn steady_state_speed_scales_with_duty(#[case] duty: u8, #[case] expected_rpm: f32) {
    let counter = Arc::new(Counter::default());
    let (mut motor, mut plant) = sim_wheel(counter.clone(), PlantParams::default());
    motor.set_direction(false, true).unwrap();
    motor.set_duty(duty).unwrap();
    plant.advance(0);
    for k in 1..=150u64 {
        plant.advance(k * 20_000);
    }
    assert!(
        (plant.rpm() - expected_rpm).abs() < 1.0,
        "duty {duty}: rpm {}",
        plant.rpm()
    );
    assert!(counter.last_us.load(Ordering::Relaxed) <= 3_000_000);
}

#[test]
fn edges_match_pulses_per_rev() {
    let counter = Arc::new(Counter::default());
    let params = PlantParams {
        pulses_per_rev: 100,
        tau_s: 1e-3,
        ..PlantParams::default()
    };
    let (mut motor, mut plant) = sim_wheel(counter.clone(), params);
    motor.set_direction(false, true).unwrap();
    motor.set_duty(255).unwrap();
    plant.advance(0);
    plant.advance(10_000_000);
    // 300 rpm * 100 ppr for 10 s = 5000 edges, minus the brief spin-up
    let n = counter.edges.load(Ordering::Relaxed);
    assert!((4_990..=5_000).contains(&n), "edges {n}");
}

#[test]
fn hw_error_display() {
    assert_eq!(HwError::Timeout.to_string(), "hardware timeout");
    assert_eq!(
        HwError::Serial("framing".into()).to_string(),
        "serial error: framing"
    );
}
