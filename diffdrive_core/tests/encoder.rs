//! Edge counting through velocity estimation, end to end.
use std::sync::Arc;

use diffdrive_core::{EncoderCounter, FilterCoeffs, VelocityEstimator};
use diffdrive_traits::EdgeSink;

const PPR: u32 = 250;

#[test]
fn ten_edges_in_forty_ms_is_sixty_rpm() {
    let enc = EncoderCounter::default();
    for i in 1..=10u64 {
        enc.on_edge(i * 4_000);
    }
    let snap = enc.read_snapshot();
    assert_eq!(snap.position, 10);
    assert!((snap.velocity_pps - 250.0).abs() < 0.01);

    let mut est = VelocityEstimator::new(FilterCoeffs::default(), PPR, 1e-6);
    let e = est.update(snap, 40_000);
    assert!((e.dt_s - 0.04).abs() < 1e-6);
    assert!((e.raw_rpm - 60.0).abs() < 0.01);
    // first filtered sample: b * x
    assert!((e.filtered_rpm - 0.0728 * 60.0).abs() < 1e-3);
}

#[test]
fn filtered_rpm_settles_near_steady_speed() {
    let enc = Arc::new(EncoderCounter::default());
    let sink: Arc<dyn EdgeSink> = enc.clone();
    let mut est = VelocityEstimator::new(FilterCoeffs::default(), PPR, 1e-6);
    let mut t = 0u64;
    let mut last = 0.0;
    // 250 pps = 60 rpm; one loop tick every 20 ms
    for _ in 0..200 {
        for _ in 0..5 {
            t += 4_000;
            sink.on_rising_edge(t);
        }
        last = est.update(enc.read_snapshot(), t).filtered_rpm;
    }
    assert!((last - 60.0).abs() < 0.5, "settled at {last}");
    assert!((est.edge_rpm() - 60.0).abs() < 0.5);
}

#[test]
fn resync_discards_edges_seen_while_stopped() {
    let enc = EncoderCounter::default();
    let mut est = VelocityEstimator::new(FilterCoeffs::default(), PPR, 1e-6);
    for i in 1..=50u64 {
        enc.on_edge(i * 1_000);
    }
    est.resync(enc.read_snapshot(), 50_000);
    assert_eq!(est.filtered_rpm(), 0.0);
    let e = est.update(enc.read_snapshot(), 70_000);
    assert_eq!(e.raw_rpm, 0.0);
    assert!((e.dt_s - 0.02).abs() < 1e-6);
}
