//! Motor, encoder and serial backends for the drive controller.
//!
//! The simulated wheel is always available; the Raspberry Pi backends
//! (`rppal` GPIO + `serialport`) are behind the `hardware` feature.
pub mod error;
pub mod sim;

#[cfg(feature = "hardware")]
pub mod gpio;

pub use sim::{PlantParams, SimMotor, WheelPlant, sim_wheel};

#[cfg(test)]
mod tests {
    use super::*;
    use diffdrive_traits::{EdgeSink, MotorDriver};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[derive(Default)]
    struct Count(AtomicU64);

    impl EdgeSink for Count {
        fn on_rising_edge(&self, _now_us: u64) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn test_simulated_wheel() {
        let count = Arc::new(Count::default());
        let (mut motor, mut plant) = sim_wheel(count.clone(), PlantParams::default());
        motor.set_direction(false, true).unwrap();
        motor.set_duty(100).unwrap();
        plant.advance(0);
        plant.advance(200_000);
        assert!(count.0.load(Ordering::Relaxed) > 0);
        assert_eq!(count.0.load(Ordering::Relaxed), plant.edges());
    }
}
