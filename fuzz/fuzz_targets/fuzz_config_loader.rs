#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // TOML parsing and validation must reject bad input without panicking.
    if let Ok(cfg) = toml::from_str::<diffdrive_config::Config>(data) {
        if cfg.validate().is_ok() {
            // Anything that validates must convert and build a controller.
            let params = diffdrive_core::DriveParams::from(&cfg);
            let built = diffdrive_core::DriveController::builder()
                .with_left_motor(diffdrive_core::mocks::RecordingMotor::new())
                .with_right_motor(diffdrive_core::mocks::RecordingMotor::new())
                .with_params(params)
                .build();
            assert!(built.is_ok(), "validated config rejected by builder");
        }
    }
});
