use diffdrive_core::error::{BuildError, DriveError};
use diffdrive_core::mocks::{FaultyMotor, RecordingMotor};
use diffdrive_core::{
    Direction, DriveCommand, DriveController, DriveParams, Limits, WheelCommand,
};

fn drive_error(err: &eyre::Report) -> Option<&DriveError> {
    err.chain().find_map(|c| c.downcast_ref::<DriveError>())
}

#[test]
fn motor_fault_surfaces_as_typed_error() {
    let mut ctl = DriveController::builder()
        .with_left_motor(FaultyMotor)
        .with_right_motor(FaultyMotor)
        .build()
        .unwrap();
    let cmd = DriveCommand::new(
        WheelCommand::new(Direction::Forward, 100),
        WheelCommand::STOP,
    );
    let err = ctl.control_at(20_000, cmd).unwrap_err();
    // "gpio write timeout" is classified as a timeout
    assert!(matches!(drive_error(&err), Some(DriveError::Timeout)));
    assert!(format!("{err:#}").contains("left set_direction"));
}

#[test]
fn stop_reports_hardware_error() {
    let mut ctl = DriveController::builder()
        .with_left_motor(FaultyMotor)
        .with_right_motor(FaultyMotor)
        .build()
        .unwrap();
    let err = ctl.stop_all().unwrap_err();
    assert!(drive_error(&err).is_some());
}

#[test]
fn builder_requires_both_motors() {
    let err = DriveController::<RecordingMotor>::builder()
        .with_left_motor(RecordingMotor::new())
        .build()
        .unwrap_err();
    assert!(matches!(err, BuildError::MissingRightMotor));

    let err = DriveController::<RecordingMotor>::builder()
        .with_right_motor(RecordingMotor::new())
        .build()
        .unwrap_err();
    assert!(matches!(err, BuildError::MissingLeftMotor));
}

#[test]
fn builder_rejects_bad_params() {
    let params = DriveParams {
        limits: Limits {
            min_dt_s: 0.0,
            ..Limits::default()
        },
        ..DriveParams::default()
    };
    let err = DriveController::builder()
        .with_left_motor(RecordingMotor::new())
        .with_right_motor(RecordingMotor::new())
        .with_params(params)
        .build()
        .unwrap_err();
    assert!(matches!(err, BuildError::InvalidConfig(_)));
    assert!(err.to_string().contains("min_dt_s"));
}

#[test]
fn config_converts_into_params() {
    let cfg: diffdrive_config::Config = toml_cfg();
    let p = DriveParams::from(&cfg);
    assert_eq!(p.gains.kp, 3.0);
    assert_eq!(p.pulses_per_rev, 500);
    assert_eq!(p.limits.output_clamp, 200);
}

fn toml_cfg() -> diffdrive_config::Config {
    diffdrive_config::load_toml(
        r#"
[pins]
m1_pwm = 12
m1_en1 = 5
m1_en2 = 6
m2_pwm = 13
m2_en1 = 20
m2_en2 = 21
enc_a = 17
enc_b = 27

[control]
kp = 3.0

[encoder]
pulses_per_rev = 500

[limits]
output_clamp = 200
"#,
    )
    .unwrap()
}
