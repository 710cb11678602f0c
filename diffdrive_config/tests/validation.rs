use diffdrive_config::{load_path, load_toml};
use rstest::rstest;
use std::fs;
use tempfile::tempdir;

const PINS: &str = r#"
[pins]
m1_pwm = 12
m1_en1 = 5
m1_en2 = 6
m2_pwm = 13
m2_en1 = 20
m2_en2 = 21
enc_a = 17
enc_b = 27
"#;

fn with_pins(extra: &str) -> String {
    format!("{PINS}\n{extra}")
}

#[rstest]
#[case("[control]\nloop_hz = 0\n", "loop_hz must be > 0")]
#[case("[control]\nramp_rate_rpm_s = 0.0\n", "ramp_rate_rpm_s must be > 0")]
#[case("[control]\nkp = -1.0\n", "control.kp")]
#[case("[encoder]\npulses_per_rev = 0\n", "pulses_per_rev must be > 0")]
#[case("[filter]\na = 0.5\nb = 0.5\n", "a + 2b = 1")]
#[case("[filter]\na = 1.0\nb = 0.0\n", "filter.a")]
#[case("[limits]\nintegral_clamp = 0.0\n", "integral_clamp must be > 0")]
#[case("[limits]\noutput_clamp = 0\n", "output_clamp must be >= 1")]
#[case("[limits]\nmin_dt_s = 0.0\n", "min_dt_s must be > 0")]
#[case("[link]\ntimeout_ms = 0\n", "timeout_ms must be >= 1")]
#[case("[link]\nmax_frame_len = 0\n", "max_frame_len must be >= 1")]
#[case("[logging]\nrotation = \"weekly\"\n", "logging.rotation")]
fn rejects_invalid_values(#[case] section: &str, #[case] needle: &str) {
    let cfg = load_toml(&with_pins(section)).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject");
    let msg = format!("{err}");
    assert!(msg.contains(needle), "message {msg:?} lacks {needle:?}");
}

#[test]
fn accepts_full_config() {
    let toml = with_pins(
        r#"
[control]
kp = 2.0
ki = 1.7
kd = 0.1
ramp_rate_rpm_s = 30.0
loop_hz = 100

[encoder]
pulses_per_rev = 250

[filter]
a = 0.854
b = 0.0728

[limits]
loop_deadband_rpm = 100.0
integral_clamp = 100.0
output_clamp = 254
direction_reset_threshold_rpm = 50

[link]
port = "/dev/ttyUSB0"
baud = 9600
timeout_ms = 1000

[logging]
level = "debug"
rotation = "daily"
"#,
    );
    let cfg = load_toml(&toml).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert_eq!(cfg.control.loop_hz, 100);
    assert_eq!(cfg.link.port, "/dev/ttyUSB0");
}

#[test]
fn load_path_reads_and_validates() {
    let dir = tempdir().unwrap();
    let good = dir.path().join("good.toml");
    fs::write(&good, PINS).unwrap();
    let cfg = load_path(&good).expect("load");
    assert_eq!(cfg.pins.enc_b, 27);

    let bad = dir.path().join("bad.toml");
    fs::write(&bad, with_pins("[encoder]\npulses_per_rev = 0\n")).unwrap();
    let err = load_path(&bad).expect_err("invalid");
    assert!(format!("{err}").contains("pulses_per_rev"));

    let missing = dir.path().join("nope.toml");
    let err = load_path(&missing).expect_err("missing file");
    assert!(format!("{err}").contains("read config"));
}
