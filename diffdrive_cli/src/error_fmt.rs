//! Human-readable error descriptions and structured JSON error formatting.

use diffdrive_core::error::{BuildError, DriveError};

fn find<'a, T: std::error::Error + 'static>(err: &'a eyre::Report) -> Option<&'a T> {
    err.chain().find_map(|c| c.downcast_ref::<T>())
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = find::<BuildError>(err) {
        return match be {
            BuildError::MissingLeftMotor | BuildError::MissingRightMotor => format!(
                "What happened: {be}.\nLikely causes: The motor backend failed to initialize or was not wired into the builder.\nHow to fix: Check the [pins] m1_*/m2_* values and that both motors are created before build()."
            ),
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun `diffdrive self-check`."
            ),
        };
    }

    if let Some(de) = find::<DriveError>(err) {
        return match de {
            DriveError::Timeout => "What happened: A hardware write or read timed out.\nLikely causes: Motor driver or serial adapter not responding.\nHow to fix: Check wiring and power, then rerun with --log-level=debug.".to_string(),
            DriveError::Link(msg) => format!(
                "What happened: Serial command link failed ({msg}).\nLikely causes: Wrong port, baud mismatch, or the adapter was unplugged.\nHow to fix: Check link.port / link.baud or pass --port."
            ),
            DriveError::HardwareFault(msg) | DriveError::Hardware(msg) => format!(
                "What happened: Motor hardware error ({msg}).\nLikely causes: GPIO permissions or incorrect pin numbers.\nHow to fix: Fix the [pins] values; ensure the process may access /dev/gpiomem."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from init or config
    let msg = format!("{err:#}");
    let lower = msg.to_ascii_lowercase();

    if lower.contains("read config") {
        return format!(
            "What happened: Could not read the config file.\nLikely causes: Wrong --config path or missing permissions.\nHow to fix: Point --config at an existing TOML file. Original: {msg}"
        );
    }

    if lower.contains("parse config") || lower.contains("missing field") {
        return format!(
            "What happened: Configuration is invalid or incomplete.\nLikely causes: Missing [pins] (m1_pwm, m1_en1, m1_en2, m2_pwm, m2_en1, m2_en2, enc_a, enc_b) or a type error.\nHow to fix: Edit the TOML config and try again. Original: {msg}"
        );
    }

    if lower.contains("must be") || lower.contains("must satisfy") {
        return format!(
            "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun `diffdrive self-check`."
        );
    }

    if lower.contains("malformed frame") {
        return format!(
            "What happened: {msg}.\nLikely causes: Fewer than four comma-separated fields.\nHow to fix: Use the form <dir_L>,<rpm_L>,<dir_R>,<rpm_R># (e.g. 1,120,2,80#)."
        );
    }

    // Generic fallback
    format!(
        "Something went wrong.\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 3 = configuration, 4 = hardware / link, 1 = anything else.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if find::<BuildError>(err).is_some() || is_config_error(err) {
        return 3;
    }
    if find::<DriveError>(err).is_some() {
        return 4;
    }
    1
}

fn is_config_error(err: &eyre::Report) -> bool {
    let lower = format!("{err:#}").to_ascii_lowercase();
    lower.contains("config") || lower.contains("must be") || lower.contains("must satisfy")
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(be) = find::<BuildError>(err) {
        return match be {
            BuildError::MissingLeftMotor | BuildError::MissingRightMotor => "MissingMotor",
            BuildError::InvalidConfig(_) => "InvalidConfig",
        };
    }
    if let Some(de) = find::<DriveError>(err) {
        return match de {
            DriveError::Timeout => "Timeout",
            DriveError::Link(_) => "Link",
            DriveError::Hardware(_) | DriveError::HardwareFault(_) => "Hardware",
            DriveError::Io(_) => "Io",
        };
    }
    if is_config_error(err) {
        return "InvalidConfig";
    }
    "Error"
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": reason_name(err),
        "message": humanize(err),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_timeout_is_explained() {
        let err = eyre::Report::new(DriveError::Timeout).wrap_err("left set_duty");
        assert!(humanize(&err).contains("timed out"));
        assert_eq!(exit_code_for_error(&err), 4);
        assert!(format_error_json(&err).contains("\"reason\":\"Timeout\""));
    }

    #[test]
    fn validation_message_maps_to_config_exit_code() {
        let err = eyre::eyre!("control.loop_hz must be > 0");
        assert_eq!(exit_code_for_error(&err), 3);
        assert!(humanize(&err).contains("Invalid configuration"));
    }

    #[test]
    fn unknown_error_falls_back() {
        let err = eyre::eyre!("boom");
        assert_eq!(exit_code_for_error(&err), 1);
        assert!(humanize(&err).starts_with("Something went wrong"));
    }
}
